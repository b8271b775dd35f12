use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct AvailabilityPlan {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAvailabilityPlan {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
}

/// Sales restriction of one room type on one date. `quota` and `max_avail`
/// of `-1` mean unlimited; stay lengths of `0` mean unrestricted.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow, PartialEq)]
pub struct AvailabilityRule {
    pub id: i64,
    pub plan_id: i64,
    pub room_type_id: i64,
    pub property_id: i64,
    pub date: NaiveDate,
    pub min_stay: i64,
    pub min_stay_arrival: i64,
    pub max_stay: i64,
    pub max_stay_arrival: i64,
    pub closed: bool,
    pub closed_arrival: bool,
    pub closed_departure: bool,
    pub quota: i64,
    pub max_avail: i64,
}

/// Partial rule values. Unset fields keep the stored value, or the default
/// when the rule is new.
#[derive(Debug, Deserialize, Validate, Default, Clone)]
pub struct RuleValues {
    #[validate(range(min = 0))]
    pub min_stay: Option<i64>,
    #[validate(range(min = 0))]
    pub min_stay_arrival: Option<i64>,
    #[validate(range(min = 0))]
    pub max_stay: Option<i64>,
    #[validate(range(min = 0))]
    pub max_stay_arrival: Option<i64>,
    pub closed: Option<bool>,
    pub closed_arrival: Option<bool>,
    pub closed_departure: Option<bool>,
    #[validate(range(min = -1))]
    pub quota: Option<i64>,
    #[validate(range(min = -1))]
    pub max_avail: Option<i64>,
}

impl RuleValues {
    pub fn is_empty(&self) -> bool {
        self.min_stay.is_none()
            && self.min_stay_arrival.is_none()
            && self.max_stay.is_none()
            && self.max_stay_arrival.is_none()
            && self.closed.is_none()
            && self.closed_arrival.is_none()
            && self.closed_departure.is_none()
            && self.quota.is_none()
            && self.max_avail.is_none()
    }

    pub fn apply_to(&self, rule: &mut AvailabilityRule) {
        if let Some(v) = self.min_stay {
            rule.min_stay = v;
        }
        if let Some(v) = self.min_stay_arrival {
            rule.min_stay_arrival = v;
        }
        if let Some(v) = self.max_stay {
            rule.max_stay = v;
        }
        if let Some(v) = self.max_stay_arrival {
            rule.max_stay_arrival = v;
        }
        if let Some(v) = self.closed {
            rule.closed = v;
        }
        if let Some(v) = self.closed_arrival {
            rule.closed_arrival = v;
        }
        if let Some(v) = self.closed_departure {
            rule.closed_departure = v;
        }
        if let Some(v) = self.quota {
            rule.quota = v;
        }
        if let Some(v) = self.max_avail {
            rule.max_avail = v;
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertRule {
    pub room_type_id: i64,
    pub property_id: i64,
    pub date: NaiveDate,
    #[validate]
    #[serde(flatten)]
    pub values: RuleValues,
}

#[derive(Debug, Deserialize)]
pub struct RuleQuery {
    pub room_type_id: Option<i64>,
    pub property_id: Option<i64>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilitySearch {
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub pricelist_id: Option<i64>,
    pub room_type_id: Option<i64>,
    pub adults: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RoomTypeAvailability {
    pub room_type_id: i64,
    pub name: String,
    pub code: String,
    pub capacity: i64,
    pub free_rooms: i64,
    pub available: i64,
    pub free_room_ids: Vec<i64>,
    pub nightly_prices: Vec<super::pricelist::DailyPrice>,
    pub total_price: f64,
}

/// Whether the stay `[checkin, checkout)` may be sold under `rules`
/// (keyed by date, for one room type).
pub fn stay_allowed(
    rules: &HashMap<NaiveDate, AvailabilityRule>,
    checkin: NaiveDate,
    checkout: NaiveDate,
) -> bool {
    let nights = (checkout - checkin).num_days();

    if let Some(arrival) = rules.get(&checkin) {
        if arrival.closed_arrival
            || arrival.min_stay_arrival > nights
            || (arrival.max_stay_arrival > 0 && arrival.max_stay_arrival < nights)
        {
            return false;
        }
    }
    if let Some(departure) = rules.get(&checkout) {
        if departure.closed_departure {
            return false;
        }
    }

    checkin
        .iter_days()
        .take_while(|d| *d < checkout)
        .filter_map(|d| rules.get(&d))
        .all(|rule| {
            !rule.closed && rule.min_stay <= nights && !(rule.max_stay > 0 && rule.max_stay < nights)
        })
}

/// Rooms that may still be sold on one night: real free rooms capped by
/// `max_avail`, and by the quota left once `sold` reservations consumed it.
pub fn night_capacity(free_rooms: i64, rule: Option<&AvailabilityRule>, sold: i64) -> i64 {
    let Some(rule) = rule else {
        return free_rooms;
    };
    let mut capacity = free_rooms;
    if rule.max_avail >= 0 {
        capacity = capacity.min(rule.max_avail);
    }
    if rule.quota >= 0 {
        capacity = capacity.min((rule.quota - sold).max(0));
    }
    capacity.max(0)
}
