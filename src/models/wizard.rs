use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::availability::RuleValues;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MassiveChangeTarget {
    Pricelist,
    AvailabilityPlan,
}

fn validate_weekdays(weekdays: &[u32]) -> Result<(), ValidationError> {
    if weekdays.iter().any(|day| *day > 6) {
        return Err(ValidationError::new("weekday_out_of_range"));
    }
    Ok(())
}

/// Batch edit of prices or availability rules over a date window.
/// `date_to` is inclusive. Weekdays run from Monday (0) to Sunday (6).
#[derive(Debug, Deserialize, Validate)]
pub struct MassiveChanges {
    pub target: MassiveChangeTarget,
    pub property_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(default)]
    #[validate(custom = "validate_weekdays")]
    pub weekdays: Vec<u32>,
    #[serde(default)]
    pub room_type_ids: Vec<i64>,
    pub pricelist_id: Option<i64>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub availability_plan_id: Option<i64>,
    #[serde(default)]
    #[validate]
    pub rules: RuleValues,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct MassiveChangesResult {
    pub created: i64,
    pub updated: i64,
}

/// Dates of `[date_from, date_to]` falling on one of `weekdays`. An empty
/// filter keeps every date.
pub fn selected_dates(date_from: NaiveDate, date_to: NaiveDate, weekdays: &[u32]) -> Vec<NaiveDate> {
    date_from
        .iter_days()
        .take_while(|d| *d <= date_to)
        .filter(|d| weekdays.is_empty() || weekdays.contains(&d.weekday().num_days_from_monday()))
        .collect()
}
