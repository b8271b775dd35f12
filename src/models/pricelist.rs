use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Daily rate plan. A pricelist without a property applies to every property.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Pricelist {
    pub id: i64,
    pub name: String,
    pub property_id: Option<i64>,
    pub cancelation_rule_id: Option<i64>,
    pub availability_plan_id: Option<i64>,
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePricelist {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub property_id: Option<i64>,
    pub cancelation_rule_id: Option<i64>,
    pub availability_plan_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct PricelistItem {
    pub id: i64,
    pub pricelist_id: i64,
    pub room_type_id: i64,
    pub property_id: Option<i64>,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub fixed_price: f64,
}

impl PricelistItem {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.date_start <= date && date <= self.date_end
    }

    fn span_days(&self) -> i64 {
        (self.date_end - self.date_start).num_days()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePricelistItem {
    pub room_type_id: i64,
    pub property_id: Option<i64>,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    #[validate(range(min = 0.0))]
    pub fixed_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub room_type_id: i64,
    pub property_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DailyPrice {
    pub date: NaiveDate,
    pub price: f64,
}

/// Picks the item that prices `date` for `property_id`: property-specific
/// items first, then the narrowest date range, then the newest item.
pub fn select_item(
    items: &[PricelistItem],
    property_id: i64,
    date: NaiveDate,
) -> Option<&PricelistItem> {
    items
        .iter()
        .filter(|item| item.covers(date))
        .filter(|item| item.property_id.map_or(true, |p| p == property_id))
        .min_by(|a, b| {
            let a_key = (a.property_id.is_none(), a.span_days(), -a.id);
            let b_key = (b.property_id.is_none(), b.span_days(), -b.id);
            a_key.cmp(&b_key)
        })
}
