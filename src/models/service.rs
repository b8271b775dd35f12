use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Extra charge on a folio, optionally tied to a reservation.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Service {
    pub id: i64,
    pub folio_id: i64,
    pub reservation_id: Option<i64>,
    pub name: String,
    pub price_unit: f64,
    pub quantity: i64,
    pub per_day: bool,
    pub per_person: bool,
    pub discount: f64,
    pub is_board_service: bool,
    pub price_total: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct ServiceLine {
    pub id: i64,
    pub service_id: i64,
    pub date: NaiveDate,
    pub day_qty: i64,
    pub price_unit: f64,
    pub discount: f64,
    pub price_total: f64,
    pub invoiced: bool,
}

#[derive(Debug, Serialize)]
pub struct ServiceDetail {
    #[serde(flatten)]
    pub service: Service,
    pub lines: Vec<ServiceLine>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateService {
    pub reservation_id: Option<i64>,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub price_unit: f64,
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub per_day: bool,
    #[serde(default)]
    pub per_person: bool,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub discount: f64,
}

fn default_quantity() -> i64 {
    1
}

/// Units charged per day for a service line.
pub fn day_quantity(quantity: i64, per_person: bool, adults: i64) -> i64 {
    if per_person {
        quantity * adults.max(1)
    } else {
        quantity
    }
}
