use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Bank,
    Card,
}

/// Money received on a folio. Negative amounts are refunds.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Payment {
    pub id: i64,
    pub folio_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePayment {
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub method: PaymentMethod,
    #[validate(length(max = 64))]
    pub reference: Option<String>,
}
