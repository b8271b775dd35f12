use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub name: String,
    pub folio_id: i64,
    pub partner_name: Option<String>,
    pub date: NaiveDate,
    pub amount_untaxed: f64,
    pub amount_tax: f64,
    pub amount_total: f64,
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct InvoiceLine {
    pub id: i64,
    pub invoice_id: i64,
    pub description: String,
    pub quantity: f64,
    pub price_unit: f64,
    pub discount: f64,
    pub price_subtotal: f64,
    pub reservation_id: Option<i64>,
    pub service_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub lines: Vec<InvoiceLine>,
}

/// Invoice line before it is stored. Room nights sharing reservation, price
/// and discounts collapse into one line.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftInvoiceLine {
    pub description: String,
    pub quantity: f64,
    pub price_unit: f64,
    pub discount: f64,
    pub price_subtotal: f64,
    pub reservation_id: Option<i64>,
    pub service_id: Option<i64>,
}

/// Effective discount of a line charged with both a commercial discount and a
/// cancellation discount.
pub fn combined_discount(discount: f64, cancel_discount: f64) -> f64 {
    100.0 - (100.0 - discount) * (100.0 - cancel_discount) / 100.0
}
