use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::invoice::Invoice;
use super::payment::Payment;
use super::reservation::{ReservationDetail, ReservationInput, ReservationState, ReservationType};
use super::service::ServiceDetail;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FolioState {
    Draft,
    Confirm,
    Done,
    Cancel,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    NothingToPay,
    NotPaid,
    Partial,
    Paid,
    Overpayment,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    No,
    ToInvoice,
    Invoiced,
}

/// The guest's running bill.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Folio {
    pub id: i64,
    pub name: String,
    pub property_id: i64,
    pub partner_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub pricelist_id: Option<i64>,
    pub agency_id: Option<i64>,
    pub sale_channel_id: Option<i64>,
    pub reservation_type: ReservationType,
    pub state: FolioState,
    pub amount_untaxed: f64,
    pub amount_tax: f64,
    pub amount_total: f64,
    pub amount_paid: f64,
    pub pending_amount: f64,
    pub payment_state: PaymentState,
    pub invoice_status: InvoiceStatus,
    pub commission: f64,
    pub internal_comment: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct FolioDetail {
    #[serde(flatten)]
    pub folio: Folio,
    pub reservations: Vec<ReservationDetail>,
    pub services: Vec<ServiceDetail>,
    pub payments: Vec<Payment>,
    pub invoices: Vec<Invoice>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolio {
    pub property_id: i64,
    #[validate(length(min = 1, max = 128))]
    pub partner_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub pricelist_id: Option<i64>,
    pub agency_id: Option<i64>,
    pub sale_channel_id: Option<i64>,
    #[serde(default)]
    pub reservation_type: ReservationType,
    pub internal_comment: Option<String>,
    #[validate]
    #[serde(default)]
    pub reservations: Vec<ReservationInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFolio {
    #[validate(length(min = 1, max = 128))]
    pub partner_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub internal_comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FolioSearch {
    pub property_id: Option<i64>,
    pub state: Option<FolioState>,
    pub partner_name: Option<String>,
}

pub fn payment_state(total: f64, paid: f64) -> PaymentState {
    const EPSILON: f64 = 0.005;
    if total.abs() < EPSILON && paid.abs() < EPSILON {
        PaymentState::NothingToPay
    } else if paid.abs() < EPSILON {
        PaymentState::NotPaid
    } else if paid > total + EPSILON {
        PaymentState::Overpayment
    } else if (total - paid).abs() < EPSILON {
        PaymentState::Paid
    } else {
        PaymentState::Partial
    }
}

/// Folio state as a function of its reservations' states.
pub fn derive_state(states: &[ReservationState]) -> FolioState {
    if states.is_empty() {
        return FolioState::Draft;
    }
    if states.iter().all(|s| *s == ReservationState::Cancel) {
        return FolioState::Cancel;
    }
    if states
        .iter()
        .all(|s| matches!(s, ReservationState::Done | ReservationState::Cancel))
    {
        return FolioState::Done;
    }
    if states
        .iter()
        .any(|s| matches!(s, ReservationState::Confirm | ReservationState::Onboard | ReservationState::Done))
    {
        return FolioState::Confirm;
    }
    FolioState::Draft
}

pub fn invoice_status(state: FolioState, pending_lines: i64, invoiced_lines: i64) -> InvoiceStatus {
    match state {
        FolioState::Confirm | FolioState::Done | FolioState::Cancel if pending_lines > 0 => {
            InvoiceStatus::ToInvoice
        }
        _ if invoiced_lines > 0 && pending_lines == 0 => InvoiceStatus::Invoiced,
        _ => InvoiceStatus::No,
    }
}
