use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::db::round2;
use crate::error::PmsError;

use super::cancelation_rule::CancelReason;
use super::checkin_partner::CheckinPartner;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    Draft,
    Confirm,
    Onboard,
    Done,
    Cancel,
}

impl ReservationState {
    /// Whether lines in this state keep their room occupied.
    pub fn occupies_room(self) -> bool {
        self != ReservationState::Cancel
    }

    pub fn is_closed(self) -> bool {
        matches!(self, ReservationState::Done | ReservationState::Cancel)
    }
}

/// `staff` and `out` (out of service) stays are never charged.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationType {
    #[default]
    Normal,
    Staff,
    Out,
}

impl ReservationType {
    pub fn is_free(self) -> bool {
        self != ReservationType::Normal
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Reservation {
    pub id: i64,
    pub name: String,
    pub folio_id: i64,
    pub property_id: i64,
    pub room_type_id: i64,
    pub preferred_room_id: Option<i64>,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub adults: i64,
    pub children: i64,
    pub board_service_room_type_id: Option<i64>,
    pub pricelist_id: Option<i64>,
    pub agency_id: Option<i64>,
    pub sale_channel_id: Option<i64>,
    pub reservation_type: ReservationType,
    pub overbooking: bool,
    pub state: ReservationState,
    pub cancelled_reason: Option<CancelReason>,
    pub nights: i64,
    pub price_subtotal: f64,
    pub price_services: f64,
    pub price_total: f64,
    pub commission_percent: f64,
    pub commission_amount: f64,
    pub created_at: NaiveDateTime,
}

/// Price of one night of a reservation.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct ReservationLine {
    pub id: i64,
    pub reservation_id: i64,
    pub date: NaiveDate,
    pub room_id: Option<i64>,
    pub price: f64,
    pub discount: f64,
    pub cancel_discount: f64,
    pub price_total: f64,
    pub invoiced: bool,
}

#[derive(Debug, Serialize)]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub lines: Vec<ReservationLine>,
    pub checkin_partners: Vec<CheckinPartner>,
}

/// Stay data shared by standalone reservation creation and reservations
/// created inline with their folio.
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct ReservationInput {
    pub room_type_id: i64,
    pub preferred_room_id: Option<i64>,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    #[validate(range(min = 0, max = 50))]
    #[serde(default = "default_adults")]
    pub adults: i64,
    #[validate(range(min = 0, max = 50))]
    #[serde(default)]
    pub children: i64,
    pub board_service_room_type_id: Option<i64>,
    pub pricelist_id: Option<i64>,
    pub agency_id: Option<i64>,
    pub sale_channel_id: Option<i64>,
    #[serde(default)]
    pub overbooking: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservation {
    pub folio_id: i64,
    #[validate]
    #[serde(flatten)]
    pub stay: ReservationInput,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateReservation {
    pub checkin: Option<NaiveDate>,
    pub checkout: Option<NaiveDate>,
    pub room_type_id: Option<i64>,
    pub preferred_room_id: Option<i64>,
    #[validate(range(min = 0, max = 50))]
    pub adults: Option<i64>,
    #[validate(range(min = 0, max = 50))]
    pub children: Option<i64>,
    pub board_service_room_type_id: Option<i64>,
    #[serde(default)]
    pub remove_board_service: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReservationLine {
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount: Option<f64>,
}

fn default_adults() -> i64 {
    1
}

pub fn validate_stay(checkin: NaiveDate, checkout: NaiveDate) -> Result<(), PmsError> {
    if checkout <= checkin {
        return Err(PmsError::Validation(
            "Checkout must be after checkin".to_string(),
        ));
    }
    Ok(())
}

/// Every night of `[checkin, checkout)`.
pub fn stay_dates(checkin: NaiveDate, checkout: NaiveDate) -> Vec<NaiveDate> {
    checkin.iter_days().take_while(|d| *d < checkout).collect()
}

pub fn line_total(price: f64, discount: f64, cancel_discount: f64) -> f64 {
    round2(price * (1.0 - discount / 100.0) * (1.0 - cancel_discount / 100.0))
}

pub fn commission_amount(price_total: f64, percent: f64) -> f64 {
    round2(price_total * percent / 100.0)
}
