use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::PmsError;

use super::availability::AvailabilityRule;
use super::reservation::ReservationState;

/// Longest window the calendar serves in one request, in nights.
pub const MAX_CALENDAR_NIGHTS: i64 = 366;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub pricelist_id: Option<i64>,
}

/// One occupied night as read from the calendar join.
#[derive(Debug, Clone, FromRow)]
pub struct OccupiedNight {
    pub room_id: i64,
    pub date: NaiveDate,
    pub reservation_id: i64,
    pub reservation_name: String,
    pub folio_name: String,
    pub partner_name: Option<String>,
    pub state: ReservationState,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CalendarReservation {
    pub reservation_id: i64,
    pub name: String,
    pub folio_name: String,
    pub partner_name: Option<String>,
    pub state: ReservationState,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub nights: Vec<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct CalendarRoom {
    pub room_id: i64,
    pub name: String,
    pub capacity: i64,
    pub reservations: Vec<CalendarReservation>,
}

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub price: f64,
    pub free_rooms: i64,
    pub rule: Option<AvailabilityRule>,
}

#[derive(Debug, Serialize)]
pub struct CalendarRoomType {
    pub room_type_id: i64,
    pub name: String,
    pub code: String,
    pub rooms: Vec<CalendarRoom>,
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Serialize)]
pub struct Calendar {
    pub property_id: i64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub pricelist_id: Option<i64>,
    pub room_types: Vec<CalendarRoomType>,
}

pub fn validate_window(date_from: NaiveDate, date_to: NaiveDate) -> Result<(), PmsError> {
    if date_to <= date_from {
        return Err(PmsError::Validation(
            "date_to must be after date_from".to_string(),
        ));
    }
    if (date_to - date_from).num_days() > MAX_CALENDAR_NIGHTS {
        return Err(PmsError::Validation(format!(
            "Calendar window is limited to {} nights",
            MAX_CALENDAR_NIGHTS
        )));
    }
    Ok(())
}

/// Folds the occupied nights of one room into its reservations, keeping the
/// order in which they first appear.
pub fn group_room_nights(nights: &[OccupiedNight]) -> Vec<CalendarReservation> {
    let mut reservations: Vec<CalendarReservation> = Vec::new();
    for night in nights {
        match reservations
            .iter_mut()
            .find(|r| r.reservation_id == night.reservation_id)
        {
            Some(reservation) => reservation.nights.push(night.date),
            None => reservations.push(CalendarReservation {
                reservation_id: night.reservation_id,
                name: night.reservation_name.clone(),
                folio_name: night.folio_name.clone(),
                partner_name: night.partner_name.clone(),
                state: night.state,
                checkin: night.checkin,
                checkout: night.checkout,
                nights: vec![night.date],
            }),
        }
    }
    reservations
}
