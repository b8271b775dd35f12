use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CheckinState {
    Draft,
    Precheckin,
    Onboard,
    Done,
}

/// A guest registered for a reservation.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct CheckinPartner {
    pub id: i64,
    pub reservation_id: i64,
    pub folio_id: i64,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub state: CheckinState,
    pub arrival: Option<NaiveDateTime>,
    pub departure: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Validate, Default)]
pub struct GuestData {
    #[validate(length(min = 1, max = 64))]
    pub firstname: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub lastname: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub document_type: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub document_number: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub mobile: Option<String>,
}

impl CheckinPartner {
    pub fn merge(&mut self, data: GuestData) {
        if data.firstname.is_some() {
            self.firstname = data.firstname;
        }
        if data.lastname.is_some() {
            self.lastname = data.lastname;
        }
        if data.document_type.is_some() {
            self.document_type = data.document_type;
        }
        if data.document_number.is_some() {
            self.document_number = data.document_number;
        }
        if data.email.is_some() {
            self.email = data.email;
        }
        if data.mobile.is_some() {
            self.mobile = data.mobile;
        }
    }

    /// `draft`/`precheckin` follow data completeness; later states stick.
    pub fn derived_state(&self) -> CheckinState {
        match self.state {
            CheckinState::Onboard | CheckinState::Done => self.state,
            _ if data_complete(self) => CheckinState::Precheckin,
            _ => CheckinState::Draft,
        }
    }
}

fn data_complete(partner: &CheckinPartner) -> bool {
    [&partner.firstname, &partner.lastname, &partner.document_number]
        .iter()
        .all(|field| field.as_deref().map_or(false, |v| !v.trim().is_empty()))
}
