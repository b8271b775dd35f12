use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplyOn {
    First,
    All,
    Days,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Intime,
    Late,
    Noshow,
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct CancelationRule {
    pub id: i64,
    pub name: String,
    /// Cancelling more than this many days before checkin is free.
    pub days_intime: i64,
    pub penalty_late: f64,
    pub apply_on_late: ApplyOn,
    pub days_late: i64,
    pub penalty_noshow: f64,
    pub apply_on_noshow: ApplyOn,
    pub days_noshow: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCancelationRule {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(range(min = 0, max = 365))]
    #[serde(default)]
    pub days_intime: i64,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub penalty_late: f64,
    pub apply_on_late: ApplyOn,
    #[validate(range(min = 0, max = 365))]
    #[serde(default)]
    pub days_late: i64,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub penalty_noshow: f64,
    pub apply_on_noshow: ApplyOn,
    #[validate(range(min = 0, max = 365))]
    #[serde(default)]
    pub days_noshow: i64,
}

impl CancelationRule {
    pub fn classify(&self, checkin: NaiveDate, today: NaiveDate) -> CancelReason {
        if today >= checkin {
            CancelReason::Noshow
        } else if (checkin - today).num_days() > self.days_intime {
            CancelReason::Intime
        } else {
            CancelReason::Late
        }
    }

    /// `cancel_discount` for each of `nights` lines once the reservation is
    /// cancelled on `today`. Penalised nights keep `100 - penalty`, the rest
    /// become free.
    pub fn cancel_discounts(
        &self,
        checkin: NaiveDate,
        nights: usize,
        today: NaiveDate,
    ) -> (CancelReason, Vec<f64>) {
        let reason = self.classify(checkin, today);
        let (penalty, apply_on, days) = match reason {
            CancelReason::Intime => return (reason, vec![100.0; nights]),
            CancelReason::Late => (self.penalty_late, self.apply_on_late, self.days_late),
            CancelReason::Noshow => (self.penalty_noshow, self.apply_on_noshow, self.days_noshow),
        };
        let penalised = match apply_on {
            ApplyOn::First => 1,
            ApplyOn::All => nights,
            ApplyOn::Days => days.max(0) as usize,
        }
        .min(nights);

        let discounts = (0..nights)
            .map(|i| if i < penalised { 100.0 - penalty } else { 100.0 })
            .collect();
        (reason, discounts)
    }
}

/// Without a rule, cancellations carry no penalty at all.
pub fn free_cancellation(nights: usize) -> Vec<f64> {
    vec![100.0; nights]
}
