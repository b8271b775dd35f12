use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::db::round2;

/// Meal plan sold per night (breakfast, half board, ...).
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct BoardService {
    pub id: i64,
    pub property_id: i64,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct BoardServiceLine {
    pub id: i64,
    pub board_service_id: i64,
    pub name: String,
    pub amount: f64,
    pub per_person: bool,
}

/// A board service offered on a specific room type.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct BoardServiceRoomType {
    pub id: i64,
    pub board_service_id: i64,
    pub room_type_id: i64,
    pub amount_override: Option<f64>,
    pub by_default: bool,
}

#[derive(Debug, Serialize)]
pub struct BoardServiceDetail {
    #[serde(flatten)]
    pub board_service: BoardService,
    pub amount: f64,
    pub lines: Vec<BoardServiceLine>,
    pub room_types: Vec<BoardServiceRoomType>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardServiceLine {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub amount: f64,
    #[serde(default = "default_per_person")]
    pub per_person: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardService {
    pub property_id: i64,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 16))]
    pub code: String,
    #[validate]
    #[serde(default)]
    pub lines: Vec<CreateBoardServiceLine>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachBoardService {
    pub room_type_id: i64,
    #[validate(range(min = 0.0))]
    pub amount_override: Option<f64>,
    #[serde(default)]
    pub by_default: bool,
}

fn default_per_person() -> bool {
    true
}

pub fn board_service_amount(lines: &[BoardServiceLine]) -> f64 {
    round2(lines.iter().map(|l| l.amount).sum())
}

/// Price of one night of board for `adults` guests.
pub fn nightly_board_price(
    lines: &[BoardServiceLine],
    adults: i64,
    amount_override: Option<f64>,
) -> f64 {
    if let Some(amount) = amount_override {
        return round2(amount);
    }
    round2(
        lines
            .iter()
            .map(|l| {
                if l.per_person {
                    l.amount * adults as f64
                } else {
                    l.amount
                }
            })
            .sum(),
    )
}
