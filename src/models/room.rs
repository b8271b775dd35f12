use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct RoomType {
    pub id: i64,
    pub property_id: i64,
    pub name: String,
    pub code: String,
    /// Nightly price used when no pricelist item applies.
    pub list_price: f64,
    pub sequence: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomType {
    pub property_id: i64,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 16))]
    pub code: String,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub list_price: f64,
    #[serde(default = "default_sequence")]
    pub sequence: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Room {
    pub id: i64,
    pub property_id: i64,
    pub room_type_id: i64,
    pub name: String,
    pub capacity: i64,
    pub extra_beds: i64,
    pub sequence: i64,
    pub active: bool,
}

impl Room {
    pub fn max_guests(&self) -> i64 {
        self.capacity + self.extra_beds
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoom {
    pub room_type_id: i64,
    #[validate(length(min = 1, max = 32))]
    pub name: String,
    #[validate(range(min = 1, max = 50))]
    pub capacity: i64,
    #[validate(range(min = 0, max = 10))]
    #[serde(default)]
    pub extra_beds: i64,
    #[serde(default = "default_sequence")]
    pub sequence: i64,
}

#[derive(Debug, Deserialize)]
pub struct RoomSearch {
    pub property_id: Option<i64>,
    pub room_type_id: Option<i64>,
    #[serde(default)]
    pub include_inactive: bool,
}

fn default_sequence() -> i64 {
    10
}
