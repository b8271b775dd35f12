use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Direct,
    Indirect,
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct SaleChannel {
    pub id: i64,
    pub name: String,
    pub channel_type: ChannelType,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleChannel {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub channel_type: ChannelType,
}

/// Travel agency selling on commission.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Agency {
    pub id: i64,
    pub name: String,
    pub commission: f64,
    pub sale_channel_id: Option<i64>,
    pub invoice_to_agency: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAgency {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub commission: f64,
    pub sale_channel_id: Option<i64>,
    #[serde(default)]
    pub invoice_to_agency: bool,
}
