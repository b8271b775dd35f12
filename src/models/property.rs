use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompany {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
}

/// A hotel. Every room, room type and board service belongs to exactly one.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Property {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub code: String,
    /// Percentage applied on top of tax-excluded folio amounts.
    pub tax_rate: f64,
    pub default_pricelist_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProperty {
    pub company_id: i64,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 16))]
    pub code: String,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub tax_rate: f64,
    pub default_pricelist_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PropertySearch {
    pub company_id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DefaultPricelist {
    pub pricelist_id: i64,
}

/// Query filter shared by listings scoped to one property.
#[derive(Debug, Deserialize)]
pub struct PropertyFilter {
    pub property_id: Option<i64>,
}
