use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::PmsError;
use crate::models::cancelation_rule::CreateCancelationRule;
use crate::models::pricelist::{CreatePricelist, CreatePricelistItem, PriceQuery};
use crate::models::property::PropertyFilter;
use crate::models::reservation::validate_stay;
use crate::services::pricing;

pub async fn create_cancelation_rule(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateCancelationRule>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let rule = pricing::create_cancelation_rule(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(rule))
}

pub async fn list_cancelation_rules(
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let rules = pricing::list_cancelation_rules(&mut *conn).await?;
    Ok(HttpResponse::Ok().json(rules))
}

pub async fn create_pricelist(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreatePricelist>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let pricelist = pricing::create_pricelist(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(pricelist))
}

pub async fn list_pricelists(
    pool: web::Data<SqlitePool>,
    query: web::Query<PropertyFilter>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let pricelists = pricing::list_pricelists(&mut *conn, query.property_id).await?;
    Ok(HttpResponse::Ok().json(pricelists))
}

pub async fn add_item(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<CreatePricelistItem>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let item = pricing::add_pricelist_item(&mut *tx, path.into_inner(), &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(item))
}

pub async fn list_items(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let pricelist = pricing::get_pricelist(&mut *conn, path.into_inner()).await?;
    let items = pricing::list_items(&mut *conn, pricelist.id).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn nightly_prices(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    query: web::Query<PriceQuery>,
) -> Result<HttpResponse, PmsError> {
    validate_stay(query.date_from, query.date_to)?;
    let mut conn = pool.acquire().await?;
    let pricelist = pricing::get_pricelist(&mut *conn, path.into_inner()).await?;
    pricing::ensure_pricelist_applies(&pricelist, query.property_id)?;
    let prices = pricing::nightly_prices(
        &mut *conn,
        Some(pricelist.id),
        query.room_type_id,
        query.property_id,
        query.date_from,
        query.date_to,
    )
    .await?;
    Ok(HttpResponse::Ok().json(prices))
}
