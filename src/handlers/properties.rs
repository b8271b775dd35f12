use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::PmsError;
use crate::models::availability::AvailabilitySearch;
use crate::models::calendar::CalendarQuery;
use crate::models::property::{CreateCompany, CreateProperty, DefaultPricelist, PropertySearch};
use crate::services::{availability, calendar, property};

pub async fn create_company(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateCompany>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let company = property::create_company(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(company))
}

pub async fn list_companies(pool: web::Data<SqlitePool>) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let companies = property::list_companies(&mut *conn).await?;
    Ok(HttpResponse::Ok().json(companies))
}

pub async fn create_property(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateProperty>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let created = property::create_property(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn list_properties(
    pool: web::Data<SqlitePool>,
    query: web::Query<PropertySearch>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let properties = property::list_properties(&mut *conn, &query).await?;
    Ok(HttpResponse::Ok().json(properties))
}

pub async fn get_property(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let found = property::get_property(&mut *conn, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(found))
}

pub async fn set_default_pricelist(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<DefaultPricelist>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    let updated =
        property::set_default_pricelist(&mut *tx, path.into_inner(), body.pricelist_id).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn search_availability(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    query: web::Query<AvailabilitySearch>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let result = availability::search_availability(&mut *conn, path.into_inner(), &query).await?;
    Ok(HttpResponse::Ok().json(result))
}

pub async fn property_calendar(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    query: web::Query<CalendarQuery>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let result = calendar::property_calendar(&mut *conn, path.into_inner(), &query).await?;
    Ok(HttpResponse::Ok().json(result))
}
