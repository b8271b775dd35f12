use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::PmsError;
use crate::models::sale_channel::{CreateAgency, CreateSaleChannel};
use crate::services::property;

pub async fn create_sale_channel(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateSaleChannel>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let channel = property::create_sale_channel(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(channel))
}

pub async fn list_sale_channels(pool: web::Data<SqlitePool>) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let channels = property::list_sale_channels(&mut *conn).await?;
    Ok(HttpResponse::Ok().json(channels))
}

pub async fn create_agency(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateAgency>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let agency = property::create_agency(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(agency))
}

pub async fn list_agencies(pool: web::Data<SqlitePool>) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let agencies = property::list_agencies(&mut *conn).await?;
    Ok(HttpResponse::Ok().json(agencies))
}
