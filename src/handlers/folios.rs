use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::PmsError;
use crate::models::folio::{CreateFolio, FolioSearch, UpdateFolio};
use crate::models::payment::CreatePayment;
use crate::models::service::CreateService;
use crate::services::{folio, invoice, payment, service};

use super::today;

pub async fn create_folio(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateFolio>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let created = folio::create_folio(&mut *tx, &body, today()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn list_folios(
    pool: web::Data<SqlitePool>,
    query: web::Query<FolioSearch>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let folios = folio::list_folios(&mut *conn, &query).await?;
    Ok(HttpResponse::Ok().json(folios))
}

pub async fn get_folio(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let detail = folio::get_folio_detail(&mut *conn, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn update_folio(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateFolio>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let updated = folio::update_folio(&mut *tx, path.into_inner(), &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn confirm_folio(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    let confirmed = folio::confirm_folio(&mut *tx, path.into_inner()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(confirmed))
}

pub async fn cancel_folio(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    let cancelled = folio::cancel_folio(&mut *tx, path.into_inner(), today()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(cancelled))
}

pub async fn register_payment(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<CreatePayment>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let registered = payment::register_payment(&mut *tx, path.into_inner(), &body, today()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(registered))
}

pub async fn list_payments(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let found = folio::get_folio(&mut *conn, path.into_inner()).await?;
    let payments = payment::list_payments(&mut *conn, found.id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

pub async fn add_service(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<CreateService>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let added = service::add_service(&mut *tx, path.into_inner(), &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(added))
}

pub async fn list_services(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let found = folio::get_folio(&mut *conn, path.into_inner()).await?;
    let services = service::list_services(&mut *conn, found.id).await?;
    Ok(HttpResponse::Ok().json(services))
}

pub async fn delete_service(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    service::delete_service(&mut *tx, path.into_inner()).await?;
    tx.commit().await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn create_invoice(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    let issued = invoice::create_invoice(&mut *tx, path.into_inner(), today()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(issued))
}

pub async fn list_invoices(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let found = folio::get_folio(&mut *conn, path.into_inner()).await?;
    let invoices = invoice::list_invoices(&mut *conn, found.id).await?;
    Ok(HttpResponse::Ok().json(invoices))
}

pub async fn get_invoice(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let detail = invoice::get_invoice(&mut *conn, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}
