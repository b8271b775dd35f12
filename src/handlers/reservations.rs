use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::PmsError;
use crate::models::checkin_partner::GuestData;
use crate::models::reservation::{CreateReservation, UpdateReservation, UpdateReservationLine};
use crate::services::{checkin, reservation};

use super::{now, today};

pub async fn create_reservation(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateReservation>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let created = reservation::create_for_folio(&mut *tx, body.folio_id, &body.stay).await?;
    let detail = reservation::get_reservation_detail(&mut *tx, created.id).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(detail))
}

pub async fn get_reservation(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let detail = reservation::get_reservation_detail(&mut *conn, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn update_reservation(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateReservation>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let updated = reservation::update_reservation(&mut *tx, path.into_inner(), &body).await?;
    let detail = reservation::get_reservation_detail(&mut *tx, updated.id).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn confirm_reservation(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    let confirmed = reservation::confirm_reservation(&mut *tx, path.into_inner()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(confirmed))
}

pub async fn cancel_reservation(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    let cancelled = reservation::cancel_reservation(&mut *tx, path.into_inner(), today()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(cancelled))
}

pub async fn checkout_reservation(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    let done = reservation::checkout_reservation(&mut *tx, path.into_inner(), now()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(done))
}

pub async fn update_line(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateReservationLine>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let line = reservation::update_line(&mut *tx, path.into_inner(), &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(line))
}

pub async fn register_guest(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<GuestData>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let guest = checkin::register_guest(&mut *tx, path.into_inner(), body.into_inner()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(guest))
}

pub async fn list_guests(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let found = reservation::get_reservation(&mut *conn, path.into_inner()).await?;
    let guests = checkin::list_guests(&mut *conn, found.id).await?;
    Ok(HttpResponse::Ok().json(guests))
}

pub async fn update_guest(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<GuestData>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let guest = checkin::update_guest(&mut *tx, path.into_inner(), body.into_inner()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(guest))
}

pub async fn onboard_guest(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    let guest = checkin::onboard_guest(&mut *tx, path.into_inner(), today(), now()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(guest))
}
