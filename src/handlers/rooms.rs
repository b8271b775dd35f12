use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::PmsError;
use crate::models::property::PropertyFilter;
use crate::models::room::{CreateRoom, CreateRoomType, RoomSearch};
use crate::services::inventory;

use super::today;

pub async fn create_room_type(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateRoomType>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let room_type = inventory::create_room_type(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(room_type))
}

pub async fn list_room_types(
    pool: web::Data<SqlitePool>,
    query: web::Query<PropertyFilter>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let room_types = inventory::list_room_types(&mut *conn, query.property_id).await?;
    Ok(HttpResponse::Ok().json(room_types))
}

pub async fn get_room_type(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let room_type = inventory::get_room_type(&mut *conn, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(room_type))
}

pub async fn create_room(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateRoom>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let room = inventory::create_room(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(room))
}

pub async fn list_rooms(
    pool: web::Data<SqlitePool>,
    query: web::Query<RoomSearch>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let rooms = inventory::list_rooms(&mut *conn, &query).await?;
    Ok(HttpResponse::Ok().json(rooms))
}

pub async fn deactivate_room(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, PmsError> {
    let mut tx = pool.begin().await?;
    let room = inventory::deactivate_room(&mut *tx, path.into_inner(), today()).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(room))
}
