use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::PmsError;
use crate::models::board_service::{AttachBoardService, CreateBoardService};
use crate::models::property::PropertyFilter;
use crate::services::inventory;

pub async fn create_board_service(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateBoardService>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let board_service = inventory::create_board_service(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(board_service))
}

pub async fn list_board_services(
    pool: web::Data<SqlitePool>,
    query: web::Query<PropertyFilter>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let board_services = inventory::list_board_services(&mut *conn, query.property_id).await?;
    Ok(HttpResponse::Ok().json(board_services))
}

pub async fn attach_room_type(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<AttachBoardService>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let link = inventory::attach_board_service(&mut *tx, path.into_inner(), &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(link))
}
