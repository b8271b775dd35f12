use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::PmsError;
use crate::models::wizard::MassiveChanges;
use crate::services::massive_changes;

pub async fn apply_massive_changes(
    pool: web::Data<SqlitePool>,
    body: web::Json<MassiveChanges>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let result = massive_changes::apply_massive_changes(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(result))
}
