use actix_web::{web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::error::PmsError;
use crate::models::availability::{CreateAvailabilityPlan, RuleQuery, UpsertRule};
use crate::services::availability;

pub async fn create_plan(
    pool: web::Data<SqlitePool>,
    body: web::Json<CreateAvailabilityPlan>,
) -> Result<HttpResponse, PmsError> {
    body.validate()?;
    let mut tx = pool.begin().await?;
    let plan = availability::create_plan(&mut *tx, &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Created().json(plan))
}

pub async fn list_plans(pool: web::Data<SqlitePool>) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let plans = availability::list_plans(&mut *conn).await?;
    Ok(HttpResponse::Ok().json(plans))
}

pub async fn upsert_rules(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<Vec<UpsertRule>>,
) -> Result<HttpResponse, PmsError> {
    for rule in body.iter() {
        rule.validate()?;
    }
    let mut tx = pool.begin().await?;
    let rules = availability::upsert_rules(&mut *tx, path.into_inner(), &body).await?;
    tx.commit().await?;
    Ok(HttpResponse::Ok().json(rules))
}

pub async fn list_rules(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    query: web::Query<RuleQuery>,
) -> Result<HttpResponse, PmsError> {
    let mut conn = pool.acquire().await?;
    let plan = availability::get_plan(&mut *conn, path.into_inner()).await?;
    let rules = availability::list_rules(&mut *conn, plan.id, &query).await?;
    Ok(HttpResponse::Ok().json(rules))
}
