use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{SqliteConnection, SqlitePool};

use crate::config::Config;
use crate::error::PmsError;

pub async fn get_db_pool(config: &Config) -> Result<SqlitePool, PmsError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Single-connection in-memory pool. Every connection to `sqlite::memory:`
/// opens its own database, so the pool must never grow past one.
pub async fn memory_pool() -> Result<SqlitePool, PmsError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), PmsError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Next number of a `<prefix><n>` sequence, computed from the names already
/// stored in `table`.
pub async fn next_sequence(
    conn: &mut SqliteConnection,
    table: &str,
    prefix: &str,
) -> Result<i64, PmsError> {
    let sql = format!(
        "SELECT COALESCE(MAX(CAST(SUBSTR(name, ?) AS INTEGER)), 0) FROM {} WHERE name LIKE ?",
        table
    );
    let last: i64 = sqlx::query_scalar(&sql)
        .bind(prefix.chars().count() as i64 + 1)
        .bind(format!("{}%", prefix))
        .fetch_one(&mut *conn)
        .await?;
    Ok(last + 1)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
