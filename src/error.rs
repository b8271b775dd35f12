use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Stable, machine-readable error codes. Clients match on these, never on
/// the human-readable message.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const USER_ERROR: &str = "USER_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Error type shared by every service and handler.
///
/// Returning one of these from inside a transaction drops the transaction
/// uncommitted, so the offending write is rolled back.
#[derive(Error, Debug)]
pub enum PmsError {
    /// Record does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Malformed or out-of-range input. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// A business rule refused the operation. HTTP 422.
    #[error("{0}")]
    UserError(String),

    /// Duplicate code, double-booked room, exhausted availability. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl PmsError {
    pub fn not_found(model: &str, id: i64) -> Self {
        PmsError::NotFound(format!("{} {} not found", model, id))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PmsError::NotFound(_) => error_code::NOT_FOUND,
            PmsError::Validation(_) => error_code::VALIDATION_FAILED,
            PmsError::UserError(_) => error_code::USER_ERROR,
            PmsError::Conflict(_) => error_code::CONFLICT,
            PmsError::Database(_) | PmsError::Migrate(_) => error_code::STORAGE_ERROR,
        }
    }
}

impl From<sqlx::Error> for PmsError {
    fn from(err: sqlx::Error) -> Self {
        let unique = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if unique {
            PmsError::Conflict(err.to_string())
        } else {
            PmsError::Database(err)
        }
    }
}

impl From<validator::ValidationErrors> for PmsError {
    fn from(errors: validator::ValidationErrors) -> Self {
        PmsError::Validation(errors.to_string())
    }
}

impl ResponseError for PmsError {
    fn status_code(&self) -> StatusCode {
        match self {
            PmsError::NotFound(_) => StatusCode::NOT_FOUND,
            PmsError::Validation(_) => StatusCode::BAD_REQUEST,
            PmsError::UserError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PmsError::Conflict(_) => StatusCode::CONFLICT,
            PmsError::Database(_) | PmsError::Migrate(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self, PmsError::Database(_) | PmsError::Migrate(_)) {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        }))
    }
}
