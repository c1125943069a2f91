use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("Duplicate: {0}")]
    DuplicateConflict(String),

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("{}", describe_sync_failure(.step, .completed, .message))]
    RemoteSync {
        step: String,
        completed: Vec<String>,
        message: String,
    },
}

fn describe_sync_failure(step: &str, completed: &[String], message: &str) -> String {
    if completed.is_empty() {
        format!("Sync failed at {}: {}", step, message)
    } else {
        format!(
            "{} succeeded, but {} failed: {}",
            completed.join(", "),
            step,
            message
        )
    }
}

impl AppError {
    /// Maps a storage error raised by a schedule write, turning SQLite's
    /// foreign-key failure into a referential integrity error.
    pub fn from_schedule_write(err: sqlx::Error, course_id: i64) -> Self {
        if is_foreign_key_violation(&err) {
            AppError::ReferentialIntegrity(format!("course {} does not exist", course_id))
        } else {
            AppError::Storage(err)
        }
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err.as_database_error() {
        Some(db_err) => {
            db_err.is_foreign_key_violation()
                || db_err.message().contains("FOREIGN KEY constraint failed")
        }
        None => false,
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ReferentialIntegrity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::DuplicateConflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::Storage(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            AppError::Migration(e) => {
                error!("migration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database schema error".to_string(),
                )
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::RemoteUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            err @ AppError::RemoteSync { .. } => (StatusCode::BAD_GATEWAY, err.to_string()),
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}
