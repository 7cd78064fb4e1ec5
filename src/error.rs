use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::ERR_FORBIDDEN;
use crate::db::lifecycle::TeardownFailure;

/// Application error type
///
/// Lookup failures are classified rather than described: callers branch on the
/// variant, never on the message text.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No {entity} exists with {reference}")]
    NotFound {
        entity: &'static str,
        reference: String,
    },

    /// Duplicate primary key. Indicates corrupt data, not user error.
    #[error("Multiple {entity} records exist with ID = {id}")]
    AmbiguousId { entity: &'static str, id: i64 },

    #[error("Multiple {entity} records exist with NAME = {name}")]
    AmbiguousName { entity: &'static str, name: String },

    #[error("Forbidden")]
    Forbidden,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Tenant teardown failed: {0}")]
    TeardownFailed(Box<TeardownFailure>),
}

impl AppError {
    pub fn not_found_id(entity: &'static str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound {
            entity,
            reference: format!("ID = {id}"),
        }
    }

    pub fn not_found_name(entity: &'static str, name: &str) -> Self {
        AppError::NotFound {
            entity,
            reference: format!("NAME = {name}"),
        }
    }

    /// HTTP status the transport layer reports for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::StoreUnavailable(_) | AppError::TeardownFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidInput(_)
            | AppError::AmbiguousId { .. }
            | AppError::AmbiguousName { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized | AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::StoreUnavailable(ref e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "error": "Internal server error" })
            }
            AppError::TeardownFailed(ref failure) => {
                tracing::error!("Tenant teardown failed: {:?}", failure);
                json!({
                    "error": "Failed to drop map tables",
                    "tenant": failure.tenant,
                    "executed": failure.executed,
                    "failed": failure.failed,
                    "notAttempted": failure.not_attempted,
                })
            }
            AppError::AmbiguousId { .. } => {
                tracing::error!("Duplicate primary key detected: {}", self);
                json!({ "error": self.to_string() })
            }
            AppError::Forbidden => json!({ "error": ERR_FORBIDDEN }),
            AppError::InvalidInput(ref msg) => json!({ "error": msg }),
            AppError::Unauthorized => json!({ "error": "Authentication required" }),
            AppError::InvalidSignature => json!({ "error": "Invalid requester signature" }),
            AppError::NotFound { .. } | AppError::AmbiguousName { .. } => {
                json!({ "error": self.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
