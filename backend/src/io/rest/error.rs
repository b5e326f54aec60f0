//! Maps domain failures onto HTTP responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;
use tracing::{error, warn};

use crate::domain::error::DomainError;

pub fn status_code(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Permission(_) => StatusCode::FORBIDDEN,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Storage(_) | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Log a failed request: server faults at error, client mistakes at warn
pub fn log_failure(action: &str, err: &DomainError) {
    if status_code(err).is_server_error() {
        error!("Failed to {}: {}", action, err);
    } else {
        warn!("Failed to {}: {}", action, err);
    }
}

// Malformed bodies, query strings and path segments are client input errors
impl From<JsonRejection> for DomainError {
    fn from(rejection: JsonRejection) -> Self {
        DomainError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for DomainError {
    fn from(rejection: QueryRejection) -> Self {
        DomainError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for DomainError {
    fn from(rejection: PathRejection) -> Self {
        DomainError::Validation(rejection.body_text())
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        let message = match self {
            // Details are in the log; clients get a generic message
            DomainError::Storage(_) | DomainError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
