//! Translation of domain errors into HTTP responses.
//!
//! Every failed request gets a JSON body `{"error": "...", "code": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use shared::ErrorResponse;

use crate::domain::DomainError;

impl DomainError {
    /// Status code and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            DomainError::InsufficientPoints { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_POINTS"),
            DomainError::SoldOut { .. } => (StatusCode::CONFLICT, "SOLD_OUT"),
            DomainError::NotEligible { .. } => (StatusCode::FORBIDDEN, "NOT_ELIGIBLE"),
            DomainError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            DomainError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            DomainError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            DomainError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage details stay in the log
        let message = match &self {
            DomainError::Storage(e) => {
                error!("Storage failure: {:#}", e);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
