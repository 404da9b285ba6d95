use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{ConflictKind, CoreError};
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    #[error("Unprocessable entity: {0}")]
    Unprocessable(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(kind) => kind.code(),
            AppError::Unprocessable(_) => "UNPROCESSABLE_ENTITY",
            AppError::Unavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    fn log(&self) {
        match self {
            AppError::Unavailable(msg) => {
                error!(error = ?self, message = %msg, "Storage unavailable");
            }
            AppError::AuthError(msg) | AppError::Forbidden(msg) => {
                warn!(error = ?self, message = %msg, "Request refused");
            }
            _ => {
                info!(error = ?self, "Request rejected");
            }
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound => AppError::NotFound("Event not found".to_string()),
            CoreError::Conflict(kind) => AppError::Conflict(kind),
            CoreError::Unprocessable(msg) => AppError::Unprocessable(msg),
            CoreError::InvalidInput(msg) => AppError::ValidationError(msg),
            CoreError::Unavailable(msg) => AppError::Unavailable(msg),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        info!(reason = %rejection.body_text(), "Unparseable path parameter");
        CoreError::NotFound.into()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        // Only expose high-level message to the client
        let (public_message, details) = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Unprocessable(msg) => (msg.clone(), None),
            AppError::Conflict(kind) => (kind.to_string(), None),
            AppError::Unavailable(_) => (
                "The service is temporarily unavailable".to_string(),
                Some(json!({ "retryable": true })),
            ),
        };

        let mut response = error_response(code, public_message, details, status);
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_http_statuses() {
        let cases = [
            (CoreError::NotFound, StatusCode::NOT_FOUND),
            (CoreError::Conflict(ConflictKind::Full), StatusCode::CONFLICT),
            (CoreError::Unprocessable("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (CoreError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (core, expected) in cases {
            assert_eq!(AppError::from(core).status_code(), expected);
        }
    }

    #[test]
    fn test_conflict_code_names_the_precondition() {
        assert_eq!(AppError::Conflict(ConflictKind::Full).code(), "EVENT_FULL");
        assert_eq!(
            AppError::Conflict(ConflictKind::Duplicate).code(),
            "ALREADY_ENROLLED"
        );
    }

    #[test]
    fn test_unavailable_response_is_retryable_and_hides_details() {
        let response = AppError::Unavailable("pool timed out on 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().contains_key(RETRY_AFTER));
    }
}
