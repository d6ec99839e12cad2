//! JSON error responses of the dashboard service.
//!
//! Every failure is rendered as `{ "error": <message>, "code": <CODE> }`.
//! A stale dashboard write also carries `current_version` so the editor can
//! tell the user how far behind its copy is.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dlv_core::error::CoreError;
use serde_json::json;

/// Why a request carried no usable credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Invalid Authorization format. Expected: Bearer <token>")]
    NotBearer,

    #[error("Invalid or expired token")]
    InvalidToken,
}

/// Error type returned by handlers and extractors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A dashboard or catalog rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The bearer token was missing or rejected.
    #[error(transparent)]
    Auth(#[from] AuthFailure),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CoreError::VersionConflict { .. } => (StatusCode::CONFLICT, "VERSION_CONFLICT"),
                CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                CoreError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            },
        }
    }

    /// The text shown to the caller; the ids of missing entities are not echoed.
    fn message(&self) -> String {
        match self {
            AppError::Core(CoreError::NotFound { entity, .. }) => format!("{entity} not found"),
            AppError::Core(
                CoreError::Validation(msg)
                | CoreError::Conflict(msg)
                | CoreError::Unauthorized(msg)
                | CoreError::Forbidden(msg),
            ) => msg.clone(),
            AppError::Core(conflict @ CoreError::VersionConflict { .. }) => conflict.to_string(),
            AppError::Auth(failure) => failure.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let mut body = json!({
            "error": self.message(),
            "code": code,
        });

        if let AppError::Core(CoreError::VersionConflict { id, current, .. }) = &self {
            tracing::info!(dashboard_id = %id, current_version = current, "Rejected stale write");
            body["current_version"] = json!(current);
        }

        (status, axum::Json(body)).into_response()
    }
}
