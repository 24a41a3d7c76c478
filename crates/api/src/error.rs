//! HTTP mapping for application errors.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use envelope_core::ledger::LedgerError;
use envelope_shared::AppError;
use serde_json::json;
use tracing::{debug, error};

/// Result type for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An [`AppError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Malformed request input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(AppError::BadRequest(message.into()))
    }

    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            StatusCode::NOT_FOUND => {}
            s if s.is_server_error() => error!(error = %self.0, "Request failed"),
            _ => debug!(error = %self.0, "Request rejected"),
        }

        (
            status,
            [(header::CACHE_CONTROL, "no-cache")],
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

/// Serializes `data` with the given status and a `no-cache` header.
pub fn json_response<T: serde::Serialize>(status: StatusCode, data: T) -> Response {
    (status, [(header::CACHE_CONTROL, "no-cache")], Json(data)).into_response()
}
