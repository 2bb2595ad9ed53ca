use axum::{Json, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Serialize;

pub mod api;
pub mod interaction_log;

/// Caller input that can never be sent to the processor
#[derive(Debug, thiserror::Error)]
pub enum InitiateError {
    #[error("invalid amount {0}: must be positive with at most two decimal places")]
    InvalidAmount(Decimal),
    #[error("malformed request: {0}")]
    MalformedRequest(&'static str),
}

impl IntoResponse for InitiateError {
    fn into_response(self) -> axum::response::Response {
        ErrorResponse::new(StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// Uniform `{ "success": false, "message": ... }` error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    status: StatusCode,
    success: bool,
    message: String,
}

impl std::error::Error for ErrorResponse {}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            message: message.into(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        tracing::debug!(status = %self.status, message = %self.message, "Error response payload");
        (self.status, Json(self)).into_response()
    }
}
