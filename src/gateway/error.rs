use std::fmt::Display;

use axum::{http::StatusCode, response::IntoResponse};

use crate::{orders::OrderStoreError, storefront::ErrorResponse};

#[derive(Debug)]
pub enum GatewayError {
    /// Processor could not be reached or did not answer in time
    UpstreamUnavailable(reqwest::Error),
    /// Pay request could not be encoded
    Serialization(serde_json::Error),
}

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        Self::UpstreamUnavailable(value)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl std::error::Error for GatewayError {}

impl Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::UpstreamUnavailable(e) if e.is_timeout() => {
                write!(f, "payment processor timed out: {e}")
            }
            GatewayError::UpstreamUnavailable(e) => {
                write!(f, "payment processor unavailable: {e}")
            }
            GatewayError::Serialization(e) => write!(f, "pay request serialization: {e}"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        match self {
            GatewayError::UpstreamUnavailable(_) => ErrorResponse::new(
                StatusCode::BAD_GATEWAY,
                "Payment processor is unavailable, try again later",
            ),
            GatewayError::Serialization(_) => ErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to prepare payment request",
            ),
        }
        .into_response()
    }
}

/// Reasons a processor callback is refused
#[derive(Debug, thiserror::Error)]
pub enum CallbackRejection {
    #[error("malformed callback: {0}")]
    Malformed(&'static str),
    #[error("callback checksum mismatch")]
    SignatureMismatch,
    #[error("failed to record order transition: {0}")]
    Store(#[from] OrderStoreError),
}

impl CallbackRejection {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::SignatureMismatch => StatusCode::UNAUTHORIZED,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CallbackRejection {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            Self::Malformed(reason) => format!("Bad Request: {reason}"),
            Self::SignatureMismatch => "Unauthorized: checksum verification failed".to_string(),
            Self::Store(_) => "Internal Server Error".to_string(),
        };
        ErrorResponse::new(self.status_code(), message).into_response()
    }
}
