use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use tracing::instrument;

use crate::{
    config::CALLBACK_PATH,
    gateway::{
        callback::{self, UnverifiedCallback},
        error::CallbackRejection,
        sign::X_VERIFY,
    },
    state::AppState,
};

#[derive(Debug, serde::Deserialize)]
struct CallbackBody {
    response: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct CallbackAck {
    success: bool,
    message: &'static str,
}

#[instrument(skip_all)]
async fn callback_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CallbackAck>), CallbackRejection> {
    tracing::debug!("Received callback from payment processor");
    let checksum = headers.get(X_VERIFY).and_then(|v| v.to_str().ok());
    let response = serde_json::from_slice::<CallbackBody>(&body)
        .ok()
        .and_then(|b| b.response);
    let callback = UnverifiedCallback::new(checksum, response).inspect_err(|e| {
        tracing::warn!("Rejected callback: {e}");
    })?;

    let outcome = callback::handle_callback(&state.config.salt, state.orders.as_ref(), callback)
        .await
        .inspect_err(|e| tracing::warn!("Rejected callback: {e}"))?;
    tracing::info!(
        transaction_id = %outcome.transaction_id,
        status = %outcome.status,
        transition = ?outcome.transition,
        "Processed payment callback"
    );

    Ok((
        StatusCode::OK,
        Json(CallbackAck {
            success: true,
            message: "Callback received",
        }),
    ))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(CALLBACK_PATH, post(callback_handler))
        .route("/phonepe-callback", post(callback_handler))
}
