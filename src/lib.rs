//! PhonePe pay page gateway.
//!
//! This crate is split in 2 main modules:
//!
//! - [gateway] (payment processor integration: signing, outbound pay request, callbacks)
//! - [storefront] (API surface used by the merchant storefront)
use axum::{Json, Router, http::HeaderValue, routing::get};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod config;
/// Payment processor integration
///
/// Types and methods to communicate with PhonePe: request signing, the pay request and
/// verification of server-to-server callbacks.
pub mod gateway;
/// Merchant order records
pub mod orders;
pub mod state;
/// Implementation of the storefront facing API
pub mod storefront;

use state::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors(allowed_origins: Option<&[String]>) -> CorsLayer {
    let origin = match allowed_origins {
        Some(origins) if !origins.iter().any(|o| o == "*") => AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        ),
        _ => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(storefront::api::router())
        .merge(gateway::api::router())
        .route("/health", get(health))
        .layer(cors(state.config.allowed_origins.as_deref()))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
