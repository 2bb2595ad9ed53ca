#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
};
use base64::{Engine, prelude::BASE64_STANDARD};
use http_body_util::BodyExt;
use phonepe_gateway::{
    config::Config,
    gateway::sign::SaltKey,
    orders::{
        InMemoryOrderStore, NewOrder, Order, OrderStatus, OrderStore, OrderStoreError, Transition,
    },
    state::AppState,
};
use tower::ServiceExt;

pub const MERCHANT_ID: &str = "MERCHANTUAT";
pub const SALT_KEY: &str = "099eb0cd-02cf-4e2a-8aca-3e6c6aff0399";
pub const SALT_INDEX: u32 = 1;
pub const PUBLIC_HOSTNAME: &str = "https://gw.example.com";

pub fn salt() -> SaltKey {
    SaltKey::new(SALT_KEY, SALT_INDEX)
}

pub fn config(api_base_url: &str, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("PHONEPE_MERCHANT_ID", MERCHANT_ID),
        ("PHONEPE_SALT_KEY", SALT_KEY),
        ("PHONEPE_SALT_INDEX", "1"),
        ("PUBLIC_HOSTNAME", PUBLIC_HOSTNAME),
        ("PHONEPE_API_BASE_URL", api_base_url),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// Order store that counts calls and forwards to an in-memory store
#[derive(Debug, Default, Clone)]
pub struct RecordingOrderStore {
    inner: InMemoryOrderStore,
    pub initiated: Arc<AtomicUsize>,
    pub transitions: Arc<AtomicUsize>,
}

impl RecordingOrderStore {
    pub fn transition_calls(&self) -> usize {
        self.transitions.load(Ordering::SeqCst)
    }

    pub fn initiated_calls(&self) -> usize {
        self.initiated.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for RecordingOrderStore {
    async fn record_initiated(&self, order: &NewOrder) -> Result<(), OrderStoreError> {
        self.initiated.fetch_add(1, Ordering::SeqCst);
        self.inner.record_initiated(order).await
    }

    async fn record_transition(
        &self,
        transaction_id: &str,
        status: OrderStatus,
    ) -> Result<Transition, OrderStoreError> {
        self.transitions.fetch_add(1, Ordering::SeqCst);
        self.inner.record_transition(transaction_id, status).await
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Order>, OrderStoreError> {
        self.inner.get(transaction_id).await
    }
}

/// Pay request as seen by the mock processor
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub checksum: Option<String>,
    pub body: serde_json::Value,
}

impl CapturedRequest {
    pub fn encoded_payload(&self) -> &str {
        self.body["request"].as_str().unwrap()
    }

    pub fn decoded_payload(&self) -> serde_json::Value {
        let bytes = BASE64_STANDARD.decode(self.encoded_payload()).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: serde_json::Value,
    delay: Duration,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

pub struct MockProcessor {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockProcessor {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

async fn pay(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.captured.lock().unwrap().push(CapturedRequest {
        checksum: headers
            .get("x-verify")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    tokio::time::sleep(state.delay).await;
    (state.status, Json(state.body))
}

/// Serve a fake `/pg/v1/pay` endpoint answering every request with `status` and `body`.
pub async fn mock_processor(status: StatusCode, body: serde_json::Value) -> MockProcessor {
    mock_processor_with_delay(status, body, Duration::ZERO).await
}

pub async fn mock_processor_with_delay(
    status: StatusCode,
    body: serde_json::Value,
    delay: Duration,
) -> MockProcessor {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        body,
        delay,
        captured: captured.clone(),
    };
    let app = Router::new()
        .route("/pg/v1/pay", post(pay))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockProcessor {
        base_url: format!("http://{addr}"),
        captured,
    }
}

/// Base url of a port nothing listens on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn app(config: Config, orders: RecordingOrderStore) -> Router {
    let state = AppState::new(Arc::new(config), Arc::new(orders)).unwrap();
    phonepe_gateway::app(state)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
