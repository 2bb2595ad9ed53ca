use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Serialize)]
struct Request {
    url: String,
    params: serde_json::Value,
}

/// Summary of one round trip to the payment processor
#[derive(Debug, Serialize)]
pub struct InteractionLog {
    kind: String,
    request: Option<Request>,
    status: Option<u16>,
    response: Option<serde_json::Value>,
    #[serde(serialize_with = "as_secs")]
    duration: Duration,
}

fn as_secs<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f32(duration.as_secs_f32())
}

/// Collects what was sent and received during a processor call.
///
/// Callers are expected to only hand in already masked values.
#[derive(Debug)]
pub struct InteractionSpan {
    created: Instant,
    request: Option<Request>,
    response: Option<serde_json::Value>,
    response_status: Option<u16>,
}

impl InteractionSpan {
    pub fn enter() -> Self {
        Self {
            created: Instant::now(),
            request: None,
            response: None,
            response_status: None,
        }
    }

    pub fn set_request(&mut self, url: String, params: &impl Serialize) {
        let params = serde_json::to_value(params).unwrap_or_default();
        self.request = Some(Request { url, params });
    }

    pub fn set_response(&mut self, res: &impl Serialize) {
        self.response = serde_json::to_value(res).ok();
    }

    pub fn set_response_status(&mut self, status: u16) {
        self.response_status = Some(status);
    }

    /// Close the span and emit its summary.
    pub fn finish(self, kind: &str) -> InteractionLog {
        let log = InteractionLog {
            kind: kind.into(),
            request: self.request,
            status: self.response_status,
            response: self.response,
            duration: self.created.elapsed(),
        };
        tracing::info!(
            kind,
            url = log.request.as_ref().map(|r| r.url.as_str()),
            status = log.status,
            duration_ms = log.duration.as_millis() as u64,
            "Payment processor interaction"
        );
        if let Ok(details) = serde_json::to_string(&log) {
            tracing::debug!(%details, "Payment processor interaction details");
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_span_keeps_request_and_status() {
        let mut span = InteractionSpan::enter();
        span.set_request(
            "https://api.phonepe.com/pg/v1/pay".into(),
            &serde_json::json!({ "amount": 100 }),
        );
        span.set_response_status(200);
        span.set_response(&serde_json::json!({ "success": true }));
        let log = span.finish("pay");

        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["kind"], "pay");
        assert_eq!(value["request"]["url"], "https://api.phonepe.com/pg/v1/pay");
        assert_eq!(value["request"]["params"]["amount"], 100);
        assert_eq!(value["response"]["success"], true);
        assert!(value["duration"].as_f64().unwrap() >= 0.0);
    }

    #[test]
    fn span_without_response() {
        let log = InteractionSpan::enter().finish("pay");
        let value = serde_json::to_value(&log).unwrap();
        assert!(value["status"].is_null());
        assert!(value["response"].is_null());
    }
}
