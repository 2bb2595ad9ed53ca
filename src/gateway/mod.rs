use std::sync::Arc;

use serde::Deserialize;

use crate::{
    config::Config, gateway::error::GatewayError, storefront::interaction_log::InteractionSpan,
};

pub mod api;
/// Processor callback verification
pub mod callback;
pub mod error;
/// Type conversions between storefront, processor and order types
mod from;
/// Requisite masking
pub mod mask;
pub mod payin;
/// `X-VERIFY` checksum
pub mod sign;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// What the buyer should be told after initiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectResult {
    /// Send the buyer to the processor's pay page
    Redirect { url: String },
    /// Processor was reached but refused the payment
    Rejected { message: String },
}

impl RedirectResult {
    /// Interpret a raw processor answer to a pay request.
    ///
    /// Envelope fields are read one by one, a field of unexpected type never hides the others.
    fn from_processor(response: serde_json::Value) -> Self {
        let success = response
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        if let Some(url) = response
            .get("data")
            .filter(|_| success)
            .and_then(|data| payin::PayResponseData::deserialize(data).ok())
            .and_then(payin::PayResponseData::redirect_url)
        {
            return Self::Redirect { url };
        }
        let message = text_field(&response, "message")
            .or_else(|| text_field(&response, "code"))
            .unwrap_or_else(|| dump(&response));
        Self::Rejected { message }
    }
}

fn text_field(response: &serde_json::Value, key: &str) -> Option<String> {
    match response.get(key)? {
        serde_json::Value::String(text) if !text.is_empty() => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn dump(response: &serde_json::Value) -> String {
    match response {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct PhonePeGateway {
    client: reqwest::Client,
    config: Arc<Config>,
    callback_url: String,
}

impl PhonePeGateway {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let callback_url = config.callback_url();
        Ok(Self {
            client,
            config,
            callback_url,
        })
    }

    /// Sign and submit a pay page request for `order`.
    ///
    /// Processor refusals are returned as [`RedirectResult::Rejected`], only transport
    /// failures are errors.
    pub async fn initiate_payment(
        &self,
        order: &payin::PaymentOrder,
        span: &mut InteractionSpan,
    ) -> Result<RedirectResult> {
        let request = self.payment_request(order);
        let envelope =
            payin::SignedEnvelope::seal(&request, &self.config.salt, &self.config.pay_path)?;
        let url = self.config.pay_url();

        let secured_request = mask::secure_serializable(&request);
        tracing::debug!(
            %url,
            data = %secured_request,
            checksum = %mask::prefix(&envelope.checksum, 8),
            "Gateway API pay request"
        );
        span.set_request(url.clone(), &secured_request);

        let res = self
            .client
            .post(&url)
            .headers(sign::signed_headers(&envelope.checksum))
            .json(&envelope.body())
            .send()
            .await?;
        let status = res.status();
        span.set_response_status(status.as_u16());

        let text = res.text().await?;
        let response = serde_json::from_str::<serde_json::Value>(&text)
            .unwrap_or(serde_json::Value::String(text));
        let secured_response = mask::secure_value(&response);
        span.set_response(&secured_response);
        tracing::debug!(%status, response = %secured_response, "Gateway API pay response");

        Ok(RedirectResult::from_processor(response))
    }
}
