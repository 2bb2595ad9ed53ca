use base64::{Engine, prelude::BASE64_STANDARD};

use crate::{
    gateway::{
        error::CallbackRejection,
        mask,
        sign::{SaltKey, checksums_match},
    },
    orders::{OrderStatus, OrderStore, Transition},
};

/// Callback exactly as received. Its payload is not reachable until the checksum is verified.
#[derive(Debug)]
pub struct UnverifiedCallback {
    checksum: String,
    response: String,
}

/// Callback whose checksum matched the one recomputed with our salt key
#[derive(Debug)]
pub struct VerifiedCallback {
    response: String,
}

/// Decoded `response` of a verified callback
#[derive(Debug, serde::Deserialize)]
pub struct CallbackPayload {
    #[serde(default)]
    pub success: bool,
    pub code: PaymentCode,
    #[serde(default)]
    pub message: String,
    pub data: CallbackTransaction,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackTransaction {
    pub merchant_transaction_id: String,
    /// Processor side transaction id
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "String")]
pub enum PaymentCode {
    PaymentSuccess,
    PaymentError,
    Other(String),
}

impl From<String> for PaymentCode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PAYMENT_SUCCESS" => Self::PaymentSuccess,
            "PAYMENT_ERROR" => Self::PaymentError,
            _ => Self::Other(value),
        }
    }
}

impl PaymentCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentSuccess => "PAYMENT_SUCCESS",
            Self::PaymentError => "PAYMENT_ERROR",
            Self::Other(code) => code,
        }
    }
}

/// Result of an accepted callback
#[derive(Debug, PartialEq, Eq)]
pub struct VerifiedOutcome {
    pub transaction_id: String,
    pub status: OrderStatus,
    pub transition: Transition,
}

impl UnverifiedCallback {
    pub fn new(
        checksum: Option<&str>,
        response: Option<String>,
    ) -> Result<Self, CallbackRejection> {
        let checksum = checksum
            .filter(|c| !c.is_empty())
            .ok_or(CallbackRejection::Malformed("missing X-VERIFY header"))?;
        let response = response
            .filter(|r| !r.is_empty())
            .ok_or(CallbackRejection::Malformed("no response payload"))?;
        Ok(Self {
            checksum: checksum.to_string(),
            response,
        })
    }

    pub fn verify(self, salt: &SaltKey) -> Result<VerifiedCallback, CallbackRejection> {
        let expected = salt.sign_callback(&self.response);
        if !checksums_match(&expected, &self.checksum) {
            tracing::warn!(
                received = %mask::prefix(&self.checksum, 8),
                "Callback checksum mismatch, rejecting notification"
            );
            return Err(CallbackRejection::SignatureMismatch);
        }
        Ok(VerifiedCallback {
            response: self.response,
        })
    }
}

impl VerifiedCallback {
    pub fn decode(&self) -> Result<CallbackPayload, CallbackRejection> {
        let bytes = BASE64_STANDARD
            .decode(&self.response)
            .map_err(|_| CallbackRejection::Malformed("response is not valid base64"))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| CallbackRejection::Malformed("response is not a payment notification"))
    }
}

/// Verify, decode and apply a processor callback to the order store.
///
/// Safe to call repeatedly with the same notification.
pub async fn handle_callback(
    salt: &SaltKey,
    orders: &dyn OrderStore,
    callback: UnverifiedCallback,
) -> Result<VerifiedOutcome, CallbackRejection> {
    let payload = callback.verify(salt)?.decode()?;
    let transaction_id = payload.data.merchant_transaction_id;
    let status = OrderStatus::from(&payload.code);

    match &payload.code {
        PaymentCode::PaymentSuccess => {
            tracing::info!(%transaction_id, amount = ?payload.data.amount, "Payment succeeded")
        }
        PaymentCode::PaymentError => {
            tracing::info!(%transaction_id, message = %payload.message, "Payment failed")
        }
        PaymentCode::Other(code) => tracing::warn!(
            %transaction_id,
            %code,
            success = payload.success,
            "Payment in non final state"
        ),
    }

    let transition = orders
        .record_transition(&transaction_id, status)
        .await
        .inspect_err(|e| {
            tracing::error!(%transaction_id, "Failed to record order transition: {e}");
        })?;
    if transition == Transition::Unchanged {
        tracing::debug!(%transaction_id, %status, "Order already up to date, duplicate callback");
    }

    Ok(VerifiedOutcome {
        transaction_id,
        status,
        transition,
    })
}
