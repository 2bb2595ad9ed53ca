use base64::{Engine, prelude::BASE64_STANDARD};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use time::OffsetDateTime;

use crate::gateway::sign::SaltKey;

const TRANSACTION_ID_PREFIX: &str = "MUID";

/// Validated purchase ready to be sent to the processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOrder {
    pub transaction_id: String,
    pub buyer_id: String,
    pub phone: String,
    /// Amount in minor currency units
    pub amount: u64,
    pub redirect_url: String,
}

/// Pay page request payload. Sent base64 encoded under the `request` key.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest<'a> {
    pub merchant_id: &'a str,
    pub merchant_transaction_id: &'a str,
    pub merchant_user_id: &'a str,
    pub amount: u64,
    pub redirect_url: &'a str,
    pub redirect_mode: RedirectMode,
    pub callback_url: &'a str,
    pub mobile_number: &'a str,
    pub payment_instrument: PaymentInstrument,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RedirectMode {
    /// Buyer lands on the redirect url with the payment result posted by the processor
    Post,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentInstrument {
    /// Buyer is redirected to the processor's hosted pay page
    PayPage,
}

/// Encoded request together with its `X-VERIFY` checksum
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    pub payload: String,
    pub checksum: String,
}

#[derive(Debug, serde::Serialize)]
pub struct EnvelopeBody<'a> {
    pub request: &'a str,
}

impl SignedEnvelope {
    pub fn seal(
        request: &PaymentRequest<'_>,
        salt: &SaltKey,
        api_path: &str,
    ) -> serde_json::Result<Self> {
        let payload = BASE64_STANDARD.encode(serde_json::to_vec(request)?);
        let checksum = salt.sign_request(&payload, api_path);
        Ok(Self { payload, checksum })
    }

    pub fn body(&self) -> EnvelopeBody<'_> {
        EnvelopeBody {
            request: &self.payload,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponseData {
    pub instrument_response: Option<InstrumentResponse>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentResponse {
    pub redirect_info: Option<RedirectInfo>,
}

#[derive(Debug, serde::Deserialize)]
pub struct RedirectInfo {
    pub url: String,
}

impl PayResponseData {
    pub fn redirect_url(self) -> Option<String> {
        self.instrument_response?
            .redirect_info
            .map(|info| info.url)
            .filter(|url| !url.is_empty())
    }
}

/// Fresh merchant transaction id: `MUID-<unix millis>-<random hex>`.
///
/// The processor caps the id at 38 characters.
pub fn new_transaction_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!(
        "{TRANSACTION_ID_PREFIX}-{millis}-{:012x}",
        rand::random::<u64>() & 0xffff_ffff_ffff
    )
}

/// Convert a major unit amount to minor units.
///
/// Only positive amounts with at most two decimal places are accepted.
pub fn to_minor_units(amount: Decimal) -> Option<u64> {
    if amount <= Decimal::ZERO || amount.normalize().scale() > 2 {
        return None;
    }
    // Order stores keep amounts as signed 64 bit integers
    let minor = amount.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()?;
    u64::try_from(minor).ok()
}
