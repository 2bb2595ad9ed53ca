//! `X-VERIFY` checksum used by PhonePe on both directions of the protocol
//!
//! The checksum is `hex(sha256(<signed string>)) + "###" + <salt index>`, where the signed string is
//! - outbound pay request: `base64 payload + api path + salt key`
//! - inbound callback: `base64 response + salt key`
//!
//! The callback formula has no path segment. This is how the processor signs notifications.
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum_extra::headers::{self, HeaderMapExt};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const X_VERIFY: HeaderName = HeaderName::from_static("x-verify");

const SALT_SEPARATOR: &str = "###";

/// Shared secret together with the index identifying its version
#[derive(Clone)]
pub struct SaltKey {
    key: String,
    index: u32,
}

impl std::fmt::Debug for SaltKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaltKey")
            .field("key", &"[REDACTED]")
            .field("index", &self.index)
            .finish()
    }
}

impl SaltKey {
    pub fn new(key: impl Into<String>, index: u32) -> Self {
        Self {
            key: key.into(),
            index,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Checksum of an outbound request posted to `api_path`
    pub fn sign_request(&self, base64_payload: &str, api_path: &str) -> String {
        self.checksum(&[base64_payload, api_path])
    }

    /// Checksum the processor attaches to a callback carrying `base64_response`
    pub fn sign_callback(&self, base64_response: &str) -> String {
        self.checksum(&[base64_response])
    }

    fn checksum(&self, parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
        }
        hasher.update(self.key.as_bytes());
        format!(
            "{}{SALT_SEPARATOR}{}",
            hex::encode(hasher.finalize()),
            self.index
        )
    }
}

/// Full-string comparison that does not short-circuit on the first differing byte
pub fn checksums_match(expected: &str, received: &str) -> bool {
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

pub fn signed_headers(checksum: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(
        X_VERIFY,
        HeaderValue::from_str(checksum).expect("checksum is ascii"),
    );
    map.typed_insert(headers::ContentType::json());
    map
}
