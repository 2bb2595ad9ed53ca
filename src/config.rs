use std::time::Duration;

use url::Url;

use crate::gateway::sign::SaltKey;

const DEFAULT_API_BASE_URL: &str = "https://api.phonepe.com";
const DEFAULT_PAY_PATH: &str = "/pg/v1/pay";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 3000;

/// Route the processor is told to notify after payment
pub const CALLBACK_PATH: &str = "/payment-callback";

/// Deployment configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub merchant_id: String,
    pub salt: SaltKey,
    /// Externally reachable base URL of this service
    pub public_hostname: Url,
    pub api_base_url: Url,
    /// Path of the pay endpoint. Also part of the signed string.
    pub pay_path: String,
    pub timeout: Duration,
    pub port: u16,
    /// `sqlite://` url of the order database. In-memory order store when absent.
    pub database_url: Option<String>,
    /// CORS origins. Any origin when absent.
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid number in {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("invalid URL in {key}: {value}")]
    InvalidUrl { key: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::MissingRequired(key));

        let merchant_id = required("PHONEPE_MERCHANT_ID")?;
        let salt_key = required("PHONEPE_SALT_KEY")?;
        let salt_index = parse_number("PHONEPE_SALT_INDEX", &required("PHONEPE_SALT_INDEX")?)?;
        let public_hostname = parse_url("PUBLIC_HOSTNAME", &required("PUBLIC_HOSTNAME")?)?;

        let api_base_url = parse_url(
            "PHONEPE_API_BASE_URL",
            &get("PHONEPE_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        )?;

        let mut pay_path = get("PHONEPE_PAY_PATH").unwrap_or_else(|| DEFAULT_PAY_PATH.to_string());
        if !pay_path.starts_with('/') {
            pay_path.insert(0, '/');
        }

        let timeout = match get("PHONEPE_TIMEOUT_SECS") {
            Some(v) => match parse_number("PHONEPE_TIMEOUT_SECS", &v)? {
                0 => {
                    return Err(ConfigError::InvalidNumber {
                        key: "PHONEPE_TIMEOUT_SECS",
                        value: v,
                    });
                }
                secs => Duration::from_secs(secs),
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let port = match get("PORT") {
            Some(v) => parse_number("PORT", &v)?,
            None => DEFAULT_PORT,
        };

        let allowed_origins = get("ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Ok(Self {
            merchant_id,
            salt: SaltKey::new(salt_key, salt_index),
            public_hostname,
            api_base_url,
            pay_path,
            timeout,
            port,
            database_url: get("DATABASE_URL"),
            allowed_origins,
        })
    }

    /// Notification endpoint registered with the processor for every payment
    pub fn callback_url(&self) -> String {
        join_url(&self.public_hostname, CALLBACK_PATH)
    }

    pub fn pay_url(&self) -> String {
        join_url(&self.api_base_url, &self.pay_path)
    }
}

fn join_url(base: &Url, path: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path)
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(ConfigError::InvalidUrl {
            key,
            value: value.to_string(),
        }),
    }
}
