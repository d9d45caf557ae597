//! Spark configuration

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// API key environment variable
pub const ENV_BREEZ_API_KEY: &str = "BREEZ_API_KEY";
/// Bridge URL environment variable
pub const ENV_SPARK_API_URL: &str = "ZAP_SPARK_API_URL";
/// Request timeout environment variable, in milliseconds
pub const ENV_SPARK_REQUEST_TIMEOUT_MS: &str = "ZAP_SPARK_REQUEST_TIMEOUT_MS";
/// Payment timeout environment variable, in seconds
pub const ENV_SPARK_PAYMENT_TIMEOUT_SECS: &str = "ZAP_SPARK_PAYMENT_TIMEOUT_SECS";
/// Poll interval environment variable, in milliseconds
pub const ENV_SPARK_POLL_INTERVAL_MS: &str = "ZAP_SPARK_POLL_INTERVAL_MS";

/// Spark backend configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparkConfig {
    /// Breez API key
    #[serde(default)]
    pub api_key: String,
    /// Bridge URL, the public Breez bridge when unset
    #[serde(default)]
    pub api_url: Option<String>,
    /// HTTP request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How long a payment may stay pending, in seconds
    #[serde(default = "default_payment_timeout_secs")]
    pub payment_timeout_secs: u64,
    /// Delay between status checks in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_payment_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            payment_timeout_secs: default_payment_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl std::fmt::Debug for SparkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparkConfig")
            .field("api_key", &"[redacted]")
            .field("api_url", &self.api_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("payment_timeout_secs", &self.payment_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

impl SparkConfig {
    /// Config with the given API key and default timings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Override settings from the environment
    pub fn from_env(mut self) -> Self {
        if let Ok(api_key) = env::var(ENV_BREEZ_API_KEY) {
            self.api_key = api_key;
        }

        if let Ok(api_url) = env::var(ENV_SPARK_API_URL) {
            self.api_url = Some(api_url);
        }

        if let Ok(timeout_str) = env::var(ENV_SPARK_REQUEST_TIMEOUT_MS) {
            if let Ok(timeout) = timeout_str.parse() {
                self.request_timeout_ms = timeout;
            }
        }

        if let Ok(timeout_str) = env::var(ENV_SPARK_PAYMENT_TIMEOUT_SECS) {
            if let Ok(timeout) = timeout_str.parse() {
                self.payment_timeout_secs = timeout;
            }
        }

        if let Ok(interval_str) = env::var(ENV_SPARK_POLL_INTERVAL_MS) {
            if let Ok(interval) = interval_str.parse() {
                self.poll_interval_ms = interval;
            }
        }

        self
    }

    /// Payment timeout
    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment_timeout_secs)
    }

    /// Poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
