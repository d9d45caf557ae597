//! NWC configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use nostr::nips::nip47::NostrWalletConnectURI;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Connection string environment variable
pub const ENV_NWC_URI: &str = "ZAP_NWC_URI";
/// Publish timeout environment variable, in seconds
pub const ENV_NWC_PUBLISH_TIMEOUT_SECS: &str = "ZAP_NWC_PUBLISH_TIMEOUT_SECS";
/// Response timeout environment variable, in seconds
pub const ENV_NWC_RESPONSE_TIMEOUT_SECS: &str = "ZAP_NWC_RESPONSE_TIMEOUT_SECS";

/// NWC settings as read from a config file or the environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NwcSettings {
    /// `nostr+walletconnect://` connection string
    #[serde(default)]
    pub uri: String,
    /// Seconds a relay has to accept the request
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,
    /// Seconds the wallet has to answer
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
}

fn default_publish_timeout_secs() -> u64 {
    10
}

fn default_response_timeout_secs() -> u64 {
    60
}

impl NwcSettings {
    /// Override settings from the environment
    pub fn from_env(mut self) -> Self {
        if let Ok(uri) = env::var(ENV_NWC_URI) {
            self.uri = uri;
        }

        if let Ok(secs_str) = env::var(ENV_NWC_PUBLISH_TIMEOUT_SECS) {
            if let Ok(secs) = secs_str.parse() {
                self.publish_timeout_secs = secs;
            }
        }

        if let Ok(secs_str) = env::var(ENV_NWC_RESPONSE_TIMEOUT_SECS) {
            if let Ok(secs) = secs_str.parse() {
                self.response_timeout_secs = secs;
            }
        }

        self
    }
}

/// Validated configuration of an [`NwcWallet`](crate::NwcWallet)
#[derive(Clone)]
pub struct NwcConfig {
    /// Wallet connection
    pub uri: NostrWalletConnectURI,
    /// Deadline for a relay to accept the request
    pub publish_timeout: Duration,
    /// Deadline for the wallet's answer, counted from the start of the attempt
    pub response_timeout: Duration,
}

impl std::fmt::Debug for NwcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NwcConfig")
            .field("wallet", &self.uri.public_key.to_hex())
            .field("relays", &self.uri.relays)
            .field("publish_timeout", &self.publish_timeout)
            .field("response_timeout", &self.response_timeout)
            .finish_non_exhaustive()
    }
}

impl NwcConfig {
    /// Config with default timeouts
    pub fn new(uri: NostrWalletConnectURI) -> Self {
        Self {
            uri,
            publish_timeout: Duration::from_secs(default_publish_timeout_secs()),
            response_timeout: Duration::from_secs(default_response_timeout_secs()),
        }
    }

    /// Set the publish deadline
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Set the response deadline
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }
}

impl TryFrom<NwcSettings> for NwcConfig {
    type Error = Error;

    fn try_from(settings: NwcSettings) -> Result<Self, Self::Error> {
        if settings.publish_timeout_secs == 0 || settings.response_timeout_secs == 0 {
            return Err(Error::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            uri: NostrWalletConnectURI::from_str(&settings.uri)
                .map_err(|e| Error::InvalidUri(e.to_string()))?,
            publish_timeout: Duration::from_secs(settings.publish_timeout_secs),
            response_timeout: Duration::from_secs(settings.response_timeout_secs),
        })
    }
}
