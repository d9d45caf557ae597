//! Error for NWC backend

use std::time::Duration;

use thiserror::Error;

/// NWC Error
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid connection URI
    #[error("Invalid NWC URI: {0}")]
    InvalidUri(String),
    /// Invalid settings
    #[error("Invalid NWC configuration: {0}")]
    Configuration(String),
    /// Connection has no relays to publish to
    #[error("NWC connection has no relays")]
    NoRelays,
    /// Relay connection or protocol error
    #[error("Relay {relay}: {message}")]
    Relay {
        /// Relay address
        relay: String,
        /// What went wrong
        message: String,
    },
    /// No relay accepted the request
    #[error("No relay accepted the payment request ({0})")]
    PublishFailed(String),
    /// Signing or encryption failed
    #[error("Crypto error: {0}")]
    Crypto(String),
    /// Response could not be decrypted or decoded
    #[error("Malformed wallet response: {0}")]
    MalformedResponse(String),
    /// Wallet answered with an error
    #[error("Wallet error {code}: {message}")]
    Wallet {
        /// NIP-47 error code
        code: String,
        /// Error message from the wallet
        message: String,
    },
    /// No decisive response before the deadline
    #[error("No wallet response after {timeout:?}{}", malformed_suffix(.last_malformed))]
    Timeout {
        /// Deadline that expired
        timeout: Duration,
        /// Last undecodable candidate seen while waiting
        last_malformed: Option<String>,
    },
    /// All subscriptions ended before a response arrived
    #[error("Subscriptions closed before the wallet responded")]
    SubscriptionsClosed,
    /// Attempt was cancelled
    #[error("Cancelled")]
    Cancelled,
    /// Serde Error
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

fn malformed_suffix(last_malformed: &Option<String>) -> String {
    last_malformed
        .as_ref()
        .map(|m| format!(" (last malformed response: {m})"))
        .unwrap_or_default()
}

impl Error {
    /// Relay error helper
    pub fn relay(relay: impl Into<String>, message: impl ToString) -> Self {
        Self::Relay {
            relay: relay.into(),
            message: message.to_string(),
        }
    }
}

impl From<Error> for zap_payment::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::NoRelays | Error::InvalidUri(_) | Error::Configuration(_) => {
                Self::Configuration(e.to_string())
            }
            Error::Timeout {
                timeout,
                last_malformed: None,
            } => Self::Timeout(timeout),
            Error::Cancelled => Self::Cancelled,
            Error::Wallet { .. } => Self::Rejected(e.to_string()),
            other => Self::Backend(Box::new(other)),
        }
    }
}
