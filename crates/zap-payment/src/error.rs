//! Errors for payment backends and the router

use std::time::Duration;

use thiserror::Error;

/// Payment error
///
/// Every backend converts its own error type into this one, so the router can
/// record a failure reason without knowing which backend produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// No backend configured
    #[error("no payment method available")]
    NoPaymentMethod,
    /// Backend configured with unusable settings
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Backend cannot be used right now
    #[error("{0} not available")]
    Unavailable(String),
    /// Backend explicitly refused or failed the payment
    #[error("{0}")]
    Rejected(String),
    /// Backend did not finish within its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// Payment was cancelled by the caller
    #[error("payment cancelled")]
    Cancelled,
    /// Backend specific error
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
    /// Serde error
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// Custom error
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Configuration errors fail fast and are never worth retrying
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::NoPaymentMethod | Error::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::NoPaymentMethod.to_string(),
            "no payment method available"
        );
        assert_eq!(
            Error::Unavailable("WebLN".to_string()).to_string(),
            "WebLN not available"
        );
        assert_eq!(
            Error::Timeout(Duration::from_secs(5)).to_string(),
            "Timed out after 5s"
        );
    }

    #[test]
    fn test_is_configuration() {
        assert!(Error::NoPaymentMethod.is_configuration());
        assert!(Error::Configuration("no relays".to_string()).is_configuration());
        assert!(!Error::Cancelled.is_configuration());
    }
}
