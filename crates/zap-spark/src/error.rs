//! Error for Spark backend

use std::time::Duration;

use thiserror::Error;

use crate::api::error::Error as SparkApiError;

/// Spark Error
#[derive(Debug, Error)]
pub enum Error {
    /// API key not configured
    #[error("BREEZ_API_KEY missing in environment")]
    MissingApiKey,
    /// Empty invoice
    #[error("bolt11 is required")]
    EmptyInvoice,
    /// Bridge reported the payment as failed
    #[error("Spark payment {0} failed")]
    PaymentFailed(String),
    /// Payment still pending at the deadline
    #[error("Spark payment {id} still pending after {timeout:?}")]
    PaymentTimeout {
        /// Payment id
        id: String,
        /// Deadline that expired
        timeout: Duration,
    },
    /// Attempt was cancelled
    #[error("Cancelled")]
    Cancelled,
    /// Spark API error
    #[error(transparent)]
    SparkApi(#[from] SparkApiError),
    /// Anyhow error
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<Error> for zap_payment::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::MissingApiKey => Self::Configuration(e.to_string()),
            Error::EmptyInvoice | Error::PaymentFailed(_) => Self::Rejected(e.to_string()),
            Error::Cancelled => Self::Cancelled,
            other => Self::Backend(Box::new(other)),
        }
    }
}
