//! Zap Spark Backend
//!
//! Pays invoices with the Breez SDK through its Spark HTTP bridge.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::time::Duration;

use api::types::{PayInvoiceRequest, Payment, PaymentStatus};
use api::SparkApi;
use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use zap_payment::{self as payment, BackendKind, PaymentBackend, PaymentProof, PaymentRequest};

pub mod api;
pub mod config;
pub mod error;

pub use config::SparkConfig;
pub use error::Error;

/// Spark Wallet Backend
#[derive(Debug, Clone)]
pub struct SparkWallet {
    /// Bridge client
    api: SparkApi,
    /// How long a payment may stay pending
    payment_timeout: Duration,
    /// Delay between status checks
    poll_interval: Duration,
}

impl SparkWallet {
    /// Create new [`SparkWallet`]
    pub fn new(config: SparkConfig) -> Result<Self, Error> {
        if config.api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        let api = SparkApi::new(
            &config.api_key,
            config.api_url.as_deref(),
            config.request_timeout_ms,
        )?;

        Ok(Self {
            api,
            payment_timeout: config.payment_timeout(),
            poll_interval: config.poll_interval(),
        })
    }

    /// Set how long a payment may stay pending
    pub fn with_payment_timeout(mut self, timeout: Duration) -> Self {
        self.payment_timeout = timeout;
        self
    }

    /// Set the delay between status checks
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bridge client
    pub fn api(&self) -> &SparkApi {
        &self.api
    }

    /// Pay an invoice and wait for it to settle
    ///
    /// The proof carries the Spark payment id as reference.
    #[instrument(skip_all, fields(request_id = %request.request_id))]
    pub async fn pay_invoice(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentProof, Error> {
        if request.invoice.trim().is_empty() {
            return Err(Error::EmptyInvoice);
        }

        let pay_request = PayInvoiceRequest {
            bolt11: request.invoice.clone(),
            amount_msat: request.override_amount_msat,
            timeout_secs: Some(self.payment_timeout.as_secs().max(1)),
        };

        let deadline = Instant::now() + self.payment_timeout;

        let payment = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            payment = self.api.pay_invoice(&pay_request) => payment?,
        };

        tracing::debug!("Spark: Submitted payment {}", payment.id);

        self.wait_for_settlement(payment, deadline, cancel).await
    }

    async fn wait_for_settlement(
        &self,
        mut payment: Payment,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<PaymentProof, Error> {
        loop {
            match payment.status {
                PaymentStatus::Completed => {
                    tracing::info!("Spark: Payment {} completed", payment.id);
                    return Ok(PaymentProof {
                        preimage_or_reference: Some(payment.id),
                        fees_paid_msat: payment.fee_msat,
                    });
                }
                PaymentStatus::Failed => {
                    tracing::warn!("Spark: Payment {} failed", payment.id);
                    return Err(Error::PaymentFailed(payment.id));
                }
                PaymentStatus::Pending => {
                    tracing::debug!("Spark: Payment {} pending", payment.id);
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(
                        "Spark: Stopped watching payment {} while still pending",
                        payment.id
                    );
                    return Err(Error::Cancelled);
                }
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(Error::PaymentTimeout {
                        id: payment.id,
                        timeout: self.payment_timeout,
                    });
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            payment = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                status = self.api.payment_status(&payment.id) => status?,
            };
        }
    }
}

#[async_trait]
impl PaymentBackend for SparkWallet {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalSdk
    }

    #[instrument(skip_all)]
    async fn attempt(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentProof, payment::Error> {
        Ok(self.pay_invoice(request, cancel).await?)
    }
}
