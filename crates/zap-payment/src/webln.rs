//! Browser extension (WebLN) backend adapter

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::backend::PaymentBackend;
use crate::error::Error;
use crate::types::{BackendKind, PaymentProof, PaymentRequest};

/// Default time allowed for the extension to answer
const DEFAULT_WEBLN_TIMEOUT: Duration = Duration::from_secs(60);

/// Response of a WebLN `sendPayment` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebLnPayment {
    /// Payment preimage
    pub preimage: String,
}

/// WebLN provider exposed by a browser extension
#[async_trait]
pub trait WebLnProvider: Send + Sync {
    /// Ask the extension for permission; `false` if unavailable or refused
    async fn enable(&self) -> Result<bool, Error>;

    /// Pay a bolt11 invoice
    async fn send_payment(&self, invoice: &str) -> Result<WebLnPayment, Error>;
}

/// [`PaymentBackend`] paying through a [`WebLnProvider`]
pub struct WebLnBackend<P> {
    provider: P,
    timeout: Duration,
}

impl<P> WebLnBackend<P>
where
    P: WebLnProvider,
{
    /// Create new [`WebLnBackend`]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            timeout: DEFAULT_WEBLN_TIMEOUT,
        }
    }

    /// Set how long the extension may take to pay
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn pay(&self, request: &PaymentRequest) -> Result<PaymentProof, Error> {
        if !self.provider.enable().await? {
            return Err(Error::Unavailable("WebLN".to_string()));
        }

        if request.override_amount_msat.is_some() {
            tracing::debug!("WebLN: amount override ignored, extension prompts for amount");
        }

        let payment = self.provider.send_payment(&request.invoice).await?;

        if payment.preimage.is_empty() {
            return Err(Error::Rejected(
                "WebLN returned an empty preimage".to_string(),
            ));
        }

        Ok(PaymentProof::preimage(payment.preimage))
    }
}

#[async_trait]
impl<P> PaymentBackend for WebLnBackend<P>
where
    P: WebLnProvider,
{
    fn kind(&self) -> BackendKind {
        BackendKind::BrowserExtension
    }

    #[instrument(skip_all)]
    async fn attempt(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentProof, Error> {
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(self.timeout, self.pay(request)) => {
                result.unwrap_or_else(|_| Err(Error::Timeout(self.timeout)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProvider {
        enabled: bool,
        preimage: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl WebLnProvider for MockProvider {
        async fn enable(&self) -> Result<bool, Error> {
            Ok(self.enabled)
        }

        async fn send_payment(&self, _invoice: &str) -> Result<WebLnPayment, Error> {
            tokio::time::sleep(self.delay).await;
            Ok(WebLnPayment {
                preimage: self.preimage.to_string(),
            })
        }
    }

    fn backend(
        enabled: bool,
        preimage: &'static str,
        delay: Duration,
    ) -> WebLnBackend<MockProvider> {
        WebLnBackend::new(MockProvider {
            enabled,
            preimage,
            delay,
        })
    }

    #[tokio::test]
    async fn test_pays_with_preimage() {
        let proof = backend(true, "abcd", Duration::ZERO)
            .attempt(&PaymentRequest::new("lnbc1..."), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(proof.preimage_or_reference.as_deref(), Some("abcd"));
    }

    #[tokio::test]
    async fn test_disabled_extension() {
        let err = backend(false, "abcd", Duration::ZERO)
            .attempt(&PaymentRequest::new("lnbc1..."), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "WebLN not available");
    }

    #[tokio::test]
    async fn test_empty_preimage_is_a_failure() {
        let result = backend(true, "", Duration::ZERO)
            .attempt(&PaymentRequest::new("lnbc1..."), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(Error::Rejected(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_extension_times_out() {
        let result = backend(true, "abcd", Duration::from_secs(120))
            .with_timeout(Duration::from_secs(5))
            .attempt(&PaymentRequest::new("lnbc1..."), &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(Error::Timeout(d)) if d == Duration::from_secs(5)));
    }
}
