//! Payment router
//!
//! Tries an ordered list of payment backends for one payment and stops at the
//! first that succeeds. A backend failure never reaches the caller directly: it
//! is logged and recorded before the next backend is tried. A panicking backend
//! counts as a failed one. The router never retries a backend.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::backend::DynPaymentBackend;
use crate::config::RouterConfig;
use crate::error::Error;
use crate::types::{BackendFailure, BackendKind, PaymentOutcome, PaymentRequest};

/// Ordered payment backend dispatcher
///
/// Holds no state across calls, so one router can serve concurrent payments.
#[derive(Clone, Default)]
pub struct PaymentRouter {
    backends: Vec<DynPaymentBackend>,
}

impl std::fmt::Debug for PaymentRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRouter")
            .field("backends", &self.kinds())
            .finish()
    }
}

impl PaymentRouter {
    /// Create a router that tries `backends` in the given order
    pub fn new(backends: Vec<DynPaymentBackend>) -> Self {
        Self { backends }
    }

    /// Create a router using [`BackendKind::DEFAULT_ORDER`]
    ///
    /// Backends of the same kind keep their relative order.
    pub fn with_default_order(mut backends: Vec<DynPaymentBackend>) -> Self {
        backends.sort_by_key(|backend| backend.kind());
        Self { backends }
    }

    /// Create a router ordered by the configured backend kinds
    ///
    /// Backends whose kind is not listed in the config are left out.
    pub fn from_config(config: &RouterConfig, backends: Vec<DynPaymentBackend>) -> Self {
        let mut ordered = Vec::with_capacity(backends.len());

        for kind in &config.backend_order {
            let before = ordered.len();
            ordered.extend(backends.iter().filter(|b| b.kind() == *kind).cloned());
            if ordered.len() == before {
                tracing::warn!("Configured backend {} has no implementation", kind);
            }
        }

        for backend in backends.iter().filter(|b| !config.backend_order.contains(&b.kind())) {
            tracing::debug!("Backend {} not in configured order, skipping", backend.kind());
        }

        Self { backends: ordered }
    }

    /// Backend kinds in attempt order
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Pay a request, trying each backend in order
    pub async fn pay(&self, request: &PaymentRequest) -> PaymentOutcome {
        self.pay_with_cancel(request, CancellationToken::new()).await
    }

    /// Pay a request, stopping early when `cancel` fires
    ///
    /// Cancellation is forwarded to the backend currently attempting the
    /// payment. No further backend is started once cancelled.
    #[instrument(skip_all, fields(request_id = %request.request_id))]
    pub async fn pay_with_cancel(
        &self,
        request: &PaymentRequest,
        cancel: CancellationToken,
    ) -> PaymentOutcome {
        if self.backends.is_empty() {
            tracing::warn!("No payment backend configured");
            return PaymentOutcome::failed(Error::NoPaymentMethod.to_string(), vec![]);
        }

        let mut failures: Vec<BackendFailure> = Vec::new();

        for backend in &self.backends {
            let kind = backend.kind();

            if cancel.is_cancelled() {
                return PaymentOutcome::failed(Error::Cancelled.to_string(), failures);
            }

            tracing::debug!("Attempting payment with {}", kind);

            let attempt = AssertUnwindSafe(backend.attempt(request, &cancel))
                .catch_unwind()
                .await;

            let result = match attempt {
                Ok(result) => result,
                Err(panic) => {
                    let reason = format!("backend panicked: {}", panic_message(&*panic));
                    tracing::error!("Payment with {} aborted: {}", kind, reason);
                    failures.push(BackendFailure { kind, reason });
                    continue;
                }
            };

            match result {
                Ok(proof) => {
                    tracing::info!("Payment completed with {}", kind);
                    return PaymentOutcome::paid(kind, proof, failures);
                }
                Err(Error::Cancelled) => {
                    tracing::info!("Payment cancelled during {}", kind);
                    failures.push(BackendFailure {
                        kind,
                        reason: Error::Cancelled.to_string(),
                    });
                    return PaymentOutcome::failed(Error::Cancelled.to_string(), failures);
                }
                Err(err) => {
                    tracing::warn!("Payment with {} failed: {}", kind, err);
                    failures.push(BackendFailure {
                        kind,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let reason = failures
            .iter()
            .map(|failure| failure.to_string())
            .collect::<Vec<_>>()
            .join("; ");

        PaymentOutcome::failed(reason, failures)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
