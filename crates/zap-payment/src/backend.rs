//! Payment backend abstraction
//!
//! This module defines the trait that payment backends must implement to be
//! tried by the [`PaymentRouter`](crate::router::PaymentRouter).

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::types::{BackendKind, PaymentProof, PaymentRequest};

/// Payment backend trait
///
/// # Example Implementation
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use zap_payment::{BackendKind, Error, PaymentBackend, PaymentProof, PaymentRequest};
///
/// struct MyWallet {
///     // ... fields
/// }
///
/// #[async_trait]
/// impl PaymentBackend for MyWallet {
///     fn kind(&self) -> BackendKind {
///         BackendKind::LocalSdk
///     }
///
///     async fn attempt(
///         &self,
///         request: &PaymentRequest,
///         cancel: &CancellationToken,
///     ) -> Result<PaymentProof, Error> {
///         let preimage = self.send(&request.invoice).await?;
///         Ok(PaymentProof::preimage(preimage))
///     }
/// }
/// ```
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    /// Variant of this backend
    fn kind(&self) -> BackendKind;

    /// Try to pay the request
    ///
    /// # Errors
    ///
    /// Returns an error if the payment was not made. Implementations own their
    /// timeouts: an attempt that neither confirms nor fails within its deadline
    /// must return [`Error::Timeout`]. When `cancel` fires the attempt must
    /// release everything it holds and return [`Error::Cancelled`].
    async fn attempt(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentProof, Error>;
}

/// Shared payment backend
pub type DynPaymentBackend = Arc<dyn PaymentBackend>;
