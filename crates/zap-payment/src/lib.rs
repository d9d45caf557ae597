//! Zap payment dispatch
//!
//! Shared types for the zap payment backends and the router that tries them in
//! order until one of them pays the invoice.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod backend;
pub mod config;
pub mod error;
pub mod router;
pub mod types;
pub mod webln;

pub use backend::{DynPaymentBackend, PaymentBackend};
pub use config::RouterConfig;
pub use error::Error;
pub use router::PaymentRouter;
pub use types::{BackendFailure, BackendKind, PaymentOutcome, PaymentProof, PaymentRequest};
pub use webln::{WebLnBackend, WebLnPayment, WebLnProvider};
