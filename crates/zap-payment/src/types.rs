//! Payment request and outcome types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// An outbound intent to pay an invoice
///
/// Created once per payment by the caller and never mutated afterwards. The
/// `request_id` is generated here and is what asynchronous confirmations get
/// correlated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Encoded payment instruction (bolt11)
    pub invoice: String,
    /// Unique id of this payment request
    pub request_id: String,
    /// Amount to pay in millisatoshis when the invoice carries none
    pub override_amount_msat: Option<u64>,
}

impl PaymentRequest {
    /// Create a new [`PaymentRequest`] with a fresh request id
    pub fn new(invoice: impl Into<String>) -> Self {
        Self {
            invoice: invoice.into(),
            request_id: Uuid::new_v4().simple().to_string(),
            override_amount_msat: None,
        }
    }

    /// Create a new [`PaymentRequest`] for an amount-less invoice
    pub fn with_amount(invoice: impl Into<String>, amount_msat: u64) -> Self {
        Self {
            override_amount_msat: Some(amount_msat),
            ..Self::new(invoice)
        }
    }
}

/// Backend variant able to execute a payment
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Wallet SDK running alongside the client
    LocalSdk,
    /// WebLN browser extension
    BrowserExtension,
    /// Remote wallet reached through relays (NWC)
    RemoteWalletRelay,
}

impl BackendKind {
    /// Default attempt order, lowest latency and most trusted first
    pub const DEFAULT_ORDER: [BackendKind; 3] = [
        BackendKind::LocalSdk,
        BackendKind::BrowserExtension,
        BackendKind::RemoteWalletRelay,
    ];

    /// Kebab-case name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::LocalSdk => "local-sdk",
            BackendKind::BrowserExtension => "browser-extension",
            BackendKind::RemoteWalletRelay => "remote-wallet-relay",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local-sdk" | "breez" => Ok(BackendKind::LocalSdk),
            "browser-extension" | "webln" => Ok(BackendKind::BrowserExtension),
            "remote-wallet-relay" | "nwc" => Ok(BackendKind::RemoteWalletRelay),
            other => Err(Error::Configuration(format!(
                "unknown backend kind: {other}"
            ))),
        }
    }
}

/// Proof returned by a backend that paid the invoice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    /// Payment preimage, or a backend reference when no preimage is exposed
    pub preimage_or_reference: Option<String>,
    /// Fees paid in millisatoshis, if the backend reports them
    pub fees_paid_msat: Option<u64>,
}

impl PaymentProof {
    /// Proof carrying a preimage
    pub fn preimage(preimage: impl Into<String>) -> Self {
        Self {
            preimage_or_reference: Some(preimage.into()),
            fees_paid_msat: None,
        }
    }
}

/// A backend that was tried and failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    /// Backend that failed
    pub kind: BackendKind,
    /// Human readable reason
    pub reason: String,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

/// Result of a payment reported back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// Whether any backend paid the invoice
    pub success: bool,
    /// Backend that paid
    pub backend_used: Option<BackendKind>,
    /// Preimage or backend reference of the payment
    pub preimage_or_reference: Option<String>,
    /// Aggregated reason when no backend succeeded
    pub failure_reason: Option<String>,
    /// Every backend that failed before the outcome was reached, in attempt order
    #[serde(default)]
    pub failures: Vec<BackendFailure>,
}

impl PaymentOutcome {
    /// Successful outcome
    pub fn paid(kind: BackendKind, proof: PaymentProof, failures: Vec<BackendFailure>) -> Self {
        Self {
            success: true,
            backend_used: Some(kind),
            preimage_or_reference: proof.preimage_or_reference,
            failure_reason: None,
            failures,
        }
    }

    /// Failed outcome
    pub fn failed(reason: impl Into<String>, failures: Vec<BackendFailure>) -> Self {
        Self {
            success: false,
            backend_used: None,
            preimage_or_reference: None,
            failure_reason: Some(reason.into()),
            failures,
        }
    }
}
