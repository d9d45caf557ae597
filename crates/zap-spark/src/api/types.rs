//! Spark API request and response types

use serde::{Deserialize, Serialize};

/// Payment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Submitted, not settled yet
    Pending,
    /// Settled
    Completed,
    /// Failed
    Failed,
}

/// Payment direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentDirection {
    /// Received
    Incoming,
    /// Sent
    #[default]
    Outgoing,
}

/// Request body of `/pay_invoice`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayInvoiceRequest {
    /// BOLT11 invoice
    pub bolt11: String,
    /// Amount for invoices without one, in msat
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_msat: Option<u64>,
    /// How long the bridge may try to pay, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Request body of `/payment_status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusRequest {
    /// Payment id
    pub id: String,
}

/// Payment record returned by the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment id
    pub id: String,
    /// BOLT11 invoice
    #[serde(default)]
    pub bolt11: Option<String>,
    /// Amount in msat
    pub amount_msat: u64,
    /// Fee paid in msat
    #[serde(default)]
    pub fee_msat: Option<u64>,
    /// State
    pub status: PaymentStatus,
    /// Creation time (RFC 3339)
    pub created_at: String,
    /// Settlement time (RFC 3339)
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Invoice description
    #[serde(default)]
    pub description: Option<String>,
    /// Direction, `/pay_invoice` leaves it out
    #[serde(default)]
    pub direction: PaymentDirection,
}
