//! Breez Spark API client
//!
//! Thin client for the Spark HTTP bridge of the Breez SDK.
//!
//! # Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/pay_invoice` | Pay a BOLT11 invoice |
//! | POST | `/payment_status` | Get a payment by id |
//!
//! **Payment States:** `pending`, `completed`, `failed`
//!
//! # Authentication
//!
//! Every request carries the Breez API key in the `x-api-key` header.

pub mod error;
pub mod types;

use std::time::Duration;

use error::{Error, SparkApiError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use types::*;
use url::Url;

/// Default Spark bridge
pub const DEFAULT_API_URL: &str = "https://sdk.breez.technology/spark/";

/// Spark API client
#[derive(Clone)]
pub struct SparkApi {
    api_key: String,
    base_url: Url,
    client: Client,
}

impl std::fmt::Debug for SparkApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparkApi")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SparkApi {
    /// Create a new Spark API client
    pub fn new(api_key: &str, api_url: Option<&str>, timeout_ms: u64) -> anyhow::Result<Self> {
        let base_url = api_url.unwrap_or(DEFAULT_API_URL);

        // Endpoints are joined relative to the base path
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{base_url}/"))?
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url,
            client,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make a POST request
    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, Error> {
        let url = self.base_url.join(path)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response
    async fn handle_response<R: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<R, Error> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(serde_json::from_str(&text)?)
        } else {
            warn!("Spark API error: {} - {}", status, text);
            Err(Error::Api(SparkApiError::from_response(
                status.as_u16(),
                &text,
            )))
        }
    }

    /// Pay a BOLT11 invoice
    pub async fn pay_invoice(&self, request: &PayInvoiceRequest) -> Result<Payment, Error> {
        self.post("pay_invoice", request).await
    }

    /// Get a payment by id
    pub async fn payment_status(&self, id: &str) -> Result<Payment, Error> {
        let request = PaymentStatusRequest { id: id.to_string() };
        self.post("payment_status", &request).await
    }
}
