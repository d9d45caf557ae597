//! Zap NWC Backend
//!
//! Pays invoices through a remote wallet reachable over Nostr Wallet Connect
//! (NIP-47). The request is published to every relay of the connection at
//! once and the wallet's answer is correlated back to it on whichever relay
//! delivers it first.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use nostr::nips::nip47::{PayInvoiceRequest, Request};
use nostr::{Event, EventBuilder, Kind, Tag};
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use zap_payment::{self as payment, BackendKind, PaymentBackend, PaymentProof, PaymentRequest};

pub mod config;
pub mod correlator;
pub mod crypto;
pub mod error;
pub mod relay;
pub mod scope;

#[cfg(test)]
mod test_utils;

pub use config::{NwcConfig, NwcSettings};
pub use correlator::{PendingCorrelation, ResponseCorrelator};
pub use crypto::WalletCrypto;
pub use error::Error;
pub use relay::{EventSink, IncomingEvent, RelayConnection, RelayConnector, SubscriptionId};
pub use scope::ConnectionScope;

/// NWC Wallet Backend
#[derive(Clone)]
pub struct NwcWallet {
    /// Connection and deadlines
    config: NwcConfig,
    /// Opens relay connections
    connector: Arc<dyn RelayConnector>,
    /// Signs and encrypts for the connection secret
    crypto: Arc<dyn WalletCrypto>,
}

impl std::fmt::Debug for NwcWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NwcWallet")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NwcWallet {
    /// Create new [`NwcWallet`]
    pub fn new(
        config: NwcConfig,
        connector: Arc<dyn RelayConnector>,
        crypto: Arc<dyn WalletCrypto>,
    ) -> Self {
        Self {
            config,
            connector,
            crypto,
        }
    }

    /// Wallet configuration
    pub fn config(&self) -> &NwcConfig {
        &self.config
    }

    /// Pay an invoice through the remote wallet
    ///
    /// Every relay connection opened here is closed before this returns,
    /// whatever the outcome.
    #[instrument(skip_all, fields(request_id = %request.request_id))]
    pub async fn pay_invoice(
        &self,
        request: &PaymentRequest,
        cancel: &CancellationToken,
    ) -> Result<PaymentProof, Error> {
        let uri = &self.config.uri;
        if uri.relays.is_empty() {
            return Err(Error::NoRelays);
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let event = self.build_request_event(request).await?;
        tracing::debug!("NWC: Sending request {} as event {}", request.request_id, event.id);

        let (correlator, pending) = ResponseCorrelator::new(
            event.id,
            uri.public_key,
            self.crypto.clone(),
            self.config.response_timeout,
        );
        let scope = ConnectionScope::new();

        let result = self
            .publish_and_wait(&event, &correlator, pending, &scope, cancel)
            .await;

        correlator.teardown().await;
        scope.close_all().await;

        result
    }

    async fn build_request_event(&self, request: &PaymentRequest) -> Result<Event, Error> {
        let wallet_pubkey = self.config.uri.public_key;

        let mut params = PayInvoiceRequest::new(request.invoice.clone());
        params.amount = request.override_amount_msat;
        let command = Request::pay_invoice(params);

        let content = self
            .crypto
            .encrypt(&wallet_pubkey, &serde_json::to_string(&command)?)
            .await?;

        let unsigned = EventBuilder::new(Kind::WalletConnectRequest, content)
            .tag(Tag::public_key(wallet_pubkey))
            .build(self.crypto.public_key());

        self.crypto.sign(unsigned).await
    }

    /// Race the publications, then wait for the wallet's answer
    ///
    /// A decisive answer counts even while no relay has acknowledged yet: the
    /// wallet can only answer a request it received.
    async fn publish_and_wait(
        &self,
        event: &Event,
        correlator: &ResponseCorrelator,
        pending: PendingCorrelation,
        scope: &ConnectionScope,
        cancel: &CancellationToken,
    ) -> Result<PaymentProof, Error> {
        let relays: Vec<String> = self
            .config
            .uri
            .relays
            .iter()
            .map(|relay| relay.to_string())
            .collect();

        let mut publications: FuturesUnordered<_> = relays
            .iter()
            .map(|relay| async move {
                let result = self.publish_to(relay, event, correlator, scope).await;
                (relay.as_str(), result)
            })
            .collect();

        let response = pending.wait();
        tokio::pin!(response);

        let mut failures = Vec::new();

        let accepted_by = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("NWC: Payment cancelled while publishing");
                    return Err(Error::Cancelled);
                }
                result = &mut response => {
                    tracing::info!("NWC: Request {} resolved while publishing", event.id);
                    return result;
                }
                next = publications.next() => match next {
                    Some((relay, Ok(()))) => break relay,
                    Some((relay, Err(err))) => {
                        tracing::warn!("NWC: Publish to {} failed: {}", relay, err);
                        failures.push(err.to_string());
                    }
                    None => {
                        tracing::error!("NWC: No relay accepted request {}", event.id);
                        return Err(Error::PublishFailed(failures.join("; ")));
                    }
                },
            }
        };

        tracing::info!("NWC: Request {} accepted by {}", event.id, accepted_by);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("NWC: Payment cancelled while waiting for the wallet");
                    return Err(Error::Cancelled);
                }
                result = &mut response => return result,
                Some((relay, result)) = publications.next(), if !publications.is_empty() => {
                    match result {
                        Ok(()) => tracing::debug!("NWC: {} also accepted the request", relay),
                        Err(err) => {
                            tracing::debug!("NWC: Late publish to {} failed: {}", relay, err)
                        }
                    }
                }
            }
        }
    }

    /// Connect, subscribe for the answer, then publish on one relay
    async fn publish_to(
        &self,
        relay: &str,
        event: &Event,
        correlator: &ResponseCorrelator,
        scope: &ConnectionScope,
    ) -> Result<(), Error> {
        let publish = async {
            let connection = self.connector.connect(relay).await?;
            scope.register(connection.clone());

            if let Err(err) = correlator.listen_on(relay, connection.clone()).await {
                tracing::warn!("NWC: Could not subscribe on {}: {}", relay, err);
            }

            connection.publish(event).await
        };

        tokio::time::timeout(self.config.publish_timeout, publish)
            .await
            .map_err(|_| {
                Error::relay(
                    relay,
                    format!("no acknowledgement after {:?}", self.config.publish_timeout),
                )
            })?
    }
}

#[async_trait]
impl PaymentBackend for NwcWallet {
    fn kind(&self) -> BackendKind {
        BackendKind::RemoteWalletRelay
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
