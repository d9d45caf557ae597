//! Response correlator
//!
//! Matches the wallet's asynchronous answer, delivered on any of the relays the
//! request was sent to, back to the request that produced it. Subscriptions
//! from every relay feed a single channel; the first decisive response wins.

use std::sync::Arc;
use std::time::Duration;

use nostr::nips::nip47::{ErrorCode, Method, Response};
use nostr::{EventId, Filter, Kind, PublicKey};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use zap_payment::PaymentProof;

use crate::crypto::WalletCrypto;
use crate::error::Error;
use crate::relay::{EventSink, IncomingEvent, RelayConnection, SubscriptionId};

struct ActiveSubscription {
    relay: String,
    connection: Arc<dyn RelayConnection>,
    id: SubscriptionId,
}

#[derive(Default)]
struct Subscriptions {
    active: Vec<ActiveSubscription>,
    torn_down: bool,
}

/// Subscribes relays for the response to one request
pub struct ResponseCorrelator {
    filter: Filter,
    sink: EventSink,
    subscriptions: Mutex<Subscriptions>,
}

/// Open wait for the response to one request
///
/// [`PendingCorrelation::wait`] consumes the wait, so a request resolves at
/// most once.
pub struct PendingCorrelation {
    request_id: EventId,
    wallet_pubkey: PublicKey,
    crypto: Arc<dyn WalletCrypto>,
    receiver: mpsc::UnboundedReceiver<IncomingEvent>,
    timeout: Duration,
    deadline: Instant,
}

impl ResponseCorrelator {
    /// Start correlating responses to the request event `request_id`
    ///
    /// The deadline of the returned [`PendingCorrelation`] starts now, so
    /// responses that arrive while the request is still being published are
    /// kept.
    pub fn new(
        request_id: EventId,
        wallet_pubkey: PublicKey,
        crypto: Arc<dyn WalletCrypto>,
        timeout: Duration,
    ) -> (Self, PendingCorrelation) {
        let (sink, receiver) = mpsc::unbounded_channel();

        let filter = Filter::new()
            .kind(Kind::WalletConnectResponse)
            .author(wallet_pubkey)
            .event(request_id);

        let correlator = Self {
            filter,
            sink,
            subscriptions: Mutex::new(Subscriptions::default()),
        };

        let pending = PendingCorrelation {
            request_id,
            wallet_pubkey,
            crypto,
            receiver,
            timeout,
            deadline: Instant::now() + timeout,
        };

        (correlator, pending)
    }

    /// Filter used on every relay
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Number of live subscriptions
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.lock().active.len()
    }

    /// Listen for the response on `connection`
    pub async fn listen_on(
        &self,
        relay: &str,
        connection: Arc<dyn RelayConnection>,
    ) -> Result<(), Error> {
        let id = connection
            .subscribe(self.filter.clone(), self.sink.clone())
            .await?;

        let late = {
            let mut subscriptions = self.subscriptions.lock();
            if subscriptions.torn_down {
                true
            } else {
                subscriptions.active.push(ActiveSubscription {
                    relay: relay.to_string(),
                    connection: connection.clone(),
                    id: id.clone(),
                });
                false
            }
        };

        if late {
            tracing::debug!("NWC: Subscription on {} opened after teardown", relay);
            if let Err(err) = connection.unsubscribe(&id).await {
                tracing::warn!("NWC: Failed to unsubscribe from {}: {}", relay, err);
            }
        }

        Ok(())
    }

    /// Drop every subscription
    ///
    /// Only the first call does anything.
    pub async fn teardown(&self) {
        let active = {
            let mut subscriptions = self.subscriptions.lock();
            if subscriptions.torn_down {
                return;
            }
            subscriptions.torn_down = true;
            std::mem::take(&mut subscriptions.active)
        };

        for subscription in active {
            if let Err(err) = subscription.connection.unsubscribe(&subscription.id).await {
                tracing::warn!(
                    "NWC: Failed to unsubscribe from {}: {}",
                    subscription.relay,
                    err
                );
            }
        }
    }
}

impl PendingCorrelation {
    /// Wait for the first decisive response
    ///
    /// Candidates that cannot be decrypted or decoded are logged and skipped.
    /// A response with a preimage resolves `Ok`, a response with an error
    /// resolves `Err`. Reaching the deadline first fails with a timeout.
    pub async fn wait(mut self) -> Result<PaymentProof, Error> {
        let mut last_malformed: Option<String> = None;

        loop {
            let incoming = match tokio::time::timeout_at(self.deadline, self.receiver.recv()).await
            {
                Ok(Some(incoming)) => incoming,
                Ok(None) => return Err(Error::SubscriptionsClosed),
                Err(_) => {
                    tracing::warn!(
                        "NWC: No response for {} after {:?}",
                        self.request_id,
                        self.timeout
                    );
                    return Err(Error::Timeout {
                        timeout: self.timeout,
                        last_malformed,
                    });
                }
            };

            let event = &incoming.event;
            if event.kind != Kind::WalletConnectResponse
                || !event.tags.event_ids().any(|id| *id == self.request_id)
            {
                tracing::debug!(
                    "NWC: Ignoring unrelated event {} from {}",
                    event.id,
                    incoming.relay
                );
                continue;
            }

            if event.pubkey != self.wallet_pubkey {
                tracing::warn!(
                    "NWC: Ignoring response from unexpected author {} on {}",
                    event.pubkey,
                    incoming.relay
                );
                continue;
            }

            let decided = match self.decode(&incoming).await {
                Ok(response) => pay_invoice_outcome(response),
                Err(err) => Err(err),
            };

            match decided {
                Ok(proof) => {
                    tracing::info!(
                        "NWC: Payment {} confirmed via {}",
                        self.request_id,
                        incoming.relay
                    );
                    return Ok(proof);
                }
                Err(Error::MalformedResponse(reason)) => {
                    tracing::warn!(
                        "NWC: Malformed response from {}: {}",
                        incoming.relay,
                        reason
                    );
                    last_malformed = Some(reason);
                }
                Err(err) => {
                    tracing::warn!("NWC: Wallet rejected payment {}: {}", self.request_id, err);
                    return Err(err);
                }
            }
        }
    }

    async fn decode(&self, incoming: &IncomingEvent) -> Result<Response, Error> {
        let plaintext = self
            .crypto
            .decrypt(&self.wallet_pubkey, &incoming.event.content)
            .await
            .map_err(|err| Error::MalformedResponse(err.to_string()))?;

        let response: Response = serde_json::from_str(&plaintext)
            .map_err(|err| Error::MalformedResponse(err.to_string()))?;

        if response.result_type != Method::PayInvoice {
            return Err(Error::MalformedResponse(format!(
                "unexpected result type {:?}",
                response.result_type
            )));
        }

        Ok(response)
    }
}

/// Decide a decoded `pay_invoice` response
///
/// An error resolves to [`Error::Wallet`], a non-empty preimage to a proof.
/// Anything else is not a decisive answer.
fn pay_invoice_outcome(response: Response) -> Result<PaymentProof, Error> {
    if let Some(error) = &response.error {
        return Err(Error::Wallet {
            code: error_code_name(&error.code),
            message: error.message.clone(),
        });
    }

    let result = response
        .to_pay_invoice()
        .map_err(|err| Error::MalformedResponse(err.to_string()))?;

    if result.preimage.is_empty() {
        return Err(Error::MalformedResponse("empty preimage".to_string()));
    }

    Ok(PaymentProof {
        preimage_or_reference: Some(result.preimage),
        fees_paid_msat: result.fees_paid,
    })
}

/// Wire name of a NIP-47 error code, e.g. `INSUFFICIENT_BALANCE`
fn error_code_name(code: &ErrorCode) -> String {
    serde_json::to_value(code)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{code:?}"))
}
