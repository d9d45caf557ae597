//! Test doubles for relays and wallet crypto

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nostr::nips::nip47::NostrWalletConnectURI;
use nostr::{Event, EventBuilder, EventId, Filter, Keys, Kind, PublicKey, Tag, UnsignedEvent};
use parking_lot::Mutex;

use crate::crypto::WalletCrypto;
use crate::error::Error;
use crate::relay::{EventSink, IncomingEvent, RelayConnection, RelayConnector, SubscriptionId};

pub const WALLET_SECRET: &str = "71a8c14c1407c113601079c4302dab36460f0ccd0ad506f1f2dc73b5100e4f3c";
pub const CONNECTION_SECRET: &str =
    "3c4f0e10b573dcf2f106d50acdcc0f4636ab2d30c4790160137c0714c1c8a871";
pub const REQUEST_ID: &str = "5c2b1a0f9e8d7c6b5a4f3e2d1c0b9a8f5c2b1a0f9e8d7c6b5a4f3e2d1c0b9a8f";
pub const ERROR_RESPONSE: &str = r#"{"result_type":"pay_invoice","error":{"code":"INSUFFICIENT_BALANCE","message":"not enough sats"},"result":null}"#;

pub fn wallet_keys() -> Keys {
    Keys::parse(WALLET_SECRET).expect("wallet secret")
}

pub fn request_id() -> EventId {
    EventId::from_hex(REQUEST_ID).expect("request id")
}

/// Connection URI for the test wallet over `relays`
pub fn connection_uri(relays: &[&str]) -> NostrWalletConnectURI {
    let mut uri = format!(
        "nostr+walletconnect://{}?secret={}",
        wallet_keys().public_key().to_hex(),
        CONNECTION_SECRET
    );
    for relay in relays {
        uri.push_str("&relay=");
        uri.push_str(relay);
    }
    uri.parse().expect("connection uri")
}

/// Marks content as "encrypted" so decryption of anything else fails
pub struct MockCrypto {
    keys: Keys,
}

impl MockCrypto {
    pub fn new() -> Self {
        Self {
            keys: Keys::parse(CONNECTION_SECRET).expect("connection secret"),
        }
    }

    pub fn seal(plaintext: &str) -> String {
        format!("enc:{plaintext}")
    }
}

#[async_trait]
impl WalletCrypto for MockCrypto {
    fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }

    async fn sign(&self, unsigned: UnsignedEvent) -> Result<Event, Error> {
        unsigned
            .sign_with_keys(&self.keys)
            .map_err(|e| Error::Crypto(e.to_string()))
    }

    async fn encrypt(&self, _peer: &PublicKey, plaintext: &str) -> Result<String, Error> {
        Ok(Self::seal(plaintext))
    }

    async fn decrypt(&self, _peer: &PublicKey, ciphertext: &str) -> Result<String, Error> {
        ciphertext
            .strip_prefix("enc:")
            .map(str::to_string)
            .ok_or_else(|| Error::Crypto("bad ciphertext".to_string()))
    }
}

pub fn sealed_success(preimage: &str) -> String {
    MockCrypto::seal(&format!(
        r#"{{"result_type":"pay_invoice","error":null,"result":{{"preimage":"{preimage}"}}}}"#
    ))
}

pub fn sealed_error() -> String {
    MockCrypto::seal(ERROR_RESPONSE)
}

/// Wallet answer to the request event `request_id`
pub fn response_event(request_id: &EventId, content: &str) -> Event {
    EventBuilder::new(Kind::WalletConnectResponse, content)
        .tag(Tag::event(*request_id))
        .sign_with_keys(&wallet_keys())
        .expect("sign response")
}

/// Counters shared between a test and the mock connections of one relay
#[derive(Default)]
pub struct RelayStats {
    connects: AtomicUsize,
    publishes: AtomicUsize,
    subscribes: AtomicUsize,
    unsubscribes: AtomicUsize,
    closes: AtomicUsize,
}

impl RelayStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn publishes(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }

    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Scripted behaviour of one relay
#[derive(Clone)]
pub struct RelayScript {
    pub connect_delay: Duration,
    pub connect_fails: bool,
    pub publish_delay: Duration,
    pub publish_rejected: bool,
    /// Wallet answers, sent this long after publishing: (delay, encrypted content)
    pub responses: Vec<(Duration, String)>,
}

impl RelayScript {
    pub fn accepting(publish_delay: Duration) -> Self {
        Self {
            connect_delay: Duration::ZERO,
            connect_fails: false,
            publish_delay,
            publish_rejected: false,
            responses: vec![],
        }
    }

    pub fn unreachable() -> Self {
        Self {
            connect_fails: true,
            ..Self::accepting(Duration::ZERO)
        }
    }

    pub fn rejecting(publish_delay: Duration) -> Self {
        Self {
            publish_rejected: true,
            ..Self::accepting(publish_delay)
        }
    }

    pub fn respond(mut self, after: Duration, content: String) -> Self {
        self.responses.push((after, content));
        self
    }
}

struct Listener {
    id: SubscriptionId,
    sink: EventSink,
    live: Arc<AtomicBool>,
}

pub struct MockConnection {
    url: String,
    script: RelayScript,
    stats: Arc<RelayStats>,
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl MockConnection {
    pub fn new(url: &str, script: RelayScript, stats: Arc<RelayStats>) -> Arc<Self> {
        Arc::new(Self {
            url: url.to_string(),
            script,
            stats,
            listeners: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Connection that accepts everything and never answers
    pub fn idle(url: &str, stats: Arc<RelayStats>) -> Arc<Self> {
        Self::new(url, RelayScript::accepting(Duration::ZERO), stats)
    }
}

#[async_trait]
impl RelayConnection for MockConnection {
    fn url(&self) -> &str {
        &self.url
    }

    /// The wallet sees the event as soon as it is sent, the acknowledgement
    /// follows after the scripted delay
    async fn publish(&self, event: &Event) -> Result<(), Error> {
        self.stats.publishes.fetch_add(1, Ordering::SeqCst);

        for (delay, content) in self.script.responses.clone() {
            let listeners = self.listeners.clone();
            let relay = self.url.clone();
            let answer = response_event(&event.id, &content);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                for listener in listeners.lock().iter() {
                    if listener.live.load(Ordering::SeqCst) {
                        let _ = listener.sink.send(IncomingEvent {
                            relay: relay.clone(),
                            event: answer.clone(),
                        });
                    }
                }
            });
        }

        tokio::time::sleep(self.script.publish_delay).await;
        if self.script.publish_rejected {
            return Err(Error::relay(&self.url, "blocked: rate limited"));
        }
        Ok(())
    }

    async fn subscribe(&self, _filter: Filter, sink: EventSink) -> Result<SubscriptionId, Error> {
        let count = self.stats.subscribes.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}-{}", self.url, count);
        self.listeners.lock().push(Listener {
            id: id.clone(),
            sink,
            live: Arc::new(AtomicBool::new(true)),
        });
        Ok(id)
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> Result<(), Error> {
        let mut listeners = self.listeners.lock();
        if let Some(listener) = listeners.iter().find(|l| &l.id == id) {
            if listener.live.swap(false, Ordering::SeqCst) {
                self.stats.unsubscribes.fetch_add(1, Ordering::SeqCst);
            }
        }
        listeners.retain(|l| &l.id != id);
        Ok(())
    }

    async fn close(&self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Connector handing out scripted connections
#[derive(Default)]
pub struct MockConnector {
    relays: HashMap<String, (RelayScript, Arc<RelayStats>)>,
}

fn relay_key(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relay(mut self, url: &str, script: RelayScript) -> Self {
        self.relays
            .insert(relay_key(url), (script, RelayStats::new()));
        self
    }

    pub fn stats(&self, url: &str) -> Arc<RelayStats> {
        self.relays
            .get(&relay_key(url))
            .map(|(_, stats)| stats.clone())
            .unwrap_or_default()
    }

    /// Subscriptions still open across every relay
    pub fn open_subscriptions(&self) -> usize {
        self.relays
            .values()
            .map(|(_, stats)| stats.subscribes() - stats.unsubscribes())
            .sum()
    }
}

#[async_trait]
impl RelayConnector for MockConnector {
    async fn connect(&self, relay: &str) -> Result<Arc<dyn RelayConnection>, Error> {
        let (script, stats) = self
            .relays
            .get(&relay_key(relay))
            .cloned()
            .ok_or_else(|| Error::relay(relay, "unknown relay"))?;

        tokio::time::sleep(script.connect_delay).await;
        if script.connect_fails {
            return Err(Error::relay(relay, "connection refused"));
        }

        stats.connects.fetch_add(1, Ordering::SeqCst);
        let connection: Arc<dyn RelayConnection> = MockConnection::new(relay, script, stats);
        Ok(connection)
    }
}
