//! Relay capability
//!
//! The bridge does not speak the relay wire protocol itself. Callers provide a
//! [`RelayConnector`] that opens [`RelayConnection`]s over the `nostr` event
//! and filter types, so any relay client can be adapted.

use std::sync::Arc;

use async_trait::async_trait;
use nostr::{Event, Filter};
use tokio::sync::mpsc;

use crate::error::Error;

/// Relay side subscription identifier
pub type SubscriptionId = String;

/// Channel relays push subscription matches into
pub type EventSink = mpsc::UnboundedSender<IncomingEvent>;

/// Event delivered by a relay subscription
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    /// Relay that delivered the event
    pub relay: String,
    /// The event
    pub event: Event,
}

/// Opens relay connections
#[async_trait]
pub trait RelayConnector: Send + Sync {
    /// Connect to the relay at `relay`
    async fn connect(&self, relay: &str) -> Result<Arc<dyn RelayConnection>, Error>;
}

/// An open relay connection
#[async_trait]
pub trait RelayConnection: Send + Sync {
    /// Relay address
    fn url(&self) -> &str;

    /// Publish an event
    ///
    /// Resolves `Ok` once the relay acknowledged the event and `Err` if it
    /// rejected it or the connection failed.
    async fn publish(&self, event: &Event) -> Result<(), Error>;

    /// Subscribe to events matching `filter`, delivered into `sink`
    async fn subscribe(&self, filter: Filter, sink: EventSink) -> Result<SubscriptionId, Error>;

    /// End a subscription
    async fn unsubscribe(&self, id: &SubscriptionId) -> Result<(), Error>;

    /// Close the connection
    async fn close(&self);
}
