//! Connections opened during one payment attempt

use std::sync::Arc;

use parking_lot::Mutex;

use crate::relay::RelayConnection;

/// Owns every relay connection opened for a single attempt
///
/// Connections are registered as soon as they open and are closed exactly
/// once by [`ConnectionScope::close_all`]. A scope dropped without being
/// closed hands its remaining connections to a background task.
#[derive(Default)]
pub struct ConnectionScope {
    connections: Mutex<Vec<Arc<dyn RelayConnection>>>,
}

impl ConnectionScope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an open connection
    pub fn register(&self, connection: Arc<dyn RelayConnection>) {
        self.connections.lock().push(connection);
    }

    /// Close every registered connection
    pub async fn close_all(&self) {
        let connections = std::mem::take(&mut *self.connections.lock());

        for connection in connections {
            tracing::debug!("NWC: Closing relay connection {}", connection.url());
            connection.close().await;
        }
    }
}

impl Drop for ConnectionScope {
    fn drop(&mut self) {
        let connections = std::mem::take(&mut *self.connections.lock());
        if connections.is_empty() {
            return;
        }

        tracing::debug!(
            "NWC: Scope dropped with {} open connections, closing in background",
            connections.len()
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    for connection in connections {
                        connection.close().await;
                    }
                });
            }
            Err(_) => {
                tracing::warn!("NWC: No runtime to close relay connections on drop");
            }
        }
    }
}
