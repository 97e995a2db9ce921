use std::sync::Arc;

use axum::extract::ws::Message;

use crate::protocol::{self, Envelope};
use crate::registry::Registry;
use crate::store::{self, ChatStore};

/// Central broadcast hub: the connection registry plus the optional durable
/// store behind it.
///
/// One hub instance is shared by every connection handler and the presence
/// heartbeat.
pub struct Hub {
    registry: Registry,
    store: Option<Arc<dyn ChatStore>>,
}

impl Hub {
    pub fn new(store: Option<Arc<dyn ChatStore>>) -> Self {
        Self {
            registry: Registry::new(),
            store,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        self.registry.count().await
    }

    /// Send one envelope to every registered connection, then persist it if
    /// it was a chat message.
    ///
    /// The envelope is encoded once and the same frame goes to everyone. A
    /// connection whose write fails is closed and removed on the spot; the
    /// remaining recipients are unaffected. Persistence runs after the
    /// fan-out and can never block or undo a delivery.
    pub async fn broadcast(&self, envelope: &Envelope) {
        let frame = match protocol::encode(envelope) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Failed to encode outbound frame: {}", e);
                return;
            }
        };
        let message = Message::Text(frame.into());

        // Snapshot first so a slow or dead recipient never holds up
        // registry membership for the others.
        for (conn_id, sink) in self.registry.snapshot().await {
            let mut guard = sink.lock().await;
            if let Err(e) = guard.send_frame(message.clone()).await {
                tracing::warn!("Write to connection {} failed, removing it: {}", conn_id, e);
                guard.close().await;
                drop(guard);
                self.registry.remove(&conn_id).await;
            }
        }

        if let Envelope::Chat(payload) = envelope {
            if let Some(store) = &self.store {
                store::persist_chat(store.as_ref(), payload).await;
            }
        }
    }
}
