use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::Message;
use tokio::sync::Mutex;

/// Registry key for one live connection.
pub type ConnId = String;

/// Write half of one client connection.
///
/// The broadcast engine and the reader loop talk to a peer only through this
/// trait, so tests can stand in scripted fakes for real sockets.
#[async_trait]
pub trait ClientSink: Send {
    /// Write one frame to the peer. An error is terminal for the connection.
    async fn send_frame(&mut self, frame: Message) -> Result<(), axum::Error>;

    /// Best-effort close of the underlying stream.
    async fn close(&mut self);
}

/// A connection's sink behind its exclusive write lock. Holding the lock is
/// what guarantees at most one write in flight per connection.
pub type SharedSink = Arc<Mutex<dyn ClientSink>>;

/// The set of live connections, shared by every reader loop, the broadcast
/// engine and the heartbeat.
///
/// One mutex guards membership: add, remove, snapshot and count all serialize
/// through it, so fan-out iteration can never race a reader loop's removal.
/// Individual writes run outside this lock, under the per-connection lock.
pub struct Registry {
    conns: Mutex<HashMap<ConnId, SharedSink>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            conns: Mutex::new(HashMap::new()),
        }
    }

    /// Register a freshly handshaken connection and return its id.
    pub async fn add(&self, sink: SharedSink) -> ConnId {
        let id = ulid::Ulid::new().to_string();
        self.conns.lock().await.insert(id.clone(), sink);
        id
    }

    /// Drop a connection, handing its sink back for closing. Removing an
    /// absent id is a no-op: the reader loop and a failed broadcast write may
    /// both try to drop the same connection, and only one of them wins.
    pub async fn remove(&self, id: &str) -> Option<SharedSink> {
        self.conns.lock().await.remove(id)
    }

    /// Copy of the current (id, sink) pairs for fan-out iteration. The
    /// registry lock is released before any write happens, so one slow
    /// recipient cannot stall handshakes or disconnects.
    pub async fn snapshot(&self) -> Vec<(ConnId, SharedSink)> {
        self.conns
            .lock()
            .await
            .iter()
            .map(|(id, sink)| (id.clone(), sink.clone()))
            .collect()
    }

    /// Number of live connections.
    pub async fn count(&self) -> usize {
        self.conns.lock().await.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that accepts and discards every frame.
    struct NullSink;

    #[async_trait]
    impl ClientSink for NullSink {
        async fn send_frame(&mut self, _frame: Message) -> Result<(), axum::Error> {
            Ok(())
        }

        async fn close(&mut self) {}
    }

    fn null_sink() -> SharedSink {
        Arc::new(Mutex::new(NullSink))
    }

    #[tokio::test]
    async fn test_add_assigns_distinct_ids() {
        let registry = Registry::new();
        let a = registry.add(null_sink()).await;
        let b = registry.add(null_sink()).await;
        assert_ne!(a, b);
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = Registry::new();
        let id = registry.add(null_sink()).await;

        assert!(registry.remove(&id).await.is_some());
        assert!(registry.remove(&id).await.is_none());
        assert!(registry.remove("no_such_conn").await.is_none());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_membership() {
        let registry = Registry::new();
        assert!(registry.snapshot().await.is_empty());

        let a = registry.add(null_sink()).await;
        let b = registry.add(null_sink()).await;

        let ids: Vec<ConnId> = registry
            .snapshot()
            .await
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));

        registry.remove(&a).await;
        let ids: Vec<ConnId> = registry
            .snapshot()
            .await
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![b]);
    }

    #[tokio::test]
    async fn test_count_tracks_lifecycle() {
        let registry = Registry::new();
        assert_eq!(registry.count().await, 0);

        let id = registry.add(null_sink()).await;
        assert_eq!(registry.count().await, 1);

        registry.remove(&id).await;
        assert_eq!(registry.count().await, 0);
    }
}
