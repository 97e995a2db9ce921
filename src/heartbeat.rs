use crate::hub::Hub;
use crate::protocol::Envelope;
use std::sync::Arc;
use std::time::Duration;

/// Spawn a background task that broadcasts the current connection count to
/// all clients once per second.
///
/// The count doubles as a liveness signal: clients hear from the server at
/// least once a second even when nobody is chatting. Dead connections
/// surface here as write failures and get culled by the broadcast.
pub fn spawn_presence_heartbeat(hub: Arc<Hub>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;

            let online = hub.connection_count().await;
            hub.broadcast(&Envelope::Online(online)).await;
        }
    });
}
