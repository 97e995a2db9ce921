use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use async_trait::async_trait;
use futures::{sink::SinkExt, stream::SplitSink, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::hub::Hub;
use crate::protocol::{self, Envelope};
use crate::registry::{ClientSink, SharedSink};

/// Write half of one client socket.
///
/// Lives behind the registry's per-connection lock, so every write to this
/// socket serializes through one place no matter who initiates it.
struct WsSink {
    sender: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl ClientSink for WsSink {
    async fn send_frame(&mut self, frame: Message) -> Result<(), axum::Error> {
        self.sender.send(frame).await
    }

    async fn close(&mut self) {
        // Best effort; the peer may already be gone.
        let _ = self.sender.close().await;
    }
}

/// Upgrade an HTTP request to a WebSocket connection.
///
/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<Hub>) {
    let (sender, mut receiver) = socket.split();

    let sink: SharedSink = Arc::new(Mutex::new(WsSink { sender }));
    let conn_id = hub.registry().add(sink.clone()).await;
    tracing::info!("WebSocket connected: {}", conn_id);

    // Handle incoming messages
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                tracing::debug!("Received frame: {}", text);

                match protocol::chat_payload(&text) {
                    Ok(payload) => {
                        hub.broadcast(&Envelope::Chat(payload)).await;
                    }
                    Err(e) => {
                        // Bad frames are dropped; the connection stays up.
                        tracing::warn!("Failed to parse client frame: {}", e);
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                if sink
                    .lock()
                    .await
                    .send_frame(Message::Pong(data))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                tracing::debug!("WebSocket closed by peer: {}", conn_id);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                // A failed read is how most clients leave.
                tracing::debug!("WebSocket read error on {}: {}", conn_id, e);
                break;
            }
        }
    }

    // The broadcast path may have removed us already after a write failure;
    // remove is idempotent and only the winner closes the sink.
    if let Some(sink) = hub.registry().remove(&conn_id).await {
        sink.lock().await.close().await;
    }
    tracing::info!("WebSocket disconnected: {}", conn_id);
}
