use serde::{Deserialize, Serialize};

/// Wire envelope exchanged between the hub and its clients.
///
/// The payload type is keyed by `messageType`: chat lines carry a formatted
/// string (`"@name: content"`), presence announcements carry the connection
/// count. Anything else fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "messageType", content = "data", rename_all = "lowercase")]
pub enum Envelope {
    /// A chat line, rebroadcast to every connected client.
    Chat(String),
    /// Number of currently connected clients. Hub-originated only.
    Online(usize),
}

/// Raw client frame. Only `data` is examined: inbound traffic is always
/// rebroadcast as chat, so the frame's own `messageType` (if any) carries no
/// meaning and is not deserialized.
#[derive(Debug, Deserialize)]
struct InboundFrame {
    data: serde_json::Value,
}

/// Errors from the wire codec. All of them are recoverable: the caller logs
/// and skips the frame or the broadcast, never the connection or the process.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("chat payload is not a string")]
    PayloadNotText,
}

/// Serialize an envelope to its wire form.
pub fn encode(envelope: &Envelope) -> Result<String, CodecError> {
    serde_json::to_string(envelope).map_err(CodecError::Encode)
}

/// Parse a wire frame into a typed envelope.
pub fn decode(frame: &str) -> Result<Envelope, CodecError> {
    serde_json::from_str(frame).map_err(CodecError::Decode)
}

/// Extract the chat payload from an inbound client frame.
///
/// The `data` field is taken verbatim but must be a JSON string; the hub
/// never rebroadcasts untyped payloads.
pub fn chat_payload(frame: &str) -> Result<String, CodecError> {
    let inbound: InboundFrame = serde_json::from_str(frame).map_err(CodecError::Decode)?;
    match inbound.data {
        serde_json::Value::String(text) => Ok(text),
        _ => Err(CodecError::PayloadNotText),
    }
}
