//! Decode-once codec for inbound WebSocket messages.
//!
//! - Text frames => raw frame text (documents are split later by the router)
//! - Binary frames => accepted when the payload is valid UTF-8
//! - Ping/Pong are surfaced as control; Close ends the pump

use bytes::Bytes;
use tokio_tungstenite::tungstenite::Message;

use parley_core::error::{ChatError, Result};

#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Control,
    Close,
    /// Frame that cannot carry protocol text; logged and skipped.
    Invalid(String),
}

pub fn decode(msg: Message) -> Inbound {
    match msg {
        Message::Text(s) => Inbound::Text(s.as_str().to_owned()),
        Message::Binary(b) => match utf8_frame(b) {
            Ok(s) => Inbound::Text(s),
            Err(e) => Inbound::Invalid(e.to_string()),
        },
        Message::Ping(_) | Message::Pong(_) => Inbound::Control,
        Message::Close(_) => Inbound::Close,
        Message::Frame(_) => Inbound::Invalid("raw frame".into()),
    }
}

/// Binary payload as frame text.
pub fn utf8_frame(b: Bytes) -> Result<String> {
    String::from_utf8(b.to_vec())
        .map_err(|e| ChatError::MalformedResponse(format!("binary frame is not utf-8: {e}")))
}

/// Outbound frames are always text.
pub fn encode(text: String) -> Message {
    Message::text(text)
}
