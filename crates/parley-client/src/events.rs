//! Events handed to the presentation layer.

use serde_json::Value;

use parley_core::error::Feedback;
use parley_core::protocol::envelope::{Envelope, Message, Reaction};

/// Interpretation of one chat-slot document.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// `send_message` push, or a legacy `{ "message": ... }` broadcast (no channel).
    MessageReceived {
        channel: Option<String>,
        message: Message,
    },
    /// Known-channel set after reconciling a `list_channels` response.
    ChannelList { channels: Vec<String> },
    /// Server confirmation of `create_channel`.
    ChannelCreated { channel_id: String },
    /// Server-pushed `switch_channel`.
    ChannelSwitched { channel_id: String },
    MessageEdited { message_id: String, new_content: Value },
    MessageDeleted { message_id: String },
    ReactionAdded { message_id: String, reaction: Reaction },
    PresenceChanged { user_id: String, status: String },
    /// Typed action with no dedicated event (e.g. an unclaimed `user_auth`).
    Action { envelope: Box<Envelope> },
    /// JSON the protocol does not describe; shown verbatim.
    Opaque { document: Value },
}

/// Session-level notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    TransportError(String),
    Authenticated(String),
    LoginFailed(Feedback),
    LoggedOut,
    Chat(ChatEvent),
    /// Non-JSON line from the server (raw-text path).
    RawLine(String),
}
