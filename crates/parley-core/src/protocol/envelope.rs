//! Envelope wire model (JSON).
//!
//! One document = one `Envelope { metadata, channel, action }`. The `action`
//! is adjacently tagged as `{ "type": ..., "data": ... }`; `action.type` is
//! the only routing key. Decoding is lenient toward the zero values the
//! reference server emits (`null` slices, `0001-01-01` timestamps, empty
//! `server_node`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Protocol version stamped on outbound envelopes.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Canonical id of the default room.
pub const DEFAULT_CHANNEL_ID: &str = "default";

/// Id of the pseudo-channel used for the auth handshake.
pub const AUTH_CHANNEL_ID: &str = "auth";

/// Channel type of the auth pseudo-channel.
pub const CHANNEL_TYPE_SYSTEM: &str = "system";

/// Channel type of chat rooms.
pub const CHANNEL_TYPE_GROUP: &str = "group";

/// Message type emitted by this client.
pub const MESSAGE_TYPE_TEXT: &str = "text";

/// Message status on creation.
pub const MESSAGE_STATUS_SENT: &str = "sent";

/// Wire names of the action tags.
pub mod action_type {
    pub const USER_AUTH: &str = "user_auth";
    pub const SEND_MESSAGE: &str = "send_message";
    pub const SWITCH_CHANNEL: &str = "switch_channel";
    pub const CREATE_CHANNEL: &str = "create_channel";
    pub const LIST_CHANNELS: &str = "list_channels";
    pub const EDIT_MESSAGE: &str = "edit_message";
    pub const DELETE_MESSAGE: &str = "delete_message";
    pub const REACT_MESSAGE: &str = "react_message";
    pub const USER_PRESENCE: &str = "user_presence";
}

fn null_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// True for every spelling of the default room: empty, `default`, `general`
/// (case-insensitive).
pub fn is_default_channel(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || id.eq_ignore_ascii_case(DEFAULT_CHANNEL_ID) || id.eq_ignore_ascii_case("general")
}

/// Collapse default-room synonyms to [`DEFAULT_CHANNEL_ID`]; other ids are trimmed.
pub fn canonical_channel_id(id: &str) -> String {
    if is_default_channel(id) {
        DEFAULT_CHANNEL_ID.to_string()
    } else {
        id.trim().to_string()
    }
}

/// Originating node descriptor (informational).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub load: f64,
}

/// Envelope metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub server_node: ServerNode,
}

/// Channel member record. Never populated by this client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub joined_at: DateTime<Utc>,
}

/// Channel identity record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// Chat room record stamped `now`.
    pub fn group(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind: CHANNEL_TYPE_GROUP.to_string(),
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The auth pseudo-channel.
    pub fn auth(now: DateTime<Utc>) -> Self {
        Self {
            id: AUTH_CHANNEL_ID.to_string(),
            kind: CHANNEL_TYPE_SYSTEM.to_string(),
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Emoji reaction tally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<String>,
}

/// `{ "text": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// File attachment content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    pub file_type: String,
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_hash: String,
    #[serde(default)]
    pub file_data: String,
    #[serde(default)]
    pub caption: String,
}

/// Message body. Anything that is neither text nor a file is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(TextContent),
    File(FileContent),
    Opaque(Value),
}

impl Default for Content {
    fn default() -> Self {
        Content::Opaque(Value::Null)
    }
}

/// Chat message payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: Content,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// New outbound text message with a fresh random id.
    pub fn text(sender_id: impl Into<String>, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_message_id(),
            sender_id: sender_id.into(),
            timestamp: now,
            kind: MESSAGE_TYPE_TEXT.to_string(),
            content: Content::Text(TextContent { text: text.into() }),
            status: MESSAGE_STATUS_SENT.to_string(),
            reactions: Vec::new(),
        }
    }

    /// Text for display: the text body of text messages, JSON for anything else.
    pub fn display_text(&self) -> String {
        match &self.content {
            Content::Text(t) if self.kind == MESSAGE_TYPE_TEXT || self.kind.is_empty() => t.text.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

/// 16 random bytes, hex encoded.
pub fn new_message_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// `user_auth` request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub username: String,
    pub password: String,
}

/// `user_auth` response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// `user_auth` data: responses carry `success`, requests carry credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthData {
    Response(AuthResponse),
    Request(AuthRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSwitch {
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelCreate {
    pub channel: Channel,
}

/// Empty on request (`{}`), populated on response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelList {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEdit {
    pub message_id: String,
    #[serde(default)]
    pub new_content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDelete {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReact {
    pub message_id: String,
    pub reaction: Reaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPresence {
    pub user_id: String,
    #[serde(default)]
    pub status: String,
}

/// Tagged action: `{ "type": "<snake_case>", "data": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Action {
    UserAuth(AuthData),
    SendMessage(MessageData),
    SwitchChannel(ChannelSwitch),
    CreateChannel(ChannelCreate),
    ListChannels(ChannelList),
    EditMessage(MessageEdit),
    DeleteMessage(MessageDelete),
    ReactMessage(MessageReact),
    UserPresence(UserPresence),
}

impl Action {
    /// Wire tag of this action.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::UserAuth(_) => action_type::USER_AUTH,
            Action::SendMessage(_) => action_type::SEND_MESSAGE,
            Action::SwitchChannel(_) => action_type::SWITCH_CHANNEL,
            Action::CreateChannel(_) => action_type::CREATE_CHANNEL,
            Action::ListChannels(_) => action_type::LIST_CHANNELS,
            Action::EditMessage(_) => action_type::EDIT_MESSAGE,
            Action::DeleteMessage(_) => action_type::DELETE_MESSAGE,
            Action::ReactMessage(_) => action_type::REACT_MESSAGE,
            Action::UserPresence(_) => action_type::USER_PRESENCE,
        }
    }
}

/// Top-level wire unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub channel: Channel,
    pub action: Action,
}

/// Pre-envelope broadcast shape: `{ "message": Message }` with no action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacyMessage {
    pub message: Message,
}

/// Stamps outbound envelopes with this client's metadata.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    version: String,
    node: ServerNode,
}

impl EnvelopeBuilder {
    pub fn new(version: impl Into<String>, node_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            node: ServerNode {
                id: node_id.into(),
                region: region.into(),
                load: 0.0,
            },
        }
    }

    pub fn node(&self) -> &ServerNode {
        &self.node
    }

    /// Envelope with all three top-level fields filled, timestamped now.
    pub fn envelope(&self, channel: Channel, action: Action) -> Envelope {
        Envelope {
            metadata: Metadata {
                version: self.version.clone(),
                timestamp: Utc::now(),
                server_node: self.node.clone(),
            },
            channel,
            action,
        }
    }

    /// `user_auth` request on the auth pseudo-channel.
    pub fn user_auth(&self, username: &str, password: &str) -> Envelope {
        self.envelope(
            Channel::auth(Utc::now()),
            Action::UserAuth(AuthData::Request(AuthRequest {
                username: username.to_string(),
                password: password.to_string(),
            })),
        )
    }

    /// `switch_channel` against `channel_id`.
    pub fn switch_channel(&self, channel_id: &str) -> Envelope {
        self.envelope(
            Channel::group(channel_id, Utc::now()),
            Action::SwitchChannel(ChannelSwitch {
                channel_id: channel_id.to_string(),
            }),
        )
    }

    /// `create_channel` for `new_id`, sent in the context of `context_id`.
    pub fn create_channel(&self, context_id: &str, new_id: &str) -> Envelope {
        let now = Utc::now();
        self.envelope(
            Channel::group(context_id, now),
            Action::CreateChannel(ChannelCreate {
                channel: Channel::group(new_id, now),
            }),
        )
    }

    /// `list_channels` with an empty payload.
    pub fn list_channels(&self, context_id: &str) -> Envelope {
        self.envelope(
            Channel::group(context_id, Utc::now()),
            Action::ListChannels(ChannelList::default()),
        )
    }

    /// `send_message` into `channel_id`.
    pub fn send_message(&self, channel_id: &str, message: Message) -> Envelope {
        self.envelope(
            Channel::group(channel_id, Utc::now()),
            Action::SendMessage(MessageData { message }),
        )
    }
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new(PROTOCOL_VERSION, "rust-client", "local")
    }
}
