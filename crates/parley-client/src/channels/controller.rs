use chrono::Utc;

use parley_core::error::{ChatError, Result};
use parley_core::protocol::envelope::{
    canonical_channel_id, is_default_channel, Channel, EnvelopeBuilder, Message, DEFAULT_CHANNEL_ID,
};
use parley_core::protocol::frame;

use crate::auth::AuthState;
use crate::channels::consumer::{interpret, Interpreted};
use crate::connection::{ConnectionManager, DeferKey, Dispatch};
use crate::events::ChatEvent;

/// Locally selected channel and the known-channel set.
///
/// `known` always starts with [`DEFAULT_CHANNEL_ID`], which is never removed.
#[derive(Debug, Clone)]
pub struct ChannelController {
    current: String,
    known: Vec<String>,
}

impl Default for ChannelController {
    fn default() -> Self {
        Self {
            current: DEFAULT_CHANNEL_ID.to_string(),
            known: vec![DEFAULT_CHANNEL_ID.to_string()],
        }
    }
}

impl ChannelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn known(&self) -> &[String] {
        &self.known
    }

    pub fn is_known(&self, channel_id: &str) -> bool {
        let id = canonical_channel_id(channel_id);
        self.known.iter().any(|k| *k == id)
    }

    /// Select `channel_id` and tell the server, now or on the next open.
    /// Never closes or reopens the connection.
    pub fn switch_to(
        &mut self,
        channel_id: &str,
        conn: &mut ConnectionManager,
        builder: &EnvelopeBuilder,
    ) -> Result<Dispatch> {
        let id = canonical_channel_id(channel_id);
        if !self.is_known(&id) {
            self.known.push(id.clone());
        }
        self.current = id.clone();

        conn.ensure_connection()?;
        let text = frame::encode(&builder.switch_channel(&id))?;
        let dispatch = conn.send_or_defer(DeferKey::Switch, text)?;
        tracing::debug!(channel = %id, ?dispatch, "switch_channel");
        Ok(dispatch)
    }

    /// Optimistically add `channel_id`, announce it if connected, then switch to it.
    /// Returns `false` (and does nothing) when the channel is already known.
    pub fn create(
        &mut self,
        channel_id: &str,
        conn: &mut ConnectionManager,
        builder: &EnvelopeBuilder,
    ) -> Result<bool> {
        let id = canonical_channel_id(channel_id);
        if self.is_known(&id) {
            return Ok(false);
        }
        self.known.push(id.clone());

        if conn.is_open() {
            // the new room is its own envelope context
            let text = frame::encode(&builder.create_channel(&id, &id))?;
            conn.send(text)?;
            tracing::debug!(channel = %id, "create_channel sent");
        }

        self.switch_to(&id, conn, builder)?;
        Ok(true)
    }

    /// Ask the server for its channel list. `NotConnected` unless open.
    pub fn request_list(&self, conn: &mut ConnectionManager, builder: &EnvelopeBuilder) -> Result<()> {
        if !conn.is_open() {
            return Err(ChatError::NotConnected);
        }
        let text = frame::encode(&builder.list_channels(&self.current))?;
        conn.send(text)
    }

    /// Full-replace reconciliation with a server snapshot: default first, then
    /// the server's non-default ids in server order, deduplicated.
    pub fn on_channel_list(&mut self, channels: &[Channel]) -> &[String] {
        let mut known = vec![DEFAULT_CHANNEL_ID.to_string()];
        for c in channels {
            if is_default_channel(&c.id) {
                continue;
            }
            let id = c.id.trim();
            if !known.iter().any(|k| k == id) {
                known.push(id.to_string());
            }
        }
        self.known = known;
        &self.known
    }

    /// Send a text message into the current channel as the authenticated user.
    pub fn send_chat_message(
        &self,
        text: &str,
        auth: &AuthState,
        conn: &mut ConnectionManager,
        builder: &EnvelopeBuilder,
    ) -> Result<Message> {
        let sender = auth.username().ok_or(ChatError::Unauthenticated)?;
        if !conn.is_open() {
            return Err(ChatError::NotConnected);
        }
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let message = Message::text(sender, text, Utc::now());
        let wire = frame::encode(&builder.send_message(&self.current, message.clone()))?;
        conn.send(wire)?;
        tracing::debug!(channel = %self.current, id = %message.id, "send_message");
        Ok(message)
    }

    /// Chat-slot consumer: re-parse `doc` and apply channel-list pushes.
    pub fn handle_document(&mut self, doc: &str) -> ChatEvent {
        match interpret(doc) {
            Interpreted::ChannelList(channels) => ChatEvent::ChannelList {
                channels: self.on_channel_list(&channels).to_vec(),
            },
            Interpreted::Event(ev) => ev,
        }
    }
}
