//! Session context: the one object that owns the connection, router, auth
//! session and channel controller.
//!
//! All methods take `&mut self` and run to completion; the driver feeds
//! transport events and user commands through here one at a time.

use std::collections::VecDeque;

use parley_core::error::{ChatError, Feedback, Result};
use parley_core::protocol::envelope::{EnvelopeBuilder, Message};
use parley_core::protocol::frame::split_documents;

use crate::auth::{AuthSession, AuthState, PendingLogin};
use crate::channels::ChannelController;
use crate::config::ClientConfig;
use crate::connection::{
    ConnState, ConnectionId, ConnectionManager, Connector, Dispatch, LinkEvent, TransportEvent,
};
use crate::dispatch::{ConsumerId, Delivery, Router, Slot};
use crate::events::SessionEvent;

pub struct ChatSession {
    conn: ConnectionManager,
    router: Router,
    auth: AuthSession,
    channels: ChannelController,
    builder: EnvelopeBuilder,
    chat_consumer: Option<ConsumerId>,
    events: VecDeque<SessionEvent>,
}

impl ChatSession {
    pub fn new(cfg: &ClientConfig, connector: Box<dyn Connector>) -> Self {
        let builder = EnvelopeBuilder::new(
            cfg.identity.protocol_version.clone(),
            cfg.identity.node_id.clone(),
            cfg.identity.region.clone(),
        );
        Self::with_parts(cfg.endpoint(), builder, connector)
    }

    pub fn with_parts(endpoint: impl Into<String>, builder: EnvelopeBuilder, connector: Box<dyn Connector>) -> Self {
        Self {
            conn: ConnectionManager::new(connector, endpoint),
            router: Router::new(),
            auth: AuthSession::new(),
            channels: ChannelController::new(),
            builder,
            chat_consumer: None,
            events: VecDeque::new(),
        }
    }

    pub fn auth_state(&self) -> &AuthState {
        self.auth.state()
    }

    pub fn current_channel(&self) -> &str {
        self.channels.current()
    }

    pub fn known_channels(&self) -> &[String] {
        self.channels.known()
    }

    pub fn connection_state(&self) -> ConnState {
        self.conn.state()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn ensure_connection(&mut self) -> Result<ConnectionId> {
        self.conn.ensure_connection()
    }

    /// A new handshake drops chat delivery until it succeeds.
    pub fn login(&mut self, username: &str, password: &str) -> PendingLogin {
        self.release_chat();
        self.auth
            .login(username, password, &mut self.router, &mut self.conn, &self.builder)
    }

    /// Reset to `Anonymous` and release both consumer slots. The connection stays up.
    pub fn logout(&mut self) {
        self.auth.logout(&mut self.router, &mut self.conn);
        self.release_chat();
        tracing::info!("logged out");
        self.events.push_back(SessionEvent::LoggedOut);
    }

    pub fn switch_to(&mut self, channel_id: &str) -> Result<Dispatch> {
        self.channels.switch_to(channel_id, &mut self.conn, &self.builder)
    }

    pub fn create_channel(&mut self, channel_id: &str) -> Result<bool> {
        self.channels.create(channel_id, &mut self.conn, &self.builder)
    }

    pub fn request_list(&mut self) -> Result<()> {
        self.channels.request_list(&mut self.conn, &self.builder)
    }

    /// On `Ok`, callers may clear their input; on `Err` nothing was sent.
    pub fn send_chat_message(&mut self, text: &str) -> Result<Message> {
        self.channels
            .send_chat_message(text, self.auth.state(), &mut self.conn, &self.builder)
    }

    /// Explicit teardown of the shared connection. A pending login fails.
    pub fn close(&mut self) {
        if let Some(Err(e)) =
            self.auth
                .handle_transport_error("connection closed", &mut self.router, &mut self.conn)
        {
            self.login_failed(&e);
        }
        self.auth.on_disconnect(&self.conn);
        let was_open = self.conn.current_id().is_some();
        self.conn.close();
        if was_open {
            self.events.push_back(SessionEvent::Disconnected);
        }
    }

    /// Entry point for every transport notification.
    pub fn handle_link_event(&mut self, ev: LinkEvent) {
        let Some(event) = self.conn.on_event(ev) else {
            return;
        };

        match event {
            TransportEvent::Open => self.events.push_back(SessionEvent::Connected),
            TransportEvent::Close => {
                self.auth.on_disconnect(&self.conn);
                self.events.push_back(SessionEvent::Disconnected);
            }
            TransportEvent::Error(detail) => {
                if let Some(Err(e)) =
                    self.auth
                        .handle_transport_error(&detail, &mut self.router, &mut self.conn)
                {
                    self.login_failed(&e);
                }
                self.events.push_back(SessionEvent::TransportError(detail));
            }
            TransportEvent::Message(text) => self.handle_frame(&text),
        }
    }

    fn handle_frame(&mut self, text: &str) {
        // Route one document at a time: a login settled by an earlier document
        // changes where the later ones go.
        for doc in split_documents(text) {
            match self.router.route_document(doc) {
                Delivery::Auth { consumer, doc } => self.deliver_auth(consumer, doc),
                Delivery::Chat { consumer, doc } => {
                    if self.chat_consumer != Some(consumer) {
                        continue;
                    }
                    let ev = self.channels.handle_document(doc);
                    self.events.push_back(SessionEvent::Chat(ev));
                }
                Delivery::Discarded { doc, reason } => {
                    tracing::debug!(%reason, "non-protocol line");
                    self.events.push_back(SessionEvent::RawLine(doc.to_string()));
                }
                Delivery::Dropped { doc } => {
                    tracing::trace!(len = doc.len(), "document dropped; no consumer");
                }
            }
        }
    }

    fn deliver_auth(&mut self, consumer: ConsumerId, doc: &str) {
        let Some(outcome) = self.auth.handle_response(consumer, doc, &mut self.router) else {
            return;
        };

        match outcome {
            Ok(grant) => {
                self.chat_consumer = Some(self.router.register(Slot::Chat));
                self.events
                    .push_back(SessionEvent::Authenticated(grant.username));

                // announce the selected room on the fresh session
                let current = self.channels.current().to_string();
                if let Err(e) = self.switch_to(&current) {
                    tracing::warn!(channel = %current, error = %e, "initial switch_channel failed");
                }
            }
            Err(e) => self.login_failed(&e),
        }
    }

    fn login_failed(&mut self, e: &ChatError) {
        self.release_chat();
        self.events
            .push_back(SessionEvent::LoginFailed(Feedback::from_error(e)));
    }

    fn release_chat(&mut self) {
        if let Some(c) = self.chat_consumer.take() {
            self.router.deregister(Slot::Chat, c);
        }
    }
}
