use parley_core::error::{ChatError, Result};

/// Identity of one logical connection. Events tagged with an old id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// Lifecycle of the shared connection, as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Link exists; waiting for (re)open.
    Connecting,
    Open,
    /// No link.
    Closed,
}

/// Notifications from the transport, one per callback of the underlying socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    /// One raw text frame, verbatim.
    Message(String),
    Error(String),
    Close,
}

/// A transport event tagged with the connection it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEvent {
    pub connection: ConnectionId,
    pub event: TransportEvent,
}

/// Outbound half of a live transport link. Reconnection is the link's job.
pub trait Link: Send {
    fn send_text(&mut self, text: String) -> Result<()>;
    fn close(&mut self);
}

/// Builds links. Events for the link must be reported tagged with `id`.
pub trait Connector: Send {
    fn connect(&mut self, id: ConnectionId, endpoint: &str) -> Result<Box<dyn Link>>;
}

/// Keys of the one-shot continuations run on the next open event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferKey {
    Auth,
    Switch,
}

/// What `send_or_defer` did with the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    Deferred,
}

struct ConnectionHandle {
    id: ConnectionId,
    state: ConnState,
    link: Box<dyn Link>,
}

/// Owner of the single shared connection.
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    endpoint: String,
    handle: Option<ConnectionHandle>,
    next_id: u64,
    deferred: Vec<(DeferKey, String)>,
}

impl ConnectionManager {
    pub fn new(connector: Box<dyn Connector>, endpoint: impl Into<String>) -> Self {
        Self {
            connector,
            endpoint: endpoint.into(),
            handle: None,
            next_id: 1,
            deferred: Vec::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Create the connection if none exists; otherwise return the existing one unchanged.
    pub fn ensure_connection(&mut self) -> Result<ConnectionId> {
        if let Some(h) = &self.handle {
            return Ok(h.id);
        }

        let id = ConnectionId(self.next_id);
        self.next_id += 1;

        let link = self.connector.connect(id, &self.endpoint)?;
        tracing::info!(conn = id.0, endpoint = %self.endpoint, "connection created");

        self.handle = Some(ConnectionHandle {
            id,
            state: ConnState::Connecting,
            link,
        });
        Ok(id)
    }

    pub fn state(&self) -> ConnState {
        self.handle.as_ref().map(|h| h.state).unwrap_or(ConnState::Closed)
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnState::Open
    }

    pub fn current_id(&self) -> Option<ConnectionId> {
        self.handle.as_ref().map(|h| h.id)
    }

    /// Send now. Fails with `NotConnected` unless open; nothing is buffered.
    pub fn send(&mut self, text: String) -> Result<()> {
        match &mut self.handle {
            Some(h) if h.state == ConnState::Open => h.link.send_text(text),
            _ => Err(ChatError::NotConnected),
        }
    }

    /// Send now if open, else run once on the next open event.
    /// A newer continuation under the same key replaces the older one.
    pub fn send_or_defer(&mut self, key: DeferKey, text: String) -> Result<Dispatch> {
        if self.is_open() {
            self.send(text)?;
            return Ok(Dispatch::Sent);
        }

        if self.cancel_deferred(key) {
            tracing::debug!(?key, "deferred send replaced");
        }
        self.deferred.push((key, text));
        Ok(Dispatch::Deferred)
    }

    /// Drop the continuation under `key`. Returns whether one existed.
    pub fn cancel_deferred(&mut self, key: DeferKey) -> bool {
        let before = self.deferred.len();
        self.deferred.retain(|(k, _)| *k != key);
        before != self.deferred.len()
    }

    pub fn has_deferred(&self, key: DeferKey) -> bool {
        self.deferred.iter().any(|(k, _)| *k == key)
    }

    /// Tear down the link and forget it; the next `ensure_connection` builds a fresh one.
    pub fn close(&mut self) {
        self.deferred.clear();
        if let Some(mut h) = self.handle.take() {
            h.link.close();
            tracing::info!(conn = h.id.0, "connection closed");
        }
    }

    /// Track lifecycle for a transport event. Returns the event when it belongs
    /// to the current connection, `None` when stale.
    pub fn on_event(&mut self, ev: LinkEvent) -> Option<TransportEvent> {
        let h = self.handle.as_mut()?;
        if h.id != ev.connection {
            tracing::debug!(conn = ev.connection.0, current = h.id.0, "stale transport event ignored");
            return None;
        }

        match &ev.event {
            TransportEvent::Open => {
                h.state = ConnState::Open;
                tracing::info!(conn = h.id.0, "connection open");
                self.flush_deferred();
            }
            TransportEvent::Close => {
                h.state = ConnState::Connecting;
                tracing::info!(conn = h.id.0, "connection lost; link reconnecting");
            }
            TransportEvent::Error(e) => {
                tracing::warn!(conn = h.id.0, error = %e, "transport error");
            }
            TransportEvent::Message(_) => {}
        }

        Some(ev.event)
    }

    fn flush_deferred(&mut self) {
        for (key, text) in std::mem::take(&mut self.deferred) {
            if let Err(e) = self.send(text) {
                tracing::warn!(?key, error = %e, "deferred send failed");
            } else {
                tracing::debug!(?key, "deferred send flushed");
            }
        }
    }
}
