#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! In-memory transport for session tests: records outbound frames and counts
//! connects. Events are injected by the test through `ChatSession::handle_link_event`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use parley_client::connection::{ConnectionId, Connector, Link, LinkEvent, TransportEvent};
use parley_client::ChatSession;
use parley_core::error::Result;
use parley_core::protocol::envelope::EnvelopeBuilder;

#[derive(Clone, Default)]
pub struct Wire {
    frames: Arc<Mutex<Vec<String>>>,
    connects: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl Wire {
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    /// Frames recorded so far, clearing the record.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.frames.lock().unwrap())
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Parsed frames, in send order.
    pub fn documents(&self) -> Vec<Value> {
        self.frames()
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect()
    }

    /// `action.type` of each recorded frame, in send order.
    pub fn action_types(&self) -> Vec<String> {
        self.documents()
            .iter()
            .map(|d| d["action"]["type"].as_str().unwrap().to_string())
            .collect()
    }
}

pub struct MockConnector {
    wire: Wire,
}

impl MockConnector {
    pub fn new(wire: Wire) -> Self {
        Self { wire }
    }
}

impl Connector for MockConnector {
    fn connect(&mut self, _id: ConnectionId, _endpoint: &str) -> Result<Box<dyn Link>> {
        self.wire.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockLink {
            wire: self.wire.clone(),
        }))
    }
}

struct MockLink {
    wire: Wire,
}

impl Link for MockLink {
    fn send_text(&mut self, text: String) -> Result<()> {
        self.wire.frames.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.wire.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn session() -> (ChatSession, Wire) {
    let wire = Wire::default();
    let session = ChatSession::with_parts(
        "ws://test/ws",
        EnvelopeBuilder::default(),
        Box::new(MockConnector::new(wire.clone())),
    );
    (session, wire)
}

pub fn event(conn: u64, event: TransportEvent) -> LinkEvent {
    LinkEvent {
        connection: ConnectionId(conn),
        event,
    }
}

pub fn open(session: &mut ChatSession) {
    let id = session.ensure_connection().unwrap();
    session.handle_link_event(LinkEvent {
        connection: id,
        event: TransportEvent::Open,
    });
}

pub fn deliver(session: &mut ChatSession, frame: &str) {
    let id = session.ensure_connection().unwrap();
    session.handle_link_event(LinkEvent {
        connection: id,
        event: TransportEvent::Message(frame.to_string()),
    });
}

pub fn auth_ok(username: &str) -> String {
    json!({
        "action": {
            "type": "user_auth",
            "data": { "success": true, "username": username, "message": "welcome" }
        }
    })
    .to_string()
}

pub fn auth_fail(message: &str) -> String {
    json!({
        "action": {
            "type": "user_auth",
            "data": { "success": false, "message": message }
        }
    })
    .to_string()
}

pub fn channel_list(ids: &[&str]) -> String {
    let channels: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "id": id, "type": "group", "participants": null }))
        .collect();
    json!({
        "action": { "type": "list_channels", "data": { "channels": channels } }
    })
    .to_string()
}

pub fn chat_message(channel: &str, sender: &str, text: &str) -> String {
    json!({
        "channel": { "id": channel, "type": "group" },
        "action": {
            "type": "send_message",
            "data": {
                "message": {
                    "id": "m-1",
                    "sender_id": sender,
                    "type": "text",
                    "content": { "text": text },
                    "status": "sent"
                }
            }
        }
    })
    .to_string()
}

/// Open the connection and complete a login as `username`; clears the wire record.
pub fn authenticated(username: &str) -> (ChatSession, Wire) {
    let (mut s, wire) = session();
    open(&mut s);
    let mut pending = s.login(username, "pw");
    deliver(&mut s, &auth_ok(username));
    assert!(pending.try_outcome().unwrap().is_ok());
    s.drain_events();
    wire.take();
    (s, wire)
}
