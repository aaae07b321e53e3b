#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod mock_link;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use parley_client::auth::AuthState;
use parley_client::config::{ClientConfig, QueueSection};
use parley_client::connection::{ConnState, ConnectionId, LinkEvent, TransportEvent};
use parley_client::{spawn_with, ChatEvent, SessionEvent, SessionHandle};
use parley_core::error::ChatError;

use mock_link::{auth_ok, channel_list, session, Wire};

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    handle: SessionHandle,
    events: mpsc::Receiver<SessionEvent>,
    link: mpsc::Sender<LinkEvent>,
    wire: Wire,
}

impl Harness {
    fn start() -> Self {
        let (s, wire) = session();
        let (link, link_rx) = mpsc::channel(64);
        let (handle, events) = spawn_with(s, link_rx, &QueueSection::default());
        Self {
            handle,
            events,
            link,
            wire,
        }
    }

    async fn inject(&self, event: TransportEvent) {
        self.link
            .send(LinkEvent {
                connection: ConnectionId(1),
                event,
            })
            .await
            .unwrap();
    }

    async fn next_event(&mut self) -> SessionEvent {
        timeout(WAIT, self.events.recv()).await.unwrap().unwrap()
    }

    /// Skip events until one matches.
    async fn wait_for(&mut self, want: impl Fn(&SessionEvent) -> bool) -> SessionEvent {
        loop {
            let ev = self.next_event().await;
            if want(&ev) {
                return ev;
            }
        }
    }

    async fn open(&mut self) {
        self.handle.connect().await.unwrap();
        self.inject(TransportEvent::Open).await;
        self.wait_for(|e| *e == SessionEvent::Connected).await;
    }

    async fn wait_until_authenticating(&self) {
        timeout(WAIT, async {
            loop {
                let snap = self.handle.snapshot().await.unwrap();
                if snap.auth.is_authenticating() {
                    return;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    async fn login(&mut self, username: &str) {
        let handle = self.handle.clone();
        let user = username.to_string();
        let login = tokio::spawn(async move { handle.login(&user, "pw").await });

        self.wait_until_authenticating().await;
        self.inject(TransportEvent::Message(auth_ok(username))).await;

        let grant = timeout(WAIT, login).await.unwrap().unwrap().unwrap();
        assert_eq!(grant.username, username);
    }
}

#[tokio::test]
async fn login_resolves_through_handle() {
    let mut h = Harness::start();
    h.open().await;
    h.login("alice").await;

    let ev = h
        .wait_for(|e| matches!(e, SessionEvent::Authenticated(_)))
        .await;
    assert_eq!(ev, SessionEvent::Authenticated("alice".into()));

    let snap = h.handle.snapshot().await.unwrap();
    assert_eq!(snap.auth, AuthState::Authenticated("alice".into()));
    assert_eq!(snap.connection, ConnState::Open);
    assert_eq!(snap.current_channel, "default");
    assert_eq!(h.wire.action_types(), vec!["user_auth", "switch_channel"]);
}

#[tokio::test]
async fn operations_fail_fast_before_login() {
    let h = Harness::start();

    assert_eq!(h.handle.request_list().await, Err(ChatError::NotConnected));
    assert_eq!(
        h.handle.send_message("hi").await.map(|_| ()),
        Err(ChatError::Unauthenticated)
    );
    assert!(h.wire.frames().is_empty());
}

#[tokio::test]
async fn chat_round_trip() {
    let mut h = Harness::start();
    h.open().await;
    h.login("alice").await;

    assert!(h.handle.create_channel("dev").await.unwrap());
    let sent = h.handle.send_message("hello").await.unwrap();
    assert_eq!(sent.sender_id, "alice");

    h.handle.request_list().await.unwrap();
    h.inject(TransportEvent::Message(channel_list(&["general", "dev"])))
        .await;

    let ev = h
        .wait_for(|e| matches!(e, SessionEvent::Chat(ChatEvent::ChannelList { .. })))
        .await;
    assert_eq!(
        ev,
        SessionEvent::Chat(ChatEvent::ChannelList {
            channels: vec!["default".into(), "dev".into()]
        })
    );

    let snap = h.handle.snapshot().await.unwrap();
    assert_eq!(snap.current_channel, "dev");
    assert_eq!(snap.known_channels, vec!["default".to_string(), "dev".to_string()]);
    assert_eq!(
        h.wire.action_types(),
        vec![
            "user_auth",
            "switch_channel",
            "create_channel",
            "switch_channel",
            "send_message",
            "list_channels"
        ]
    );
}

#[tokio::test]
async fn logout_reports_and_resets() {
    let mut h = Harness::start();
    h.open().await;
    h.login("alice").await;

    h.handle.logout().await.unwrap();
    h.wait_for(|e| *e == SessionEvent::LoggedOut).await;

    let snap = h.handle.snapshot().await.unwrap();
    assert_eq!(snap.auth, AuthState::Anonymous);
    assert_eq!(snap.connection, ConnState::Open);
}

#[tokio::test]
async fn transport_error_fails_login_future() {
    let mut h = Harness::start();
    h.open().await;

    let handle = h.handle.clone();
    let login = tokio::spawn(async move { handle.login("alice", "pw").await });
    h.wait_until_authenticating().await;
    h.inject(TransportEvent::Error("refused".into())).await;

    let res = timeout(WAIT, login).await.unwrap().unwrap();
    assert!(matches!(res, Err(ChatError::Transport(_))));
    h.wait_for(|e| matches!(e, SessionEvent::TransportError(_)))
        .await;
}

#[tokio::test]
async fn close_tears_down_and_next_connect_is_fresh() {
    let mut h = Harness::start();
    h.open().await;

    h.handle.close().await.unwrap();
    h.wait_for(|e| *e == SessionEvent::Disconnected).await;
    assert_eq!(h.wire.closes(), 1);

    let snap = h.handle.snapshot().await.unwrap();
    assert_eq!(snap.connection, ConnState::Closed);

    let id = h.handle.connect().await.unwrap();
    assert_eq!(id, ConnectionId(2));
    assert_eq!(h.wire.connects(), 2);
}

#[tokio::test]
async fn spawn_rejects_invalid_config() {
    let cfg = ClientConfig {
        version: 7,
        ..ClientConfig::default()
    };
    assert_eq!(
        parley_client::spawn(cfg).map(|_| ()).unwrap_err(),
        ChatError::UnsupportedVersion
    );
}
