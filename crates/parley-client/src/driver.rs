//! Session driver: runs one [`ChatSession`] on a tokio task.
//!
//! Transport events and user commands are processed strictly one at a time by
//! a `select!` loop, so session state never needs a lock. Handles talk to the
//! task over an mpsc command queue with oneshot replies.

use tokio::sync::{mpsc, oneshot};

use parley_core::error::{ChatError, Result};
use parley_core::protocol::envelope::Message;

use crate::auth::{AuthGrant, AuthState, PendingLogin};
use crate::config::{ClientConfig, QueueSection};
use crate::connection::{ConnState, ConnectionId, Dispatch, LinkEvent};
use crate::events::SessionEvent;
use crate::session::ChatSession;
use crate::transport::WsConnector;

enum Command {
    Connect {
        reply: oneshot::Sender<Result<ConnectionId>>,
    },
    Login {
        username: String,
        password: String,
        reply: oneshot::Sender<PendingLogin>,
    },
    Logout {
        reply: oneshot::Sender<()>,
    },
    SwitchTo {
        channel: String,
        reply: oneshot::Sender<Result<Dispatch>>,
    },
    CreateChannel {
        channel: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    RequestList {
        reply: oneshot::Sender<Result<()>>,
    },
    SendMessage {
        text: String,
        reply: oneshot::Sender<Result<Message>>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// Point-in-time copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub auth: AuthState,
    pub connection: ConnState,
    pub current_channel: String,
    pub known_channels: Vec<String>,
}

/// Cloneable front door to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ChatError::Internal("session task stopped".into()))?;
        rx.await
            .map_err(|_| ChatError::Internal("session task dropped the request".into()))
    }

    pub async fn connect(&self) -> Result<ConnectionId> {
        self.request(|reply| Command::Connect { reply }).await?
    }

    /// Resolves once the server answers, the transport fails, or a newer login supersedes this one.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthGrant> {
        let pending = self
            .request(|reply| Command::Login {
                username: username.to_string(),
                password: password.to_string(),
                reply,
            })
            .await?;
        pending.await
    }

    pub async fn logout(&self) -> Result<()> {
        self.request(|reply| Command::Logout { reply }).await
    }

    pub async fn switch_to(&self, channel: &str) -> Result<Dispatch> {
        self.request(|reply| Command::SwitchTo {
            channel: channel.to_string(),
            reply,
        })
        .await?
    }

    pub async fn create_channel(&self, channel: &str) -> Result<bool> {
        self.request(|reply| Command::CreateChannel {
            channel: channel.to_string(),
            reply,
        })
        .await?
    }

    pub async fn request_list(&self) -> Result<()> {
        self.request(|reply| Command::RequestList { reply }).await?
    }

    pub async fn send_message(&self, text: &str) -> Result<Message> {
        self.request(|reply| Command::SendMessage {
            text: text.to_string(),
            reply,
        })
        .await?
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn close(&self) -> Result<()> {
        self.request(|reply| Command::Close { reply }).await
    }
}

/// Validate `cfg`, wire a WebSocket connector and start the session task.
/// Must be called from within a tokio runtime.
pub fn spawn(cfg: ClientConfig) -> Result<(SessionHandle, mpsc::Receiver<SessionEvent>)> {
    cfg.validate()?;

    let (link_tx, link_rx) = mpsc::channel(cfg.queues.event_buffer);
    let connector = WsConnector::new(link_tx, cfg.reconnect.clone(), cfg.queues.outbound_buffer);
    let session = ChatSession::new(&cfg, Box::new(connector));

    tracing::info!(endpoint = %cfg.endpoint(), "chat session starting");
    Ok(spawn_with(session, link_rx, &cfg.queues))
}

/// Start the session task over an already-built session. `link_rx` must carry
/// the events of the session's connector.
pub fn spawn_with(
    session: ChatSession,
    link_rx: mpsc::Receiver<LinkEvent>,
    queues: &QueueSection,
) -> (SessionHandle, mpsc::Receiver<SessionEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(queues.command_buffer.max(1));
    let (event_tx, event_rx) = mpsc::channel(queues.event_buffer.max(1));

    tokio::spawn(run(session, cmd_rx, link_rx, event_tx));

    (SessionHandle { tx: cmd_tx }, event_rx)
}

async fn run(
    mut session: ChatSession,
    mut commands: mpsc::Receiver<Command>,
    mut link_rx: mpsc::Receiver<LinkEvent>,
    events: mpsc::Sender<SessionEvent>,
) {
    loop {
        tokio::select! {
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break; };
                apply(&mut session, cmd);
            }

            ev = link_rx.recv() => {
                let Some(ev) = ev else { break; };
                session.handle_link_event(ev);
            }
        }

        forward(&mut session, &events);
    }

    session.close();
    forward(&mut session, &events);
    tracing::info!("chat session stopped");
}

fn apply(session: &mut ChatSession, cmd: Command) {
    // A dropped reply receiver only means the caller stopped waiting.
    match cmd {
        Command::Connect { reply } => {
            let _ = reply.send(session.ensure_connection());
        }
        Command::Login {
            username,
            password,
            reply,
        } => {
            let _ = reply.send(session.login(&username, &password));
        }
        Command::Logout { reply } => {
            session.logout();
            let _ = reply.send(());
        }
        Command::SwitchTo { channel, reply } => {
            let _ = reply.send(session.switch_to(&channel));
        }
        Command::CreateChannel { channel, reply } => {
            let _ = reply.send(session.create_channel(&channel));
        }
        Command::RequestList { reply } => {
            let _ = reply.send(session.request_list());
        }
        Command::SendMessage { text, reply } => {
            let _ = reply.send(session.send_chat_message(&text));
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(Snapshot {
                auth: session.auth_state().clone(),
                connection: session.connection_state(),
                current_channel: session.current_channel().to_string(),
                known_channels: session.known_channels().to_vec(),
            });
        }
        Command::Close { reply } => {
            session.close();
            let _ = reply.send(());
        }
    }
}

fn forward(session: &mut ChatSession, events: &mpsc::Sender<SessionEvent>) {
    for ev in session.drain_events() {
        match events.try_send(ev) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(ev)) => {
                tracing::warn!(?ev, "event queue full; event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
