use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use parley_core::error::{ChatError, Result};
use parley_core::protocol::envelope::{Action, AuthData, Envelope, EnvelopeBuilder};
use parley_core::protocol::frame;

use crate::connection::{ConnectionManager, DeferKey, Dispatch};
use crate::dispatch::{ConsumerId, Router, Slot};

/// Login state. Owned by [`AuthSession`]; read by the channel controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticating(String),
    Authenticated(String),
}

impl AuthState {
    /// Username once authenticated.
    pub fn username(&self) -> Option<&str> {
        match self {
            AuthState::Authenticated(u) => Some(u),
            _ => None,
        }
    }

    pub fn is_authenticating(&self) -> bool {
        matches!(self, AuthState::Authenticating(_))
    }
}

/// Successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub username: String,
    /// Server-supplied greeting (may be empty).
    pub message: String,
}

pub type LoginResult = Result<AuthGrant>;

/// Resolves exactly once per `login()` call.
#[derive(Debug)]
pub struct PendingLogin {
    rx: oneshot::Receiver<LoginResult>,
}

impl PendingLogin {
    /// Non-blocking check. The outcome can be taken once.
    pub fn try_outcome(&mut self) -> Option<LoginResult> {
        match self.rx.try_recv() {
            Ok(r) => Some(r),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ChatError::Cancelled)),
        }
    }
}

impl Future for PendingLogin {
    type Output = LoginResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or_else(|_| Err(ChatError::Cancelled)))
    }
}

struct Attempt {
    consumer: ConsumerId,
    username: String,
    /// Sent on a link that has since dropped.
    stale: bool,
    reply: oneshot::Sender<LoginResult>,
}

/// One login handshake at a time over the shared connection.
///
/// Replies carry no request id. The server answers requests in order, so
/// `orphaned` counts replies still owed to superseded attempts; those reach
/// the auth slot first and are absorbed.
#[derive(Default)]
pub struct AuthSession {
    state: AuthState,
    attempt: Option<Attempt>,
    orphaned: usize,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Start a handshake. An attempt already in flight is superseded: it resolves
    /// with `AlreadyInFlight` and its eventual server reply is absorbed.
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        router: &mut Router,
        conn: &mut ConnectionManager,
        builder: &EnvelopeBuilder,
    ) -> PendingLogin {
        let (tx, rx) = oneshot::channel();

        if let Some(prev) = self.attempt.take() {
            // a still-deferred request is replaced below and never answered
            if !prev.stale && !conn.has_deferred(DeferKey::Auth) {
                self.orphaned += 1;
            }
            tracing::info!(prev = %prev.username, next = %username, orphaned = self.orphaned, "login attempt superseded");
            let _ = prev.reply.send(Err(ChatError::AlreadyInFlight));
        }

        self.state = AuthState::Authenticating(username.to_string());
        let consumer = router.register(Slot::Auth);
        self.attempt = Some(Attempt {
            consumer,
            username: username.to_string(),
            stale: false,
            reply: tx,
        });

        let sent = conn.ensure_connection().and_then(|_| {
            let text = frame::encode(&builder.user_auth(username, password))?;
            conn.send_or_defer(DeferKey::Auth, text)
        });

        match sent {
            Ok(Dispatch::Sent) => tracing::debug!(user = %username, "auth request sent"),
            Ok(Dispatch::Deferred) => {
                tracing::debug!(user = %username, "auth request waiting for open")
            }
            Err(e) => {
                tracing::warn!(user = %username, error = %e, "auth request failed");
                self.settle(&Err(e), router);
            }
        }

        PendingLogin { rx }
    }

    /// Auth-slot delivery. Returns the outcome when it settled the current attempt.
    pub fn handle_response(
        &mut self,
        consumer: ConsumerId,
        doc: &str,
        router: &mut Router,
    ) -> Option<LoginResult> {
        let Some(attempt) = &self.attempt else {
            tracing::debug!("auth response without pending attempt absorbed");
            return None;
        };
        if attempt.consumer != consumer {
            tracing::debug!("auth response for superseded attempt absorbed");
            return None;
        }
        if self.orphaned > 0 {
            self.orphaned -= 1;
            tracing::debug!(remaining = self.orphaned, "reply to superseded login absorbed");
            return None;
        }

        let outcome = match frame::decode(doc) {
            Ok(Envelope {
                action: Action::UserAuth(AuthData::Response(r)),
                ..
            }) => {
                if let Some(u) = r.username.as_deref().filter(|u| !u.is_empty()) {
                    if u != attempt.username {
                        tracing::debug!(reply = %u, pending = %attempt.username, "auth response for another user absorbed");
                        return None;
                    }
                }
                if r.success {
                    let username = r
                        .username
                        .filter(|u| !u.is_empty())
                        .unwrap_or_else(|| attempt.username.clone());
                    Ok(AuthGrant {
                        username,
                        message: r.message,
                    })
                } else {
                    Err(ChatError::AuthRejected(r.message))
                }
            }
            Ok(_) => Err(ChatError::MalformedResponse(
                "user_auth document without a response payload".into(),
            )),
            Err(e) => Err(e),
        };

        self.settle(&outcome, router);
        Some(outcome)
    }

    /// Transport error: fails the pending attempt, if any.
    pub fn handle_transport_error(
        &mut self,
        detail: &str,
        router: &mut Router,
        conn: &mut ConnectionManager,
    ) -> Option<LoginResult> {
        self.attempt.as_ref()?;
        conn.cancel_deferred(DeferKey::Auth);
        let outcome = Err(ChatError::Transport(format!("connection error: {detail}")));
        self.settle(&outcome, router);
        Some(outcome)
    }

    /// The link dropped: replies to requests already on the wire will not arrive.
    pub fn on_disconnect(&mut self, conn: &ConnectionManager) {
        self.orphaned = 0;
        if let Some(attempt) = &mut self.attempt {
            attempt.stale = !conn.has_deferred(DeferKey::Auth);
        }
    }

    /// Back to `Anonymous`; releases the auth slot. The connection is left alone.
    pub fn logout(&mut self, router: &mut Router, conn: &mut ConnectionManager) {
        conn.cancel_deferred(DeferKey::Auth);
        if self.attempt.is_some() {
            self.settle(&Err(ChatError::Cancelled), router);
        }
        router.clear(Slot::Auth);
        self.state = AuthState::Anonymous;
    }

    /// Apply `outcome` to the current attempt and hand it to the caller's future.
    fn settle(&mut self, outcome: &LoginResult, router: &mut Router) {
        self.orphaned = 0;
        let Some(attempt) = self.attempt.take() else {
            return;
        };
        router.deregister(Slot::Auth, attempt.consumer);

        match outcome {
            Ok(grant) => {
                tracing::info!(user = %grant.username, "authenticated");
                self.state = AuthState::Authenticated(grant.username.clone());
            }
            Err(e) => {
                tracing::info!(user = %attempt.username, code = e.client_code().as_str(), "login failed");
                self.state = AuthState::Anonymous;
            }
        }

        if attempt.reply.send(outcome.clone()).is_err() {
            tracing::debug!("login outcome dropped by caller");
        }
    }
}
