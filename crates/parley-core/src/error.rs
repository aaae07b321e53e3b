//! Shared error type across parley crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Shared connection absent or not open.
    NotConnected,
    /// A newer login attempt superseded this one.
    AlreadyInFlight,
    /// Chat operation before login.
    Unauthenticated,
    /// Empty chat message.
    EmptyMessage,
    /// Received document did not have the expected shape.
    MalformedResponse,
    /// Server refused the credentials.
    AuthRejected,
    /// Error surfaced by the underlying connection.
    TransportError,
    /// Pending operation cancelled locally (logout).
    Cancelled,
    /// Invalid input / config.
    BadRequest,
    /// Unsupported config or protocol version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and presentation.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::NotConnected => "NOT_CONNECTED",
            ClientCode::AlreadyInFlight => "ALREADY_IN_FLIGHT",
            ClientCode::Unauthenticated => "UNAUTHENTICATED",
            ClientCode::EmptyMessage => "EMPTY_MESSAGE",
            ClientCode::MalformedResponse => "MALFORMED_RESPONSE",
            ClientCode::AuthRejected => "AUTH_REJECTED",
            ClientCode::TransportError => "TRANSPORT_ERROR",
            ClientCode::Cancelled => "CANCELLED",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Unified error type used by core and client.
///
/// Every variant is recoverable at the component boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("not connected")]
    NotConnected,
    #[error("login already in flight")]
    AlreadyInFlight,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("message is empty")]
    EmptyMessage,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("cancelled")]
    Cancelled,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ChatError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ChatError::NotConnected => ClientCode::NotConnected,
            ChatError::AlreadyInFlight => ClientCode::AlreadyInFlight,
            ChatError::Unauthenticated => ClientCode::Unauthenticated,
            ChatError::EmptyMessage => ClientCode::EmptyMessage,
            ChatError::MalformedResponse(_) => ClientCode::MalformedResponse,
            ChatError::AuthRejected(_) => ClientCode::AuthRejected,
            ChatError::Transport(_) => ClientCode::TransportError,
            ChatError::Cancelled => ClientCode::Cancelled,
            ChatError::BadRequest(_) => ClientCode::BadRequest,
            ChatError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            ChatError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Text shown to the user. Server-supplied rejection messages pass through unchanged.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::NotConnected => "Not connected to server.".into(),
            ChatError::AlreadyInFlight => "Superseded by a newer login attempt".into(),
            ChatError::Unauthenticated => "Not logged in".into(),
            ChatError::EmptyMessage => "Message is empty".into(),
            ChatError::MalformedResponse(_) => "Error processing server response".into(),
            ChatError::AuthRejected(msg) if msg.is_empty() => "Authentication failed".into(),
            ChatError::AuthRejected(msg) => msg.clone(),
            ChatError::Transport(_) => "Connection error".into(),
            ChatError::Cancelled => "Login cancelled".into(),
            other => other.to_string(),
        }
    }
}

/// User-visible outcome: a success flag paired with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub success: bool,
    pub message: String,
}

impl Feedback {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn from_error(err: &ChatError) -> Self {
        Self {
            success: false,
            message: err.user_message(),
        }
    }
}
