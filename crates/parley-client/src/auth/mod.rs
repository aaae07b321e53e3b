//! Auth session: the login handshake state machine.

mod session;

pub use session::{AuthGrant, AuthSession, AuthState, LoginResult, PendingLogin};
