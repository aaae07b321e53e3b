//! parley client library entry.
//!
//! This crate wires the shared connection, the frame router, the login
//! handshake and the channel controller into one session context, and runs
//! it over a reconnecting WebSocket. Presentation layers consume it through
//! [`driver::spawn`] (async handle plus event stream) or drive a
//! [`session::ChatSession`] directly.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod auth;
pub mod channels;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod driver;
pub mod events;
pub mod obs;
pub mod session;
pub mod transport;

pub use driver::{spawn, spawn_with, SessionHandle, Snapshot};
pub use events::{ChatEvent, SessionEvent};
pub use session::ChatSession;
