//! Transport layer (WebSocket).
//!
//! Provides the reconnecting link behind the connection manager's
//! [`Connector`](crate::connection::Connector) seam, and the codec that turns
//! socket messages into frame text once.

pub mod codec;
pub mod ws;

pub use ws::{WsConnector, WsLink};
