//! Connection manager: the single shared connection and its lifecycle.
//!
//! Owns exactly one link at a time, tracks open/close from transport events,
//! and runs keyed one-shot continuations when the link (re)opens. Frames are
//! forwarded verbatim; nothing here parses them.

mod manager;

pub use manager::{
    ConnState, ConnectionId, ConnectionManager, Connector, DeferKey, Dispatch, Link, LinkEvent,
    TransportEvent,
};
