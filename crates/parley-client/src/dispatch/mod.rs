//! Message router exports.
//!
//! Splits inbound frames into documents and hands each one to exactly one of
//! the auth slot, the chat slot, or the discard path.

pub mod router;

pub use router::{ConsumerId, Delivery, Router, Slot};
