//! Protocol modules (envelope model + text framing).
//!
//! - `envelope`: the JSON `Envelope { metadata, channel, action }` and its payloads.
//! - `frame`: newline-delimited batching of documents inside one text frame.
//!
//! All decoders are panic-free: malformed input is reported as `ChatError`
//! so one bad document never takes down the session.

pub mod envelope;
pub mod frame;

pub use envelope::{Action, Channel, Envelope, EnvelopeBuilder, Message};
