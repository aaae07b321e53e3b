//! parley core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the wire-level contracts and error surface shared by the
//! client runtime and its tests. It carries no transport or runtime
//! dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `ChatError`/`Result` so a malformed server
//! document never crashes the client.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ChatError, Result};
