//! Logging setup.
//!
//! Library code only emits `tracing` events; the embedding application picks
//! the subscriber. `init_logging` is the stock choice: fmt output filtered by
//! `RUST_LOG`.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a global fmt subscriber filtered by `RUST_LOG` (default `info`).
/// Returns `false` when a subscriber was already installed.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).try_init().is_ok()
}
