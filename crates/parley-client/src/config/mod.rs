//! Client config loader (strict parsing).

pub mod schema;

use std::fs;

use parley_core::error::{ChatError, Result};

pub use schema::{ClientConfig, IdentitySection, QueueSection, ReconnectSection, ServerSection};

pub fn load_from_file(path: &str) -> Result<ClientConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ChatError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| ChatError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
