use serde::Deserialize;
use parley_core::error::{ChatError, Result};

/// Well-known path of the realtime endpoint on the serving host.
pub const WS_PATH: &str = "/ws";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub identity: IdentitySection,

    #[serde(default)]
    pub reconnect: ReconnectSection,

    #[serde(default)]
    pub queues: QueueSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            identity: IdentitySection::default(),
            reconnect: ReconnectSection::default(),
            queues: QueueSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.identity.validate()?;
        self.reconnect.validate()?;
        self.queues.validate()?;

        Ok(())
    }

    /// `ws://<host>/ws` (or `wss://` when `server.secure`).
    pub fn endpoint(&self) -> String {
        let scheme = if self.server.secure { "wss" } else { "ws" };
        format!("{scheme}://{}{WS_PATH}", self.server.host)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub secure: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            secure: false,
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ChatError::BadRequest("server.host must not be empty".into()));
        }
        if host.contains("://") || host.contains('/') {
            return Err(ChatError::BadRequest(
                "server.host must be host[:port] without scheme or path".into(),
            ));
        }
        Ok(())
    }
}

/// How outbound envelopes describe this client in `metadata`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentitySection {
    #[serde(default = "default_node_id")]
    pub node_id: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            region: default_region(),
            protocol_version: default_protocol_version(),
        }
    }
}

impl IdentitySection {
    pub fn validate(&self) -> Result<()> {
        if self.node_id.trim().is_empty() {
            return Err(ChatError::BadRequest("identity.node_id must not be empty".into()));
        }
        if self.protocol_version.trim().is_empty() {
            return Err(ChatError::BadRequest(
                "identity.protocol_version must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Reconnect delay: `initial_delay_ms * decay^attempt`, capped at `max_delay_ms`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectSection {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_decay")]
    pub decay: f64,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            decay: default_decay(),
        }
    }
}

impl ReconnectSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60000).contains(&self.initial_delay_ms) {
            return Err(ChatError::BadRequest(
                "reconnect.initial_delay_ms must be between 100 and 60000".into(),
            ));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ChatError::BadRequest(
                "reconnect.max_delay_ms must be >= initial_delay_ms".into(),
            ));
        }
        if !(1.0..=10.0).contains(&self.decay) {
            return Err(ChatError::BadRequest(
                "reconnect.decay must be between 1.0 and 10.0".into(),
            ));
        }
        Ok(())
    }

    /// Delay before reconnect attempt `attempt` (0-based).
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let d = self.initial_delay_ms as f64 * self.decay.powi(exp);
        if d.is_finite() && d < self.max_delay_ms as f64 {
            d as u64
        } else {
            self.max_delay_ms
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueSection {
    /// Session events buffered for the presentation layer (lossy when full).
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Outbound frames buffered between the session and the socket writer.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,

    /// Commands buffered between handles and the session task.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

impl Default for QueueSection {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
            outbound_buffer: default_outbound_buffer(),
            command_buffer: default_command_buffer(),
        }
    }
}

impl QueueSection {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("queues.event_buffer", self.event_buffer),
            ("queues.outbound_buffer", self.outbound_buffer),
            ("queues.command_buffer", self.command_buffer),
        ] {
            if !(1..=65536).contains(&v) {
                return Err(ChatError::BadRequest(format!("{name} must be between 1 and 65536")));
            }
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1:8080".into()
}
fn default_node_id() -> String {
    "rust-client".into()
}
fn default_region() -> String {
    "local".into()
}
fn default_protocol_version() -> String {
    parley_core::protocol::envelope::PROTOCOL_VERSION.into()
}
fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    30000
}
fn default_decay() -> f64 {
    1.5
}
fn default_event_buffer() -> usize {
    1024
}
fn default_outbound_buffer() -> usize {
    256
}
fn default_command_buffer() -> usize {
    64
}
