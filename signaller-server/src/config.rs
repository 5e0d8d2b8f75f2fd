use anyhow::{Context, Result, bail};
use serde::Deserialize;
use signaller_core::EnvelopeKeys;
use std::net::SocketAddr;
use std::path::Path;

/// Relay configuration. Every field has a default, so a config file may set any subset.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub envelope: EnvelopeKeys,
    /// Bounded command queue of each room task.
    pub room_queue_capacity: usize,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            envelope: EnvelopeKeys::default(),
            room_queue_capacity: 100,
            log_level: "info".to_owned(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.envelope.validate()?;
        if self.room_queue_capacity == 0 {
            bail!("room_queue_capacity must be at least 1");
        }
        Ok(())
    }
}
