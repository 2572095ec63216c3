// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const ENV_PATH: &str = "RELAY_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/relay.toml";

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_queue_cap() -> usize {
    16
}

/// Static service configuration. Secrets (webhook url, SMTP credentials)
/// stay in the environment; see the notify module.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Accounts tracked for live status transitions.
    #[serde(default)]
    pub live_uids: Vec<u64>,
    /// Accounts tracked for new dynamic posts.
    #[serde(default)]
    pub space_uids: Vec<u64>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_queue_cap")]
    pub queue_cap: usize,
    /// Prometheus exporter listen address, e.g. "127.0.0.1:9000";
    /// unset disables the exporter.
    #[serde(default)]
    pub metrics_listen: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            live_uids: Vec::new(),
            space_uids: Vec::new(),
            poll_interval_secs: default_poll_interval_secs(),
            queue_cap: default_queue_cap(),
            metrics_listen: None,
        }
    }
}

impl RelayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

pub fn load_from(path: &Path) -> Result<RelayConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Load configuration using env var + fallbacks:
/// 1) $RELAY_CONFIG_PATH
/// 2) config/relay.toml
/// 3) built-in defaults (no tracked accounts)
pub fn load_default() -> Result<RelayConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        }
        return Err(anyhow!("RELAY_CONFIG_PATH points to non-existent path"));
    }
    let default = PathBuf::from(DEFAULT_PATH);
    if default.exists() {
        return load_from(&default);
    }
    Ok(RelayConfig::default())
}
