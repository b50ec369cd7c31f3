use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Runtime knobs loaded from `tailscope.toml`
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Backlog lines requested when a live tail starts
    pub tail_backlog: u32,

    /// Pending lines that trigger a batch flush
    pub batch_max_lines: usize,

    /// Milliseconds between forced batch flushes
    pub batch_max_delay_ms: u64,

    /// Grace period for draining stream tasks on shutdown
    pub shutdown_grace_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tail_backlog: 100,
            batch_max_lines: 10,
            batch_max_delay_ms: 500,
            shutdown_grace_ms: 5000,
        }
    }
}

impl Config {
    /// Load from the given file, falling back to `tailscope.toml` in the
    /// working directory, then to defaults when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Path::new("tailscope.toml");
                if !default.exists() {
                    return Ok(Self::default());
                }
                default.to_path_buf()
            }
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }
}
