//! Bot configuration file (TOML)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Contents of `remora.toml`.
#[derive(Debug, Deserialize)]
pub struct BotConfig {
    /// Discord bot token.
    pub discord_token: String,
    /// Where per-owner reminder files live. Defaults to `~/remora/reminders`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Default tracing filter, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl BotConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
