use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default seconds between polls of the level file.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
/// Shortest permitted poll interval.
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Top-level configuration loaded from `~/.daywatch/config.toml`.
///
/// Command-line flags override anything set here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub motd: MotdConfig,
}

impl Config {
    /// Load config from the default path, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(cfg)
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".daywatch")
            .join("config.toml")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between polls. Values below the minimum are clamped up.
    #[serde(default = "default_interval")]
    pub interval_secs: i64,
    /// Suppress the terminal bell on day changes.
    #[serde(default)]
    pub mute: bool,
}

impl WatchConfig {
    /// The interval actually used by the poll loop, clamped to the minimum.
    pub fn effective_interval_secs(&self) -> u64 {
        if self.interval_secs < MIN_INTERVAL_SECS as i64 {
            warn!(
                configured = self.interval_secs,
                clamped = MIN_INTERVAL_SECS,
                "poll interval below minimum, clamping"
            );
            MIN_INTERVAL_SECS
        } else {
            self.interval_secs as u64
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            mute: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MotdConfig {
    /// Path to a `<day>,<message>` file; no table is built when unset.
    #[serde(default)]
    pub path: Option<String>,
    /// Display template recognising `%MOTD%` and `%ESC%` tokens.
    #[serde(default)]
    pub format: Option<String>,
    /// Announce a message only on its exact scheduled day.
    #[serde(default)]
    pub fresh_only: bool,
}

fn default_interval() -> i64 {
    DEFAULT_INTERVAL_SECS as i64
}

/// Parse a raw interval string from the command line.
///
/// Numeric values are clamped to the minimum; anything unparseable keeps
/// the default with a warning rather than aborting.
pub fn coerce_interval(raw: &str) -> u64 {
    match raw.trim().parse::<i64>() {
        Ok(secs) => secs.max(MIN_INTERVAL_SECS as i64) as u64,
        Err(_) => {
            warn!(value = raw, "bad interval value, keeping default");
            DEFAULT_INTERVAL_SECS
        }
    }
}
