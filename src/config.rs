// src/config.rs

//! Configuration for the `surface-bridge` demo binary.
//!
//! Settings are deserialized from a JSON file. Every struct carries `#[serde(default)]`, so a
//! file only needs the keys it wants to override. Library types never read `CONFIG`;
//! the binary reads it once and passes values down explicitly.

use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "SURFACE_BRIDGE_CONFIG";

/// Process-wide configuration, loaded on first access.
pub static CONFIG: Lazy<Config> = Lazy::new(load);

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

/// Initial window parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Display to connect to. `None` uses `$DISPLAY`.
    pub display: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "surface-bridge".to_string(),
            width: 800,
            height: 600,
            display: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Minimum time between two presented frames. Invalidations arriving sooner are
    /// coalesced into the next frame. 0 paints as soon as anything is dirty.
    pub min_frame_interval_ms: u64,
    /// Clear colour of the demo painter, 0xRRGGBB.
    pub background: u32,
}

impl RenderConfig {
    pub fn min_frame_interval(&self) -> Duration {
        Duration::from_millis(self.min_frame_interval_ms)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            min_frame_interval_ms: 16, // ~60 Hz
            background: 0x1d1f21,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            default_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Loads from the file named by `SURFACE_BRIDGE_CONFIG`, falling back to defaults.
///
/// Runs before the logger may be initialised, so failures are also reported on stderr.
pub fn load() -> Config {
    let Some(path) = std::env::var_os(CONFIG_PATH_ENV) else {
        return Config::default();
    };
    let path = Path::new(&path);
    match Config::from_file(path) {
        Ok(config) => {
            info!("Loaded configuration from {}", path.display());
            config
        }
        Err(e) => {
            eprintln!(
                "surface-bridge: ignoring config {}: {}; using defaults",
                path.display(),
                e
            );
            warn!("Ignoring config {}: {}; using defaults", path.display(), e);
            Config::default()
        }
    }
}
