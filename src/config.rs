use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::event::DeviceId;

/// Main pktelog configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Attach a real transport at startup; otherwise the dummy stays bound
    pub enabled: bool,
    pub device_id: DeviceId,
    pub log_level: LogLevel,
    pub transport: TransportConfig,
    pub tap: TapConfig,
}

/// Where the logger publishes
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Discard everything
    Dummy,
    /// One datagram per event to a collector
    Udp { address: String },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TapConfig {
    /// Address the `tap` command listens on
    pub listen: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    pub fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9555";

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Udp {
            address: DEFAULT_ADDRESS.to_string(),
        }
    }
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_ADDRESS.to_string(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // An explicit path must load
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        if let Ok(env_path) = std::env::var("PKTELOG_CONFIG") {
            let path = Self::expand_path(Path::new(&env_path));
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => log::warn!("Failed to load config from PKTELOG_CONFIG: {}", e),
                }
            }
        }

        let mut candidates = vec![Self::config_dir().join("pktelog.yaml")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("pktelog").join("pktelog.yaml"));
        }
        candidates.push(PathBuf::from("pktelog.yaml"));
        candidates.dedup();

        for path in candidates {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => log::warn!("Failed to load config from {}: {}", path.display(), e),
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Directory holding pktelog.yaml (`PKTELOG_DIR` or the user config dir)
    pub fn config_dir() -> PathBuf {
        std::env::var("PKTELOG_DIR")
            .map(|dir| Self::expand_path(Path::new(&dir)))
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("pktelog"))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}
