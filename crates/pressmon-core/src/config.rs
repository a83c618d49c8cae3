//! Monitor configuration
//!
//! A single configuration record persisted as JSON under a fixed key. It is
//! read once at startup and rewritten on every change. Corrupt storage is
//! discarded in favour of defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage key of the configuration record
pub const CONFIG_KEY: &str = "monitor_config";

/// Default log ring size
pub const DEFAULT_LOG_LIMIT: usize = 200;

/// Errors writing the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No platform config directory
    #[error("Config directory not found")]
    NoConfigDir,

    /// Config file is not valid JSON
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Reading or writing the config file failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// `set` was given a key outside [`MonitorConfig::KEYS`]
    #[error("Unknown config key '{0}'")]
    UnknownKey(String),

    /// `set` could not parse the value
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue {
        /// Key being set
        key: String,
        /// Rejected text
        value: String,
    },
}

/// Persisted monitor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Streaming endpoint
    pub ws_url: String,
    /// Base URL of the collection service
    pub api_url: String,
    /// Serial port used when starting a hardware collection
    pub serial_port: String,
    /// Baud rate for the serial collection
    pub baud_rate: u32,
    /// Device id announced when starting a serial collection
    pub device_id: String,
    /// Connect to the stream as soon as the monitor mounts
    pub auto_connect: bool,
    /// Reopen the stream after it closes
    pub auto_reconnect: bool,
    /// Number of log lines kept
    pub log_limit: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:4000/sensor/ws".to_string(),
            api_url: "http://localhost:4000".to_string(),
            serial_port: "/dev/tty.usbserial-10".to_string(),
            baud_rate: 9600,
            device_id: "sim-arduino-01".to_string(),
            auto_connect: true,
            auto_reconnect: true,
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }
}

impl MonitorConfig {
    /// Field names accepted by [`MonitorConfig::set`]
    pub const KEYS: [&'static str; 8] = [
        "ws_url",
        "api_url",
        "serial_port",
        "baud_rate",
        "device_id",
        "auto_connect",
        "auto_reconnect",
        "log_limit",
    ];

    /// Log limit with a floor of one line
    pub fn effective_log_limit(&self) -> usize {
        self.log_limit.max(1)
    }

    /// Set one field from its textual form, as typed on the settings page
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();

        match key {
            "ws_url" => self.ws_url = value.to_string(),
            "api_url" => self.api_url = value.to_string(),
            "serial_port" => self.serial_port = value.to_string(),
            "device_id" => self.device_id = value.to_string(),
            "baud_rate" => self.baud_rate = value.parse().map_err(|_| invalid())?,
            "auto_connect" => self.auto_connect = parse_flag(value).ok_or_else(invalid)?,
            "auto_reconnect" => self.auto_reconnect = parse_flag(value).ok_or_else(invalid)?,
            "log_limit" => {
                let limit: usize = value.parse().map_err(|_| invalid())?;
                if limit == 0 {
                    return Err(invalid());
                }
                self.log_limit = limit;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Durable key-value home of the configuration record
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Store rooted at the platform config directory
    pub fn default_location() -> Result<Self, ConfigError> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::at(base.join("PressMon")))
    }

    /// Store rooted at an explicit directory
    pub fn at<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the persisted record
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{CONFIG_KEY}.json"))
    }

    /// Read the stored config. Missing or corrupt data yields defaults.
    pub fn load(&self) -> MonitorConfig {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return MonitorConfig::default(),
            Err(e) => {
                tracing::warn!("Config storage unreadable ({}), using defaults: {e}", path.display());
                return MonitorConfig::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Config storage corrupted, using defaults: {e}");
                MonitorConfig::default()
            }
        }
    }

    /// Persist the whole record
    pub fn save(&self, config: &MonitorConfig) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(config)?;
        fs::write(self.path(), json)?;
        Ok(())
    }

    /// Apply a change and rewrite storage
    pub fn update<F>(&self, config: &mut MonitorConfig, change: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut MonitorConfig),
    {
        change(config);
        self.save(config)
    }
}
