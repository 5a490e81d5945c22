//! Application configuration
//!
//! Loaded from TOML. Every field has a default, so a missing file or a
//! partial one is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::protocol::MAX_CHUNK_SIZE;

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "STREAMER_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sender: SenderConfig,
    pub receiver: ReceiverConfig,
    pub streams: StreamsConfig,
}

/// Settings for one outbound stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Destination hostname or IP address
    pub host: String,
    /// Destination UDP port
    pub port: u16,
    /// Bytes read from the source per datagram
    pub chunk_size: usize,
    /// Rate ceiling in bytes per millisecond
    pub max_bytes_per_ms: f64,
    /// Fixed pause applied when the ceiling is exceeded
    pub throttle_delay_ms: u64,
    /// Kernel send buffer size (SO_SNDBUF)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_buffer_size: Option<usize>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_UDP_PORT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_bytes_per_ms: DEFAULT_MAX_BYTES_PER_MS,
            throttle_delay_ms: DEFAULT_THROTTLE_DELAY_MS,
            send_buffer_size: None,
        }
    }
}

impl SenderConfig {
    pub fn new(host: impl Into<String>, port: u16, chunk_size: usize) -> Self {
        Self {
            host: host.into(),
            port,
            chunk_size,
            ..Default::default()
        }
    }

    pub fn throttle_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_delay_ms)
    }

    /// Check the settings before any socket or file is touched
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".into());
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(format!(
                "chunk_size {} does not fit one datagram (max {})",
                self.chunk_size, MAX_CHUNK_SIZE
            ));
        }
        if self.port == 0 {
            return Err("port must be in 1..=65535".into());
        }
        if !(self.max_bytes_per_ms > 0.0) {
            return Err(format!(
                "max_bytes_per_ms must be positive, got {}",
                self.max_bytes_per_ms
            ));
        }
        Ok(())
    }
}

/// Settings for one inbound listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Local UDP port to listen on (0 picks an ephemeral port)
    pub port: u16,
    /// Give up when no datagram arrives for this long
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_ms: Option<u64>,
    /// Kernel receive buffer size (SO_RCVBUF)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recv_buffer_size: Option<usize>,
    /// Receive buffer length; longer datagrams are truncated by the OS
    pub max_datagram_size: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_UDP_PORT,
            idle_timeout_ms: None,
            recv_buffer_size: None,
            max_datagram_size: crate::protocol::MAX_DATAGRAM_SIZE,
        }
    }
}

impl ReceiverConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }
}

/// Settings for a multi-file run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamsConfig {
    /// Directory searched recursively for sources
    pub source_dir: PathBuf,
    /// File extension of sources, without the dot
    pub extension: String,
    /// Overall deadline for all streams to finish
    pub run_timeout_secs: u64,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
        }
    }
}

impl StreamsConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

impl AppConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.sender.validate().map_err(Error::Config)?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Load from `$STREAMER_CONFIG` or the platform config directory,
    /// falling back to defaults when no file exists
    pub fn load_or_default() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Resolved config file location
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("", "", "udp-audio-streamer")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
