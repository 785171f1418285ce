//! Runtime configuration, loaded from a JSON file.
//!
//! Every section has defaults so a minimal config file (or none of a
//! section) still yields a working station.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// File read but not valid JSON for the schema.
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        /// Offending path
        path: PathBuf,
        /// Underlying decode failure
        source: serde_json::Error,
    },
}

/// Top-level station configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LockerConfig {
    /// Bearer store and overflow file locations.
    pub storage: StorageConfig,
    /// GPIO pin assignment (BCM numbering).
    pub gpio: GpioConfig,
    /// Anti-rebound dedup window.
    pub debounce: DebounceConfig,
    /// Actuator confirmation timing.
    pub actuator: ActuatorConfig,
    /// Profile page retrieval.
    pub http: HttpConfig,
}

impl LockerConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Data file locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// The bearer store document.
    pub database_file: PathBuf,
    /// Append-only file for ineligible student registrations.
    pub ineligible_students: PathBuf,
    /// Append-only file for ineligible staff registrations.
    pub ineligible_staff: PathBuf,
    /// Optional denylist file; absent means nothing is blocked.
    pub blocklist: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: PathBuf::from("data/bearers.json"),
            ineligible_students: PathBuf::from("data/ineligible-students.json"),
            ineligible_staff: PathBuf::from("data/ineligible-staff.json"),
            blocklist: None,
        }
    }
}

/// GPIO pin assignment, BCM numbering.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    /// Drive line A (energized to close).
    pub pin_a: u32,
    /// Drive line B (energized to open).
    pub pin_b: u32,
    /// Open limit switch input.
    pub sensor_open: u32,
    /// Closed limit switch input.
    pub sensor_closed: u32,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            pin_a: 17,
            pin_b: 27,
            sensor_open: 22,
            sensor_closed: 23,
        }
    }
}

/// Anti-rebound window settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Seconds two identical scans must be apart to both be processed.
    pub window_secs: u64,
    /// Per-generation capacity of the dedup map.
    pub max_entries: usize,
}

impl DebounceConfig {
    /// The window as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window_secs: 5,
            max_entries: 1024,
        }
    }
}

/// Actuator confirmation timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Seconds to wait for the limit sensors to confirm a motion.
    pub confirm_timeout_secs: u64,
    /// Milliseconds between sensor polls while confirming.
    pub poll_interval_ms: u64,
}

impl ActuatorConfig {
    /// Confirmation timeout as a `Duration`.
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: 8,
            poll_interval_ms: 50,
        }
    }
}

/// Profile page retrieval settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent sent to the portal.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Accept invalid TLS certificates. The credential portals serve
    /// certificates that fail verification, so this defaults to on.
    pub accept_invalid_certs: bool,
}

impl HttpConfig {
    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux armv7l) VeloBox/0.1".to_owned(),
            timeout_secs: 60,
            accept_invalid_certs: true,
        }
    }
}
