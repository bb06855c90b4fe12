//! Configuration module for simtrace-rs
//!
//! This module handles application configuration including:
//! - Where simulation output lives and which file to pick per category
//! - Decoding preferences (byte order, default time variables)
//! - Logging settings
//!
//! # Config Location
//!
//! The default config file is stored in the platform-appropriate location:
//! - **Linux**: `~/.config/simtrace-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/simtrace-rs/config.toml`
//! - **Windows**: `%APPDATA%\simtrace-rs\config.toml`
//!
//! Every field has a default, so a partial (or missing) file is fine.
//!
//! # Example
//!
//! ```toml
//! [data]
//! data_dir = "/scratch/run-42"
//!
//! [decode]
//! byte_order = "big"
//! event_time_variable = "virtual_receive"
//!
//! [logging]
//! filter = "warn,simtrace_rs=info"
//! ```

use crate::catalog::DataCategory;
use crate::error::{Result, TraceError};
use crate::types::ByteOrder;
use crate::window::TimeVariable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "simtrace-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default data directory, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,simtrace_rs=debug";

/// Get the path of the default config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub decode: DecodeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TraceError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            TraceError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load a config file, returning defaults if it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TraceError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TraceError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            TraceError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}

/// Location of simulation output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root directory holding one subdirectory per category
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Preferred file per category when none is selected explicitly
    #[serde(default)]
    pub default_files: DefaultFiles,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_files: DefaultFiles::default(),
        }
    }
}

impl DataConfig {
    /// Configured default file for a category
    pub fn default_file(&self, category: DataCategory) -> &str {
        match category {
            DataCategory::Simulations => &self.default_files.simulations,
            DataCategory::Events => &self.default_files.events,
            DataCategory::Models => &self.default_files.models,
        }
    }
}

/// Default file name per data category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultFiles {
    #[serde(default = "default_simulations_file")]
    pub simulations: String,

    #[serde(default = "default_events_file")]
    pub events: String,

    #[serde(default = "default_models_file")]
    pub models: String,
}

fn default_simulations_file() -> String {
    DataCategory::Simulations.default_file().to_string()
}

fn default_events_file() -> String {
    DataCategory::Events.default_file().to_string()
}

fn default_models_file() -> String {
    DataCategory::Models.default_file().to_string()
}

impl Default for DefaultFiles {
    fn default() -> Self {
        Self {
            simulations: default_simulations_file(),
            events: default_events_file(),
            models: default_models_file(),
        }
    }
}

/// How traces are decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeConfig {
    #[serde(default)]
    pub byte_order: ByteOrderPreference,

    #[serde(default = "default_event_time_variable")]
    pub event_time_variable: TimeVariable,

    #[serde(default = "default_sample_time_variable")]
    pub model_time_variable: TimeVariable,

    #[serde(default = "default_sample_time_variable")]
    pub engine_time_variable: TimeVariable,
}

fn default_event_time_variable() -> TimeVariable {
    TimeVariable::VirtualSend
}

fn default_sample_time_variable() -> TimeVariable {
    TimeVariable::VirtualTime
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrderPreference::default(),
            event_time_variable: default_event_time_variable(),
            model_time_variable: default_sample_time_variable(),
            engine_time_variable: default_sample_time_variable(),
        }
    }
}

/// Byte order to decode with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrderPreference {
    /// Infer from the first header of each file
    #[default]
    Auto,
    Little,
    Big,
    /// Host byte order
    Native,
}

impl ByteOrderPreference {
    /// The forced order, or `None` to infer
    pub fn resolve(&self) -> Option<ByteOrder> {
        match self {
            ByteOrderPreference::Auto => None,
            ByteOrderPreference::Little => Some(ByteOrder::Little),
            ByteOrderPreference::Big => Some(ByteOrder::Big),
            ByteOrderPreference::Native => Some(ByteOrder::NATIVE),
        }
    }
}

impl std::fmt::Display for ByteOrderPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteOrderPreference::Auto => write!(f, "auto"),
            ByteOrderPreference::Little => write!(f, "little"),
            ByteOrderPreference::Big => write!(f, "big"),
            ByteOrderPreference::Native => write!(f, "native"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Also write daily-rotated log files here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            log_dir: None,
        }
    }
}
