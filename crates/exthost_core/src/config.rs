//! Host configuration store boundary.
//!
//! The subsystem reads one required value from host configuration — the
//! external-tools directory — plus the logging knobs the ambient stack
//! needs. Configuration lives in a TOML file owned by the host.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Host configuration consumed by the tool subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostConfig {
    /// Directory scanned for external tool modules.
    pub tools_dir: PathBuf,
    /// Log level passed to the logging bootstrap.
    #[serde(default = "default_level_string")]
    pub log_level: String,
    /// Log directory; `None` leaves logging uninitialized.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_level_string() -> String {
    default_log_level().to_string()
}

impl HostConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            detail: err.to_string(),
        })?;
        Self::parse(&text).map_err(|detail| ConfigError::Parse {
            path: path.display().to_string(),
            detail,
        })
    }

    /// Parses configuration from TOML text.
    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }
}

/// Configuration load/parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Read { path: String, detail: String },
    Parse { path: String, detail: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, detail } => {
                write!(f, "cannot read config file `{path}`: {detail}")
            }
            Self::Parse { path, detail } => {
                write!(f, "cannot parse config file `{path}`: {detail}")
            }
        }
    }
}

impl Error for ConfigError {}
