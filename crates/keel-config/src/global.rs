//! Global Configuration (~/.keel/config.toml)
//!
//! Handles user-level defaults stored in `~/.keel/config.toml`.

use crate::project::DumpFormat;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.keel/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default settings applied when a project does not override them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Link on a worker pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multithreaded: Option<bool>,

    /// Worker count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,

    /// Preferred dependency graph dump format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump_format: Option<DumpFormat>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(defaults) = &self.defaults {
            if defaults.threads == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "defaults.threads".to_string(),
                    reason: "thread count must be at least 1".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the global config file path (~/.keel/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".keel").join("config.toml"))
    }

    pub fn default_multithreaded(&self) -> Option<bool> {
        self.defaults.as_ref().and_then(|d| d.multithreaded)
    }

    pub fn default_threads(&self) -> Option<usize> {
        self.defaults.as_ref().and_then(|d| d.threads)
    }

    pub fn default_dump_format(&self) -> Option<DumpFormat> {
        self.defaults.as_ref().and_then(|d| d.dump_format)
    }
}
