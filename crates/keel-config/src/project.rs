//! Project Configuration (keel.toml)
//!
//! Handles project-level settings stored in `keel.toml` at the workspace root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Project configuration from keel.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Link pass settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkConfig>,

    /// Dependency graph dump settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump: Option<DumpConfig>,
}

/// Link pass configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    /// Link configurations on a worker pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multithreaded: Option<bool>,

    /// Worker count (default: rayon's choice)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,

    /// Reject cyclic dependency chains while linking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_cycles: Option<bool>,
}

/// Output format of the dependency graph dump
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    /// Machine readable node/edge listing
    Json,
    /// Graphviz
    #[default]
    Dot,
}

impl DumpFormat {
    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Dot => "dot",
        }
    }
}

impl fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Dependency graph dump configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DumpConfig {
    /// Record and write the declared dependency graph
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<DumpFormat>,

    /// Output file (default: "dependencies.<format>")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load project configuration from a file
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

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(link) = &self.link {
            if link.threads == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "link.threads".to_string(),
                    reason: "thread count must be at least 1".to_string(),
                });
            }
        }

        if let Some(dump) = &self.dump {
            if let Some(path) = &dump.path {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidPath(path.clone()));
                }
            }
        }

        Ok(())
    }

    /// Whether linking runs on a worker pool, if specified
    pub fn multithreaded(&self) -> Option<bool> {
        self.link.as_ref().and_then(|l| l.multithreaded)
    }

    /// Worker count, if specified
    pub fn threads(&self) -> Option<usize> {
        self.link.as_ref().and_then(|l| l.threads)
    }

    /// Strict cycle checking, if specified
    pub fn strict_cycles(&self) -> Option<bool> {
        self.link.as_ref().and_then(|l| l.strict_cycles)
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        if let Some(other) = &other.link {
            let link = self.link.get_or_insert_with(LinkConfig::default);
            link.multithreaded = other.multithreaded.or(link.multithreaded);
            link.threads = other.threads.or(link.threads);
            link.strict_cycles = other.strict_cycles.or(link.strict_cycles);
        }
        if let Some(other) = &other.dump {
            let dump = self.dump.get_or_insert_with(DumpConfig::default);
            dump.enabled = other.enabled.or(dump.enabled);
            dump.format = other.format.or(dump.format);
            dump.path = other.path.clone().or_else(|| dump.path.take());
        }
    }
}
