//! Keel Configuration System
//!
//! Settings that drive a link pass over a workspace of project configurations:
//! - Project settings (keel.toml)
//! - Global user settings (~/.keel/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Settings are loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.keel/config.toml)
//! 2. Project config (./keel.toml)
//! 3. Environment variables (KEEL_*)
//! 4. Caller overrides
//!
//! # Example
//!
//! ```no_run
//! use keel_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! assert!(config.strict_cycles());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{DumpConfig, DumpFormat, LinkConfig, ProjectConfig};
