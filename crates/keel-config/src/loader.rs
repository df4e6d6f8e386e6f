//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{DumpConfig, DumpFormat, LinkConfig, ProjectConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "keel.toml";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.keel/config.toml) - lowest priority
/// 2. Project config (./keel.toml) - overrides global
/// 3. Environment variables (KEEL_*) - overrides project
/// 4. Caller overrides - highest priority ([`Config::with_overrides`])
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where keel.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config file instead of ~/.keel/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find keel.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        let global_config = self.load_global_config()?;

        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config()?;
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); the config is default when no
    /// keel.toml exists up to the filesystem root
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration; a missing file or home directory yields defaults
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        if self.global_config_path.is_none() {
            match GlobalConfig::global_config_path() {
                Ok(path) => self.global_config_path = Some(path),
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            }
        }

        match &self.global_config_path {
            Some(path) if path.exists() => GlobalConfig::load_from_file(path),
            _ => Ok(GlobalConfig::default()),
        }
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognized: KEEL_MULTITHREADED, KEEL_THREADS, KEEL_STRICT_CYCLES, KEEL_DUMP_GRAPH
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(value) = env::var("KEEL_MULTITHREADED") {
            config
                .link
                .get_or_insert_with(LinkConfig::default)
                .multithreaded = Some(parse_bool(&value));
        }

        if let Ok(value) = env::var("KEEL_THREADS") {
            let threads = value.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                field: "KEEL_THREADS".to_string(),
                reason: format!("expected a positive integer, got '{}'", value),
            })?;
            config.link.get_or_insert_with(LinkConfig::default).threads = Some(threads);
        }

        if let Ok(value) = env::var("KEEL_STRICT_CYCLES") {
            config
                .link
                .get_or_insert_with(LinkConfig::default)
                .strict_cycles = Some(parse_bool(&value));
        }

        if let Ok(value) = env::var("KEEL_DUMP_GRAPH") {
            config.dump.get_or_insert_with(DumpConfig::default).enabled = Some(parse_bool(&value));
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    /// Layer caller overrides over every loaded source
    pub fn with_overrides(mut self, overrides: &ProjectConfig) -> ConfigResult<Self> {
        overrides.validate()?;
        self.project.merge(overrides);
        Ok(self)
    }

    /// Link on a worker pool (project > global > enabled)
    pub fn multithreaded(&self) -> bool {
        self.project
            .multithreaded()
            .or_else(|| self.global.default_multithreaded())
            .unwrap_or(true)
    }

    /// Worker count (project > global), `None` lets the pool decide
    pub fn threads(&self) -> Option<usize> {
        self.project
            .threads()
            .or_else(|| self.global.default_threads())
    }

    /// Reject dependency cycles while linking (default: enabled)
    pub fn strict_cycles(&self) -> bool {
        self.project.strict_cycles().unwrap_or(true)
    }

    /// Whether the dependency graph is recorded and written
    pub fn dump_enabled(&self) -> bool {
        self.project
            .dump
            .as_ref()
            .and_then(|d| d.enabled)
            .unwrap_or(false)
    }

    /// Dump format (project > global > dot)
    pub fn dump_format(&self) -> DumpFormat {
        self.project
            .dump
            .as_ref()
            .and_then(|d| d.format)
            .or_else(|| self.global.default_dump_format())
            .unwrap_or_default()
    }

    /// Dump file, relative paths resolved against the project root
    pub fn dump_path(&self) -> PathBuf {
        let path = self
            .project
            .dump
            .as_ref()
            .and_then(|d| d.path.clone())
            .unwrap_or_else(|| PathBuf::from(format!("dependencies.{}", self.dump_format())));

        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has keel.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
