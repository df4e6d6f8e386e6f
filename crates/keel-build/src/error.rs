/// Link pass error types
use crate::project::ProjectId;
use crate::targets::Target;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("resolving dependencies for {configuration}: cannot find project {project}")]
    UnknownProject {
        configuration: String,
        project: ProjectId,
    },

    #[error(
        "resolving dependencies for {configuration}: cannot find configuration {target} in project {project} (available: {available})"
    )]
    MissingConfiguration {
        configuration: String,
        project: ProjectId,
        target: Target,
        available: String,
    },

    #[error(
        "resolving dependencies for {configuration}: project {project} resolved to target {resolved}, requested {requested}"
    )]
    TargetMismatch {
        configuration: String,
        project: ProjectId,
        requested: Target,
        resolved: Target,
    },

    #[error("configuration {configuration} already contains a dependency on {project}")]
    DuplicateDependency {
        configuration: String,
        project: ProjectId,
    },

    #[error("configuration {configuration} is already registered")]
    DuplicateConfiguration { configuration: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error(
        "internal error resolving {configuration}: same dependency resolved in public and private lists: {overlap}"
    )]
    InconsistentResolution {
        configuration: String,
        overlap: String,
    },

    #[error("configuration {configuration} is already linked")]
    AlreadyLinked { configuration: String },

    #[error("configuration {configuration} is not linked")]
    NotLinked { configuration: String },

    #[error("configuration {configuration} ({output}) cannot depend on {dependency}")]
    InvalidDependencyOutput {
        configuration: String,
        output: String,
        dependency: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] keel_config::ConfigError),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to start link workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a duplicate declaration error
    pub fn duplicate(configuration: impl ToString, project: ProjectId) -> Self {
        Self::DuplicateDependency {
            configuration: configuration.to_string(),
            project,
        }
    }

    /// Create a re-link error
    pub fn already_linked(configuration: impl ToString) -> Self {
        Self::AlreadyLinked {
            configuration: configuration.to_string(),
        }
    }

    /// Create a not-linked error
    pub fn not_linked(configuration: impl ToString) -> Self {
        Self::NotLinked {
            configuration: configuration.to_string(),
        }
    }

    /// Whether this error reports a declared dependency that does not match any configuration
    pub fn is_configuration_mismatch(&self) -> bool {
        matches!(
            self,
            Self::UnknownProject { .. }
                | Self::MissingConfiguration { .. }
                | Self::TargetMismatch { .. }
        )
    }
}
