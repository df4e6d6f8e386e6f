//! Project identity and link-order priority
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Link early: symbols that must sit first on the linker command line
pub const DEPENDENCIES_ORDER_FIRST: u32 = 0;
pub const DEPENDENCIES_ORDER_NORMAL: u32 = u32::MAX / 2;
pub const DEPENDENCIES_ORDER_LAST: u32 = u32::MAX;

/// Canonical, fully-qualified project name (e.g. `game::Engine`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self(full_name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the canonical name
    pub fn short_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(full_name: &str) -> Self {
        Self::new(full_name)
    }
}

/// How the generator treats a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectKind {
    /// Project files are generated and the project is compiled
    #[default]
    Generate,
    /// Compiled by the build, project files are provided by hand
    Compile,
    /// Prebuilt binaries described for consumers, never compiled
    Export,
}

impl ProjectKind {
    pub fn is_export(self) -> bool {
        matches!(self, Self::Export)
    }

    pub fn is_compiled(self) -> bool {
        matches!(self, Self::Generate | Self::Compile)
    }
}

/// Metadata shared by every configuration of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    /// Display name, defaults to the last segment of the id
    pub name: String,
    pub kind: ProjectKind,
    /// Link-order priority, smaller links first
    pub dependencies_order: u32,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>) -> Self {
        let id = id.into();
        Self {
            name: id.short_name().to_string(),
            id,
            kind: ProjectKind::Generate,
            dependencies_order: DEPENDENCIES_ORDER_NORMAL,
        }
    }

    pub fn with_kind(mut self, kind: ProjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_dependencies_order(mut self, order: u32) -> Self {
        self.dependencies_order = order;
        self
    }

    /// Deterministic link order: priority ascending, then canonical name ordinal
    pub fn link_order(&self, other: &Project) -> Ordering {
        self.dependencies_order
            .cmp(&other.dependencies_order)
            .then_with(|| self.id.as_str().cmp(other.id.as_str()))
    }
}

impl From<String> for ProjectId {
    fn from(full_name: String) -> Self {
        Self(full_name)
    }
}
