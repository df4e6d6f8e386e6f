/// Output kinds, target selectors and platforms of project configurations
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of binary a configuration produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    /// Header-only library or a project that produces no code
    None,
    /// Static library
    Lib,
    /// Dynamic library
    Dll,
    /// Build-system helper project with no binary of its own
    Utility,
    /// Native executable
    Exe,
    /// Application bundle for Apple platforms
    AppleApp,
    /// Loadable bundle for Apple platforms
    AppleBundle,
    /// Framework for Apple platforms
    AppleFramework,
    /// Managed class library
    DotNetClassLibrary,
    /// Managed executable that opens a console
    DotNetConsoleApp,
    /// Managed executable without a console
    DotNetWindowsApp,
}

impl OutputKind {
    /// Map managed kinds onto their native counterpart
    pub fn simple(self) -> Self {
        match self {
            Self::DotNetConsoleApp | Self::DotNetWindowsApp => Self::Exe,
            Self::DotNetClassLibrary => Self::Dll,
            other => other,
        }
    }

    /// Native dynamic library and the Apple bundle/framework variants
    pub fn is_dynamic_library(self) -> bool {
        matches!(self, Self::Dll | Self::AppleBundle | Self::AppleFramework)
    }

    /// Native executables, including Apple applications
    pub fn is_executable(self) -> bool {
        matches!(self, Self::Exe | Self::AppleApp)
    }

    /// Outputs consumed through managed assembly references
    pub fn is_managed(self) -> bool {
        matches!(
            self,
            Self::DotNetClassLibrary | Self::DotNetConsoleApp | Self::DotNetWindowsApp
        )
    }

    /// Outputs whose include paths are visible to consumers
    pub fn exports_headers(self) -> bool {
        matches!(self, Self::None | Self::Lib) || self.is_dynamic_library()
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Lib => "static library",
            Self::Dll => "dynamic library",
            Self::Utility => "utility",
            Self::Exe => "executable",
            Self::AppleApp => "apple app",
            Self::AppleBundle => "apple bundle",
            Self::AppleFramework => "apple framework",
            Self::DotNetClassLibrary => "managed class library",
            Self::DotNetConsoleApp => "managed console app",
            Self::DotNetWindowsApp => "managed windows app",
        };
        f.write_str(name)
    }
}

/// Variant selector identifying one configuration inside a project
///
/// Selectors are compared as plain strings, e.g. `win64|debug`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target(String);

impl Target {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

/// Platform name used to look up configuration tasks
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform(String);

impl Platform {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new("default")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Platform {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
