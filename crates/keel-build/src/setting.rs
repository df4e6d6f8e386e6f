//! Dependency settings: which categories of build data cross one dependency edge

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// Bit flags attached to a declared dependency edge
///
/// Flags narrow with bitwise AND while descending the dependency graph, so a
/// category absent on any edge of a path is absent for everything past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DependencySetting(u32);

impl DependencySetting {
    /// Build before the dependent, inherit nothing
    pub const ONLY_BUILD_ORDER: Self = Self(0);
    pub const LIBRARY_FILES: Self = Self(1 << 1);
    pub const LIBRARY_PATHS: Self = Self(1 << 2);
    pub const INCLUDE_PATHS: Self = Self(1 << 3);
    pub const DEFINES: Self = Self(1 << 4);
    /// `using` directories of managed or C++/CX dependencies
    pub const ADDITIONAL_USING_DIRECTORIES: Self = Self(1 << 5);
    pub const FORCE_USING_ASSEMBLY: Self = Self(1 << 6);
    /// Reference the dependency's output assembly instead of its project
    pub const DEPEND_ON_ASSEMBLY_OUTPUT: Self = Self(1 << 7);
    /// Do not emit a project reference for this edge
    pub const NO_PROJECT_REFERENCE: Self = Self(1 << 8);
    /// Copy the referenced assembly next to the consumer's output
    pub const COPY_LOCAL: Self = Self(1 << 9);

    /// Library files and paths, include paths, defines, copy-local
    pub const DEFAULT: Self = Self(
        Self::LIBRARY_FILES.0
            | Self::LIBRARY_PATHS.0
            | Self::INCLUDE_PATHS.0
            | Self::DEFINES.0
            | Self::COPY_LOCAL.0,
    );

    /// Header-only consumption
    pub const DEFAULT_WITHOUT_LINKING: Self = Self(Self::INCLUDE_PATHS.0 | Self::DEFINES.0);

    const NAMES: [(Self, &'static str); 9] = [
        (Self::LIBRARY_FILES, "LibraryFiles"),
        (Self::LIBRARY_PATHS, "LibraryPaths"),
        (Self::INCLUDE_PATHS, "IncludePaths"),
        (Self::DEFINES, "Defines"),
        (Self::ADDITIONAL_USING_DIRECTORIES, "AdditionalUsingDirectories"),
        (Self::FORCE_USING_ASSEMBLY, "ForceUsingAssembly"),
        (Self::DEPEND_ON_ASSEMBLY_OUTPUT, "DependOnAssemblyOutput"),
        (Self::NO_PROJECT_REFERENCE, "NoProjectReference"),
        (Self::COPY_LOCAL, "CopyLocal"),
    ];

    /// True when every flag of `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Exactly [`Self::ONLY_BUILD_ORDER`], no inherited category at all
    pub const fn is_build_order_only(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DependencySetting {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DependencySetting {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DependencySetting {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for DependencySetting {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl fmt::Display for DependencySetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_build_order_only() {
            return f.write_str("OnlyBuildOrder");
        }

        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join("|"))
    }
}

impl Serialize for DependencySetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Visibility of a dependency relationship
///
/// A public dependency re-exposes the dependency's exported properties to the
/// dependent's own consumers; a private one keeps them internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    Private,
    Public,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => write!(f, "private"),
            Self::Public => write!(f, "public"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_contents() {
        let default = DependencySetting::DEFAULT;
        assert!(default.contains(DependencySetting::LIBRARY_FILES));
        assert!(default.contains(DependencySetting::INCLUDE_PATHS));
        assert!(default.contains(DependencySetting::COPY_LOCAL));
        assert!(!default.contains(DependencySetting::FORCE_USING_ASSEMBLY));
        assert!(!default.is_build_order_only());
    }

    #[test]
    fn test_build_order_only_is_empty() {
        assert!(DependencySetting::ONLY_BUILD_ORDER.is_build_order_only());
        assert_eq!(DependencySetting::default(), DependencySetting::ONLY_BUILD_ORDER);
        // Every setting contains the empty set
        assert!(DependencySetting::DEFINES.contains(DependencySetting::ONLY_BUILD_ORDER));
    }

    #[test]
    fn test_intersection_narrows() {
        let narrowed = DependencySetting::DEFAULT & DependencySetting::DEFAULT_WITHOUT_LINKING;
        assert_eq!(narrowed, DependencySetting::DEFAULT_WITHOUT_LINKING);
        assert!(!narrowed.intersects(DependencySetting::LIBRARY_FILES));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DependencySetting::DEFAULT_WITHOUT_LINKING.to_string(),
            "IncludePaths|Defines"
        );
        assert_eq!(DependencySetting::ONLY_BUILD_ORDER.to_string(), "OnlyBuildOrder");
    }

    #[test]
    fn test_serialize_as_string() {
        let json = serde_json::to_string(&DependencySetting::LIBRARY_FILES).unwrap();
        assert_eq!(json, "\"LibraryFiles\"");
    }
}
