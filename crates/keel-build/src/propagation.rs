//! Path-sensitive state carried along the propagation walk
use crate::graph::DependencyEdge;
use crate::setting::{DependencySetting, DependencyType};

/// What the path from the root to a node allows through
///
/// Equality covers every field: the same node reached with two different
/// states is visited twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropagationState {
    /// Intersection of the edge settings along the path
    pub setting: DependencySetting,
    /// Direct dependency of the root
    pub is_immediate: bool,
    pub has_public_path_to_root: bool,
    pub has_public_path_to_immediate: bool,
    /// The path crosses a dynamic library below the root
    pub goes_through_dynamic_library: bool,
    pub is_swapped_to_assembly_output: bool,
    pub has_project_reference: bool,
}

impl PropagationState {
    /// State the root is visited with
    pub fn root() -> Self {
        Self {
            setting: DependencySetting::DEFAULT,
            is_immediate: true,
            has_public_path_to_root: true,
            has_public_path_to_immediate: true,
            goes_through_dynamic_library: false,
            is_swapped_to_assembly_output: false,
            has_project_reference: true,
        }
    }

    /// The root sees the node on this path: no dynamic library hides it, or
    /// every edge from the root re-exposes it
    pub fn is_exposed_to_root(&self) -> bool {
        !self.goes_through_dynamic_library || self.has_public_path_to_root
    }

    /// State of a child reached over `edge` from a node visited with `self`
    pub fn next(
        &self,
        edge: &DependencyEdge,
        parent_is_root: bool,
        parent_is_dynamic: bool,
    ) -> Self {
        let public = edge.kind == DependencyType::Public;
        let setting = if parent_is_root {
            edge.setting
        } else {
            self.setting & edge.setting
        };

        Self {
            setting,
            is_immediate: parent_is_root,
            has_public_path_to_root: (parent_is_root || self.has_public_path_to_root) && public,
            has_public_path_to_immediate: (self.is_immediate || self.has_public_path_to_immediate)
                && public,
            goes_through_dynamic_library: !parent_is_root
                && (self.goes_through_dynamic_library || parent_is_dynamic),
            is_swapped_to_assembly_output: self.is_swapped_to_assembly_output
                || edge.setting.contains(DependencySetting::DEPEND_ON_ASSEMBLY_OUTPUT),
            has_project_reference: self.has_project_reference
                && !edge.setting.contains(DependencySetting::NO_PROJECT_REFERENCE),
        }
    }
}
