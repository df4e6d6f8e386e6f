//! Per-configuration results of a link pass
use crate::configuration::Configuration;
use crate::project::ProjectId;
use indexmap::IndexSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Insertion-ordered, deduplicated set of configurations
pub type ConfigurationSet = IndexSet<Arc<Configuration>>;

/// Insertion-ordered, deduplicated list of paths, files or defines
pub type OrderedStrings = IndexSet<String>;

/// Reference from a managed consumer to another configuration
///
/// Two references are the same reference when they point at the same
/// configuration, whatever their flags.
#[derive(Debug, Clone)]
pub struct DotNetDependency {
    pub configuration: Arc<Configuration>,
    pub reference_output_assembly: Option<bool>,
    /// Reference the built assembly instead of the project
    pub swapped_to_output_assembly: bool,
    pub copy_local: bool,
}

impl DotNetDependency {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self {
            configuration,
            reference_output_assembly: None,
            swapped_to_output_assembly: false,
            copy_local: false,
        }
    }
}

impl PartialEq for DotNetDependency {
    fn eq(&self, other: &Self) -> bool {
        self.configuration == other.configuration
    }
}

impl Eq for DotNetDependency {}

impl Hash for DotNetDependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.configuration.hash(state);
    }
}

/// Everything a link pass resolved for one configuration
#[derive(Debug, Clone, Default)]
pub struct ResolvedOutputs {
    /// Sorted by link order
    pub public_dependencies: Vec<Arc<Configuration>>,
    /// Sorted by link order
    pub private_dependencies: Vec<Arc<Configuration>>,
    /// Public then private
    pub dependencies: Vec<Arc<Configuration>>,
    pub dotnet_public_dependencies: Vec<DotNetDependency>,
    pub dotnet_private_dependencies: Vec<DotNetDependency>,

    /// Dependencies to link against, sorted by link order
    pub link_dependencies: ConfigurationSet,
    pub build_order_dependencies: ConfigurationSet,
    /// Solution-level build dependencies
    pub generic_build_dependencies: ConfigurationSet,
    pub force_using_dependencies: ConfigurationSet,

    pub include_paths: OrderedStrings,
    pub include_system_paths: OrderedStrings,
    pub resource_include_paths: OrderedStrings,
    pub defines: OrderedStrings,
    pub library_paths: OrderedStrings,
    pub library_files: OrderedStrings,
    /// Written by the platform configuration tasks
    pub built_target_library_paths: OrderedStrings,
    /// Written by the platform configuration tasks
    pub built_target_library_files: OrderedStrings,
    pub force_using_files: OrderedStrings,
    pub using_directories: OrderedStrings,
    pub copy_files: OrderedStrings,
    pub copy_files_to_subdirectory: IndexSet<(String, String)>,
    pub depends_files: OrderedStrings,
    pub exec_depends_files: OrderedStrings,
    pub pre_build_exe: OrderedStrings,
    pub post_build_exe: OrderedStrings,
    pub custom_pre_build_exe: OrderedStrings,
    pub custom_post_build_exe: OrderedStrings,
}

impl ResolvedOutputs {
    pub fn is_public(&self, project: &ProjectId) -> bool {
        contains(&self.public_dependencies, project)
    }

    pub fn is_private(&self, project: &ProjectId) -> bool {
        contains(&self.private_dependencies, project)
    }

    pub fn depends_on(&self, project: &ProjectId) -> bool {
        contains(&self.dependencies, project)
    }

    /// Project ids of `dependencies`, in order
    pub fn dependency_ids(&self) -> Vec<&ProjectId> {
        self.dependencies.iter().map(|c| &c.project().id).collect()
    }
}

fn contains(list: &[Arc<Configuration>], project: &ProjectId) -> bool {
    list.iter().any(|c| &c.project().id == project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;
    use crate::targets::OutputKind;

    fn configuration(name: &str) -> Arc<Configuration> {
        Arc::new(Configuration::new(
            Arc::new(Project::new(name)),
            "debug",
            OutputKind::DotNetClassLibrary,
        ))
    }

    #[test]
    fn test_dotnet_dependency_equality_ignores_flags() {
        let conf = configuration("tools::Model");
        let plain = DotNetDependency::new(conf.clone());
        let mut flagged = DotNetDependency::new(conf);
        flagged.copy_local = true;
        flagged.reference_output_assembly = Some(false);

        let mut set = IndexSet::new();
        set.insert(plain);
        assert!(!set.insert(flagged));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_lookup_by_project() {
        let core = configuration("game::Core");
        let outputs = ResolvedOutputs {
            public_dependencies: vec![core.clone()],
            dependencies: vec![core],
            ..Default::default()
        };

        let id = ProjectId::new("game::Core");
        assert!(outputs.is_public(&id));
        assert!(!outputs.is_private(&id));
        assert!(outputs.depends_on(&id));
        assert_eq!(outputs.dependency_ids(), vec![&id]);
    }
}
