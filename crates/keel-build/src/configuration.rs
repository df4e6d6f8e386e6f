//! Project configurations and their declared dependencies
//!
//! A [`Configuration`] is one build variant of one project. It is mutable while
//! the front-end fills it in; once registered in a
//! [`Workspace`](crate::workspace::Workspace) it is shared behind an `Arc` and only
//! its link state changes, exactly once, from unlinked to linked.

use crate::error::{BuildError, BuildResult};
use crate::platform::ConfigurationTasks;
use crate::project::{Project, ProjectId};
use crate::resolved::ResolvedOutputs;
use crate::setting::{DependencySetting, DependencyType};
use crate::targets::{OutputKind, Platform, Target};
use indexmap::IndexMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

/// Lifecycle of a configuration's link pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    NotLinked,
    Linking,
    Linked,
}

impl LinkState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotLinked,
            1 => Self::Linking,
            _ => Self::Linked,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::NotLinked => 0,
            Self::Linking => 1,
            Self::Linked => 2,
        }
    }
}

/// Key identifying a configuration: project plus target selector
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigurationKey {
    pub project: ProjectId,
    pub target: Target,
}

impl fmt::Display for ConfigurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.project, self.target)
    }
}

/// Direct dependency edges of one configuration
#[derive(Debug, Clone, Default)]
pub struct DependencyDeclaration {
    public: IndexMap<ProjectId, Target>,
    private: IndexMap<ProjectId, Target>,
    settings: IndexMap<(ProjectId, Target), DependencySetting>,
}

impl DependencyDeclaration {
    /// Declared public edges, in declaration order
    pub fn public(&self) -> impl Iterator<Item = (&ProjectId, &Target)> {
        self.public.iter()
    }

    /// Declared private edges, in declaration order
    pub fn private(&self) -> impl Iterator<Item = (&ProjectId, &Target)> {
        self.private.iter()
    }

    /// Public edges then private edges, tagged with their visibility
    pub fn edges(&self) -> impl Iterator<Item = (DependencyType, &ProjectId, &Target)> {
        self.public
            .iter()
            .map(|(p, t)| (DependencyType::Public, p, t))
            .chain(self.private.iter().map(|(p, t)| (DependencyType::Private, p, t)))
    }

    pub fn contains(&self, project: &ProjectId) -> bool {
        self.public.contains_key(project) || self.private.contains_key(project)
    }

    pub fn len(&self) -> usize {
        self.public.len() + self.private.len()
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.private.is_empty()
    }

    /// Setting registered for a (project, target) pair, if any
    pub fn setting(&self, project: &ProjectId, target: &Target) -> Option<DependencySetting> {
        self.settings
            .get(&(project.clone(), target.clone()))
            .copied()
    }

    /// Register a setting; a second registration for the same pair ORs the flags
    pub fn set_setting(&mut self, project: ProjectId, target: Target, setting: DependencySetting) {
        *self
            .settings
            .entry((project, target))
            .or_insert(DependencySetting::ONLY_BUILD_ORDER) |= setting;
    }

    fn insert(
        &mut self,
        kind: DependencyType,
        project: ProjectId,
        target: Target,
        setting: DependencySetting,
    ) -> Result<(), ProjectId> {
        if self.contains(&project) {
            return Err(project);
        }
        let bucket = match kind {
            DependencyType::Public => &mut self.public,
            DependencyType::Private => &mut self.private,
        };
        bucket.insert(project.clone(), target.clone());
        self.set_setting(project, target, setting);
        Ok(())
    }
}

/// One build variant of one project
pub struct Configuration {
    project: Arc<Project>,
    target: Target,
    declaration: DependencyDeclaration,

    pub platform: Platform,
    pub output: OutputKind,

    /// Static library symbols reach consumers only through this project
    pub export_symbols_through: Option<ProjectId>,
    /// A dynamic library exposes an import library to link against
    pub export_dll_symbols: bool,
    /// The output binary may be copied next to dependent executables
    pub allow_output_copy: bool,
    /// Copy dependency outputs even though this is not an executable
    pub execute_target_copy: bool,
    /// Native configuration able to reference managed assemblies
    pub managed_interop: bool,
    pub reference_output_assembly: Option<bool>,
    /// The toolchain links dependency libraries implicitly
    pub link_library_dependencies: bool,

    pub target_path: String,
    pub target_library_path: String,
    /// Output file name without platform prefix or extension
    pub target_file_name: String,
    /// Empty selects the platform default extension
    pub output_extension: String,
    pub generate_debug_information: bool,
    pub linker_debug_symbols_path: Option<String>,
    pub compiler_debug_symbols_path: Option<String>,
    pub copy_compiler_debug_symbols: bool,

    pub include_paths: Vec<String>,
    pub include_system_paths: Vec<String>,
    pub resource_include_paths: Vec<String>,
    pub library_paths: Vec<String>,
    pub library_files: Vec<String>,
    pub force_using_files: Vec<String>,
    pub defines: Vec<String>,
    pub export_defines: Vec<String>,
    pub pre_build_exe: Vec<String>,
    pub post_build_exe: Vec<String>,
    pub custom_pre_build_exe: Vec<String>,
    pub custom_post_build_exe: Vec<String>,
    pub target_copy_files: Vec<String>,
    /// (file, destination subdirectory) pairs
    pub target_copy_files_to_subdirectory: Vec<(String, String)>,
    pub target_depends_files: Vec<String>,

    state: AtomicU8,
    resolved: OnceLock<ResolvedOutputs>,
}

impl Configuration {
    pub fn new(project: Arc<Project>, target: impl Into<Target>, output: OutputKind) -> Self {
        let target_file_name = project.name.clone();
        Self {
            project,
            target: target.into(),
            declaration: DependencyDeclaration::default(),
            platform: Platform::default(),
            output,
            export_symbols_through: None,
            export_dll_symbols: true,
            allow_output_copy: true,
            execute_target_copy: false,
            managed_interop: false,
            reference_output_assembly: None,
            link_library_dependencies: false,
            target_path: String::new(),
            target_library_path: String::new(),
            target_file_name,
            output_extension: String::new(),
            generate_debug_information: true,
            linker_debug_symbols_path: None,
            compiler_debug_symbols_path: None,
            copy_compiler_debug_symbols: false,
            include_paths: Vec::new(),
            include_system_paths: Vec::new(),
            resource_include_paths: Vec::new(),
            library_paths: Vec::new(),
            library_files: Vec::new(),
            force_using_files: Vec::new(),
            defines: Vec::new(),
            export_defines: Vec::new(),
            pre_build_exe: Vec::new(),
            post_build_exe: Vec::new(),
            custom_pre_build_exe: Vec::new(),
            custom_post_build_exe: Vec::new(),
            target_copy_files: Vec::new(),
            target_copy_files_to_subdirectory: Vec::new(),
            target_depends_files: Vec::new(),
            state: AtomicU8::new(LinkState::NotLinked.as_u8()),
            resolved: OnceLock::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_handle(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn key(&self) -> ConfigurationKey {
        ConfigurationKey {
            project: self.project.id.clone(),
            target: self.target.clone(),
        }
    }

    pub fn declaration(&self) -> &DependencyDeclaration {
        &self.declaration
    }

    /// Managed output, or native code with managed interop enabled
    pub fn is_managed(&self) -> bool {
        self.output.is_managed() || self.managed_interop
    }

    /// Add a dependency whose exported properties are re-exposed to our consumers
    pub fn add_public_dependency(
        &mut self,
        project: impl Into<ProjectId>,
        target: impl Into<Target>,
        setting: DependencySetting,
    ) -> BuildResult<()> {
        self.add_dependency(DependencyType::Public, project.into(), target.into(), setting)
    }

    /// Add a dependency used internally only
    pub fn add_private_dependency(
        &mut self,
        project: impl Into<ProjectId>,
        target: impl Into<Target>,
        setting: DependencySetting,
    ) -> BuildResult<()> {
        self.add_dependency(DependencyType::Private, project.into(), target.into(), setting)
    }

    /// Private dependency that only orders the build
    pub fn add_build_order_dependency(
        &mut self,
        project: impl Into<ProjectId>,
        target: impl Into<Target>,
    ) -> BuildResult<()> {
        self.add_private_dependency(project, target, DependencySetting::ONLY_BUILD_ORDER)
    }

    fn add_dependency(
        &mut self,
        kind: DependencyType,
        project: ProjectId,
        target: Target,
        setting: DependencySetting,
    ) -> BuildResult<()> {
        let key = self.key();
        self.declaration
            .insert(kind, project, target, setting)
            .map_err(|project| BuildError::duplicate(key, project))
    }

    pub fn have_dependency(&self, project: &ProjectId) -> bool {
        self.declaration.contains(project)
    }

    /// Union of the settings registered for a project, `ONLY_BUILD_ORDER` when none
    pub fn dependency_setting(&self, project: &ProjectId) -> DependencySetting {
        self.declaration
            .settings
            .iter()
            .filter(|((p, _), _)| p == project)
            .fold(DependencySetting::ONLY_BUILD_ORDER, |acc, (_, s)| acc | *s)
    }

    /// Output file name with the platform prefix
    pub fn target_file_full_name(&self, tasks: &dyn ConfigurationTasks) -> String {
        format!(
            "{}{}",
            tasks.output_file_name_prefix(self.output),
            self.target_file_name
        )
    }

    /// Full path of the output binary
    pub fn output_file_path(&self, tasks: &dyn ConfigurationTasks) -> String {
        let extension = if self.output_extension.is_empty() {
            tasks.default_output_extension(self.output)
        } else {
            self.output_extension.clone()
        };

        let mut file_name = self.target_file_full_name(tasks);
        if !extension.is_empty() {
            file_name.push('.');
            file_name.push_str(&extension);
        }

        Path::new(&self.target_path)
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }

    pub fn link_state(&self) -> LinkState {
        LinkState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_linked(&self) -> bool {
        self.link_state() == LinkState::Linked
    }

    /// Resolved outputs, available once linked
    pub fn resolved(&self) -> Option<&ResolvedOutputs> {
        self.resolved.get()
    }

    /// Resolved outputs or a not-linked error
    pub fn try_resolved(&self) -> BuildResult<&ResolvedOutputs> {
        self.resolved().ok_or_else(|| BuildError::not_linked(self))
    }

    /// Exclusive NotLinked -> Linking transition
    pub(crate) fn begin_link(&self) -> BuildResult<()> {
        self.state
            .compare_exchange(
                LinkState::NotLinked.as_u8(),
                LinkState::Linking.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|_| BuildError::already_linked(self))
    }

    /// Publish outputs, then mark linked
    pub(crate) fn finish_link(&self, outputs: ResolvedOutputs) {
        debug_assert_eq!(self.link_state(), LinkState::Linking);
        // begin_link guarantees a single writer
        let _ = self.resolved.set(outputs);
        self.state.store(LinkState::Linked.as_u8(), Ordering::Release);
    }

    /// Failed pass: nothing was published
    pub(crate) fn abort_link(&self) {
        self.state
            .store(LinkState::NotLinked.as_u8(), Ordering::Release);
    }
}

impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.project.id == other.project.id && self.target == other.target
    }
}

impl Eq for Configuration {}

impl Hash for Configuration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.project.id.hash(state);
        self.target.hash(state);
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.project.id, self.target)
    }
}

// Resolved outputs reference other configurations, possibly cyclically
impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("project", &self.project.id)
            .field("target", &self.target)
            .field("output", &self.output)
            .field("dependencies", &self.declaration.len())
            .field("state", &self.link_state())
            .finish()
    }
}
