//! Platform configuration tasks
//!
//! The link pass delegates everything platform specific to a
//! [`ConfigurationTasks`] implementation looked up by the dependency's
//! [`Platform`]: how a library dependency lands on the consumer's linker
//! inputs, output file naming, and extra library search paths.

use crate::configuration::Configuration;
use crate::resolved::ResolvedOutputs;
use crate::setting::DependencySetting;
use crate::targets::{OutputKind, Platform};
use std::collections::HashMap;
use std::sync::Arc;

pub trait ConfigurationTasks: Send + Sync {
    /// Register a static library dependency on the consumer's linker inputs
    fn setup_static_library_paths(
        &self,
        outputs: &mut ResolvedOutputs,
        setting: DependencySetting,
        dependency: &Configuration,
    );

    /// Register a dynamic library dependency on the consumer's linker inputs
    fn setup_dynamic_library_paths(
        &self,
        outputs: &mut ResolvedOutputs,
        setting: DependencySetting,
        dependency: &Configuration,
    );

    /// Extension, without the dot, used when a configuration leaves it empty
    fn default_output_extension(&self, kind: OutputKind) -> String;

    fn output_file_name_prefix(&self, _kind: OutputKind) -> String {
        String::new()
    }

    /// Library search paths the toolchain needs for this configuration
    fn platform_library_paths(&self, _configuration: &Configuration) -> Vec<String> {
        Vec::new()
    }
}

/// Shared library path setup
///
/// Compiled dependencies land in the built-target lists; prebuilt `Export`
/// dependencies are ordinary library inputs.
pub fn setup_library_paths(
    tasks: &dyn ConfigurationTasks,
    outputs: &mut ResolvedOutputs,
    setting: DependencySetting,
    dependency: &Configuration,
) {
    let library_path = dependency.target_library_path.clone();
    let library_file = dependency.target_file_full_name(tasks);

    let (paths, files) = if dependency.project().kind.is_export() {
        (&mut outputs.library_paths, &mut outputs.library_files)
    } else {
        (
            &mut outputs.built_target_library_paths,
            &mut outputs.built_target_library_files,
        )
    };

    if setting.contains(DependencySetting::LIBRARY_PATHS) {
        paths.insert(library_path);
    }
    if setting.contains(DependencySetting::LIBRARY_FILES) {
        files.insert(library_file);
    }
}

/// Windows-style naming: `exe`, `lib`, `dll`, no prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPlatform;

impl ConfigurationTasks for DefaultPlatform {
    fn setup_static_library_paths(
        &self,
        outputs: &mut ResolvedOutputs,
        setting: DependencySetting,
        dependency: &Configuration,
    ) {
        setup_library_paths(self, outputs, setting, dependency);
    }

    fn setup_dynamic_library_paths(
        &self,
        outputs: &mut ResolvedOutputs,
        setting: DependencySetting,
        dependency: &Configuration,
    ) {
        setup_library_paths(self, outputs, setting, dependency);
    }

    fn default_output_extension(&self, kind: OutputKind) -> String {
        match kind {
            OutputKind::Exe | OutputKind::DotNetConsoleApp | OutputKind::DotNetWindowsApp => {
                "exe".to_string()
            }
            OutputKind::Lib => "lib".to_string(),
            OutputKind::Dll | OutputKind::DotNetClassLibrary => "dll".to_string(),
            OutputKind::None => String::new(),
            OutputKind::Utility => "utility".to_string(),
            OutputKind::AppleApp => "app".to_string(),
            OutputKind::AppleBundle => "bundle".to_string(),
            OutputKind::AppleFramework => "framework".to_string(),
        }
    }
}

/// Unix naming: `lib` prefix for libraries, `a` and `so`, bare executables
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixPlatform;

impl ConfigurationTasks for UnixPlatform {
    fn setup_static_library_paths(
        &self,
        outputs: &mut ResolvedOutputs,
        setting: DependencySetting,
        dependency: &Configuration,
    ) {
        setup_library_paths(self, outputs, setting, dependency);
    }

    fn setup_dynamic_library_paths(
        &self,
        outputs: &mut ResolvedOutputs,
        setting: DependencySetting,
        dependency: &Configuration,
    ) {
        setup_library_paths(self, outputs, setting, dependency);
    }

    fn default_output_extension(&self, kind: OutputKind) -> String {
        match kind {
            OutputKind::Dll => "so".to_string(),
            OutputKind::Lib => "a".to_string(),
            _ => String::new(),
        }
    }

    fn output_file_name_prefix(&self, kind: OutputKind) -> String {
        if kind == OutputKind::Exe {
            String::new()
        } else {
            "lib".to_string()
        }
    }
}

/// Configuration tasks by platform, falling back to [`DefaultPlatform`]
#[derive(Clone)]
pub struct PlatformRegistry {
    tasks: HashMap<Platform, Arc<dyn ConfigurationTasks>>,
    fallback: Arc<dyn ConfigurationTasks>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            fallback: Arc::new(DefaultPlatform),
        }
    }

    /// Registry with `linux` and `macos` mapped to [`UnixPlatform`]
    pub fn with_builtin_platforms() -> Self {
        let mut registry = Self::new();
        let unix: Arc<dyn ConfigurationTasks> = Arc::new(UnixPlatform);
        registry.register(Platform::new("linux"), unix.clone());
        registry.register(Platform::new("macos"), unix);
        registry
    }

    pub fn register(&mut self, platform: Platform, tasks: Arc<dyn ConfigurationTasks>) {
        self.tasks.insert(platform, tasks);
    }

    pub fn get(&self, platform: &Platform) -> &dyn ConfigurationTasks {
        self.tasks
            .get(platform)
            .map(|tasks| tasks.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new()
    }
}
