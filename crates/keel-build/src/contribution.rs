//! What one visited dependency contributes to its consumer
//!
//! [`contributions`] decides, from the dependency's output kind and the state of
//! the path it was reached on, which effects apply. [`Accumulator::apply`] is the
//! only place those effects touch the consumer's outputs.

use crate::configuration::Configuration;
use crate::error::{BuildError, BuildResult};
use crate::platform::ConfigurationTasks;
use crate::propagation::PropagationState;
use crate::resolved::{ConfigurationSet, DotNetDependency, ResolvedOutputs};
use crate::setting::DependencySetting;
use crate::targets::OutputKind;
use indexmap::IndexSet;
use std::sync::Arc;

/// A single mutation of the consumer's resolved outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Pre/post build and custom build executables
    InheritBuildEvents,
    /// Pre/post build executables as exec dependencies
    InheritExecDepends,
    /// Copy files, copy-to-subdirectory pairs and depends files
    InheritCopyFiles,
    IncludePaths,
    ExportDefines,
    InheritLibraryPaths,
    InheritLibraryFiles,
    InheritForceUsingFiles,
    StaticLibraryPathSetup,
    DynamicLibraryPathSetup,
    LinkDependency,
    BuildOrderDependency,
    GenericBuildDependency,
    ForceUsingDependency,
    UsingDirectory,
    CopyFile(String),
    DependsFile(String),
    /// Managed reference, public when the path to the root is public
    ManagedReference {
        reference_output_assembly: Option<bool>,
        private_allowed: bool,
    },
}

impl Effect {
    /// Adds the dependency to one of the consumer's configuration sets
    pub fn registers_dependency(&self) -> bool {
        matches!(
            self,
            Self::LinkDependency
                | Self::BuildOrderDependency
                | Self::GenericBuildDependency
                | Self::ForceUsingDependency
                | Self::ManagedReference { .. }
        )
    }
}

/// Effects of `dependency`, reached with `state`, on `consumer`
///
/// `tasks` are the dependency platform's tasks, used to name its output file.
pub fn contributions(
    consumer: &Configuration,
    dependency: &Configuration,
    state: &PropagationState,
    tasks: &dyn ConfigurationTasks,
) -> BuildResult<Vec<Effect>> {
    let setting = state.setting;
    let build_order_only = setting.is_build_order_only();
    let is_export = dependency.project().kind.is_export();
    let through_dll = state.goes_through_dynamic_library;
    // An implicitly linking toolchain already knows about compiled dependencies
    let explicit_paths =
        !consumer.link_library_dependencies || !dependency.project().kind.is_compiled();
    let export_allowed = consumer.output == OutputKind::Lib
        || dependency
            .export_symbols_through
            .as_ref()
            .map_or(true, |through| through == &consumer.project().id);

    let mut effects = Vec::new();

    if !build_order_only {
        effects.push(Effect::InheritBuildEvents);
        effects.push(Effect::InheritCopyFiles);
        effects.push(Effect::InheritExecDepends);
    } else if consumer.output == OutputKind::None && !is_export {
        effects.push(Effect::GenericBuildDependency);
    }

    if dependency.output.exports_headers()
        && setting.contains(DependencySetting::INCLUDE_PATHS)
        && (state.is_immediate || state.has_public_path_to_immediate)
    {
        effects.push(Effect::IncludePaths);
        if setting.contains(DependencySetting::DEFINES) {
            effects.push(Effect::ExportDefines);
        }
    }

    match dependency.output {
        OutputKind::None | OutputKind::Lib => {
            let is_lib = dependency.output == OutputKind::Lib;

            if is_lib && !through_dll && export_allowed {
                if explicit_paths {
                    effects.push(Effect::StaticLibraryPathSetup);
                }
                if setting.contains(DependencySetting::LIBRARY_FILES)
                    && state.has_project_reference
                {
                    effects.push(Effect::LinkDependency);
                }
                if build_order_only {
                    effects.push(Effect::BuildOrderDependency);
                }
            }

            if !through_dll {
                inherit_library_lists(setting, &mut effects);
                if setting.contains(DependencySetting::FORCE_USING_ASSEMBLY) {
                    effects.push(Effect::InheritForceUsingFiles);
                }
            }

            if !is_lib && state.is_immediate && build_order_only && !is_export {
                effects.push(Effect::GenericBuildDependency);
            }
        }

        OutputKind::Dll | OutputKind::AppleBundle | OutputKind::AppleFramework => {
            if dependency.export_dll_symbols {
                if state.is_immediate || state.has_public_path_to_root || !through_dll {
                    if explicit_paths {
                        effects.push(Effect::DynamicLibraryPathSetup);
                    }
                    if setting.contains(DependencySetting::LIBRARY_FILES)
                        && state.has_project_reference
                    {
                        effects.push(Effect::LinkDependency);
                    }
                    if setting.contains(DependencySetting::FORCE_USING_ASSEMBLY) {
                        effects.push(Effect::ForceUsingDependency);
                    }
                    if build_order_only {
                        effects.push(Effect::BuildOrderDependency);
                    }
                    if is_export && !through_dll {
                        inherit_library_lists(setting, &mut effects);
                    }
                }
            } else if build_order_only
                || setting.intersects(
                    DependencySetting::LIBRARY_FILES | DependencySetting::FORCE_USING_ASSEMBLY,
                )
            {
                effects.push(Effect::BuildOrderDependency);
            }

            if wants_using_directory(setting) {
                effects.push(Effect::UsingDirectory);
            }

            let output_path = dependency.output_file_path(tasks);
            let consumer_copies = consumer.output.is_executable() || consumer.execute_target_copy;
            if consumer_copies
                && dependency.allow_output_copy
                && (setting.contains(DependencySetting::LIBRARY_FILES)
                    || consumer.execute_target_copy)
                && dependency.target_path != consumer.target_path
            {
                effects.push(Effect::CopyFile(output_path.clone()));
                if dependency.generate_debug_information && !is_export {
                    if let Some(symbols) = &dependency.linker_debug_symbols_path {
                        effects.push(Effect::CopyFile(symbols.clone()));
                    }
                    if dependency.copy_compiler_debug_symbols {
                        if let Some(symbols) = &dependency.compiler_debug_symbols_path {
                            effects.push(Effect::CopyFile(symbols.clone()));
                        }
                    }
                }
                effects.push(Effect::InheritBuildEvents);
            }
            effects.push(Effect::DependsFile(output_path));

            if consumer.is_managed() {
                if dependency.is_managed() {
                    effects.push(Effect::ManagedReference {
                        reference_output_assembly: None,
                        private_allowed: state.is_immediate,
                    });
                } else if state.is_immediate && !is_export {
                    effects.push(Effect::GenericBuildDependency);
                }
            }
        }

        OutputKind::Exe | OutputKind::AppleApp => {
            let consumer_kind = consumer.output;
            if !(consumer_kind.is_executable()
                || consumer_kind == OutputKind::Utility
                || consumer_kind == OutputKind::None)
            {
                return Err(BuildError::InvalidDependencyOutput {
                    configuration: consumer.to_string(),
                    output: consumer_kind.to_string(),
                    dependency: format!("{} ({})", dependency, dependency.output),
                });
            }

            effects.push(Effect::ManagedReference {
                reference_output_assembly: None,
                private_allowed: state.is_immediate,
            });

            if build_order_only || !state.has_project_reference {
                effects.push(Effect::BuildOrderDependency);
            } else {
                effects.push(Effect::LinkDependency);
            }
        }

        OutputKind::Utility => {
            if !through_dll
                && export_allowed
                && setting.contains(DependencySetting::LIBRARY_FILES)
            {
                effects.push(Effect::LinkDependency);
            }
        }

        OutputKind::DotNetClassLibrary
        | OutputKind::DotNetConsoleApp
        | OutputKind::DotNetWindowsApp => {
            if wants_using_directory(setting) {
                effects.push(Effect::UsingDirectory);
            }

            let reference_output_assembly = if state.is_immediate && build_order_only {
                Some(false)
            } else {
                consumer.reference_output_assembly
            };

            if setting.contains(DependencySetting::FORCE_USING_ASSEMBLY) {
                effects.push(Effect::ForceUsingDependency);
            }

            effects.push(Effect::ManagedReference {
                reference_output_assembly,
                private_allowed: state.is_immediate || state.has_public_path_to_immediate,
            });
        }
    }

    // A node the root cannot see contributes files, never a dependency entry
    if !state.is_exposed_to_root() {
        effects.retain(|effect| !effect.registers_dependency());
    }

    Ok(effects)
}

fn inherit_library_lists(setting: DependencySetting, effects: &mut Vec<Effect>) {
    if setting.contains(DependencySetting::LIBRARY_PATHS) {
        effects.push(Effect::InheritLibraryPaths);
    }
    if setting.contains(DependencySetting::LIBRARY_FILES) {
        effects.push(Effect::InheritLibraryFiles);
    }
}

fn wants_using_directory(setting: DependencySetting) -> bool {
    setting.intersects(
        DependencySetting::ADDITIONAL_USING_DIRECTORIES | DependencySetting::FORCE_USING_ASSEMBLY,
    )
}

/// Consumer outputs under construction during one walk
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    pub outputs: ResolvedOutputs,
    pub public: ConfigurationSet,
    pub private: ConfigurationSet,
    pub dotnet_public: IndexSet<DotNetDependency>,
    pub dotnet_private: IndexSet<DotNetDependency>,
}

impl Accumulator {
    /// Public wins: a public entry evicts a provisional private one
    pub fn classify(&mut self, dependency: &Arc<Configuration>, public: bool) {
        if public {
            self.private.shift_remove(dependency);
            self.public.insert(dependency.clone());
        } else if !self.public.contains(dependency) {
            self.private.insert(dependency.clone());
        }
    }

    pub fn apply(
        &mut self,
        effect: Effect,
        dependency: &Arc<Configuration>,
        state: &PropagationState,
        tasks: &dyn ConfigurationTasks,
    ) {
        let setting = state.setting;
        let out = &mut self.outputs;

        match effect {
            Effect::InheritBuildEvents => {
                out.pre_build_exe.extend(dependency.pre_build_exe.iter().cloned());
                out.post_build_exe.extend(dependency.post_build_exe.iter().cloned());
                out.custom_pre_build_exe
                    .extend(dependency.custom_pre_build_exe.iter().cloned());
                out.custom_post_build_exe
                    .extend(dependency.custom_post_build_exe.iter().cloned());
            }
            Effect::InheritExecDepends => {
                out.exec_depends_files.extend(
                    dependency
                        .pre_build_exe
                        .iter()
                        .chain(&dependency.post_build_exe)
                        .cloned(),
                );
            }
            Effect::InheritCopyFiles => {
                out.copy_files.extend(dependency.target_copy_files.iter().cloned());
                out.copy_files_to_subdirectory
                    .extend(dependency.target_copy_files_to_subdirectory.iter().cloned());
                out.depends_files
                    .extend(dependency.target_depends_files.iter().cloned());
            }
            Effect::IncludePaths => {
                out.include_paths.extend(dependency.include_paths.iter().cloned());
                out.include_system_paths
                    .extend(dependency.include_system_paths.iter().cloned());
                out.resource_include_paths
                    .extend(dependency.resource_include_paths.iter().cloned());
            }
            Effect::ExportDefines => {
                out.defines.extend(dependency.export_defines.iter().cloned());
            }
            Effect::InheritLibraryPaths => {
                out.library_paths.extend(dependency.library_paths.iter().cloned());
            }
            Effect::InheritLibraryFiles => {
                out.library_files.extend(dependency.library_files.iter().cloned());
            }
            Effect::InheritForceUsingFiles => {
                out.force_using_files
                    .extend(dependency.force_using_files.iter().cloned());
            }
            Effect::StaticLibraryPathSetup => {
                tasks.setup_static_library_paths(out, setting, dependency);
            }
            Effect::DynamicLibraryPathSetup => {
                tasks.setup_dynamic_library_paths(out, setting, dependency);
            }
            Effect::LinkDependency => {
                out.link_dependencies.insert(dependency.clone());
            }
            Effect::BuildOrderDependency => {
                out.build_order_dependencies.insert(dependency.clone());
            }
            Effect::GenericBuildDependency => {
                out.generic_build_dependencies.insert(dependency.clone());
            }
            Effect::ForceUsingDependency => {
                out.force_using_dependencies.insert(dependency.clone());
            }
            Effect::UsingDirectory => {
                out.using_directories.insert(dependency.target_path.clone());
            }
            Effect::CopyFile(path) => {
                out.copy_files.insert(path);
            }
            Effect::DependsFile(path) => {
                out.depends_files.insert(path);
            }
            Effect::ManagedReference {
                reference_output_assembly,
                private_allowed,
            } => {
                let entry = DotNetDependency {
                    configuration: dependency.clone(),
                    reference_output_assembly,
                    swapped_to_output_assembly: state.is_swapped_to_assembly_output,
                    copy_local: setting.contains(DependencySetting::COPY_LOCAL),
                };

                if self.dotnet_public.contains(&entry) {
                    return;
                }
                if state.has_public_path_to_root {
                    self.dotnet_private.shift_remove(&entry);
                    self.dotnet_public.insert(entry);
                } else if private_allowed {
                    self.dotnet_private.insert(entry);
                }
            }
        }
    }
}
