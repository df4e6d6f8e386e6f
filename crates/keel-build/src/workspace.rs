//! Registry of projects and configurations, and the dependency resolver
use crate::configuration::{Configuration, ConfigurationKey};
use crate::error::{BuildError, BuildResult};
use crate::project::{Project, ProjectId};
use crate::targets::Target;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Maps a declared (project, target) pair to a concrete configuration
pub trait DependencyResolver: Send + Sync {
    /// `from` is the declaring configuration, used for error context
    fn resolve(
        &self,
        from: &Configuration,
        project: &ProjectId,
        target: &Target,
    ) -> BuildResult<Arc<Configuration>>;
}

/// All projects and configurations taking part in a link pass
#[derive(Default)]
pub struct Workspace {
    projects: IndexMap<ProjectId, Arc<Project>>,
    configurations: IndexMap<ConfigurationKey, Arc<Configuration>>,
    constructed: AtomicUsize,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project, returning the shared handle configurations are built from
    pub fn add_project(&mut self, project: Project) -> Arc<Project> {
        let handle = Arc::new(project);
        self.projects.insert(handle.id.clone(), handle.clone());
        handle
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Arc<Project>> {
        self.projects.get(id)
    }

    pub fn projects(&self) -> impl Iterator<Item = &Arc<Project>> {
        self.projects.values()
    }

    /// Freeze a configuration and register it
    pub fn add_configuration(
        &mut self,
        configuration: Configuration,
    ) -> BuildResult<Arc<Configuration>> {
        let key = configuration.key();
        if self.configurations.contains_key(&key) {
            return Err(BuildError::DuplicateConfiguration {
                configuration: key.to_string(),
            });
        }

        self.projects
            .entry(key.project.clone())
            .or_insert_with(|| configuration.project_handle().clone());

        let handle = Arc::new(configuration);
        self.configurations.insert(key, handle.clone());
        let count = self.constructed.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Registered configuration {} ({} total)", handle, count);
        Ok(handle)
    }

    pub fn configuration(
        &self,
        project: &ProjectId,
        target: &Target,
    ) -> Option<&Arc<Configuration>> {
        self.configurations.get(&ConfigurationKey {
            project: project.clone(),
            target: target.clone(),
        })
    }

    /// Registered configurations, in registration order
    pub fn configurations(&self) -> impl Iterator<Item = &Arc<Configuration>> {
        self.configurations.values()
    }

    pub fn project_configurations<'a>(
        &'a self,
        project: &'a ProjectId,
    ) -> impl Iterator<Item = &'a Arc<Configuration>> + 'a {
        self.configurations
            .values()
            .filter(move |c| &c.project().id == project)
    }

    /// Number of configurations constructed in this workspace
    pub fn configurations_constructed(&self) -> usize {
        self.constructed.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

impl DependencyResolver for Workspace {
    fn resolve(
        &self,
        from: &Configuration,
        project: &ProjectId,
        target: &Target,
    ) -> BuildResult<Arc<Configuration>> {
        if !self.projects.contains_key(project) {
            return Err(BuildError::UnknownProject {
                configuration: from.to_string(),
                project: project.clone(),
            });
        }

        self.configuration(project, target).cloned().ok_or_else(|| {
            let available: Vec<String> = self
                .project_configurations(project)
                .map(|c| c.target().to_string())
                .collect();
            BuildError::MissingConfiguration {
                configuration: from.to_string(),
                project: project.clone(),
                target: target.clone(),
                available: available.join(", "),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::OutputKind;

    fn workspace() -> Workspace {
        let mut workspace = Workspace::new();
        let core = workspace.add_project(Project::new("game::Core"));
        workspace
            .add_configuration(Configuration::new(core.clone(), "debug", OutputKind::Lib))
            .unwrap();
        workspace
            .add_configuration(Configuration::new(core, "release", OutputKind::Lib))
            .unwrap();
        workspace
    }

    fn consumer() -> Configuration {
        Configuration::new(Arc::new(Project::new("game::App")), "debug", OutputKind::Exe)
    }

    #[test]
    fn test_counter_tracks_registrations() {
        let workspace = workspace();
        assert_eq!(workspace.configurations_constructed(), 2);
        assert_eq!(workspace.len(), 2);
    }

    #[test]
    fn test_duplicate_configuration_rejected() {
        let mut workspace = workspace();
        let core = workspace.project(&ProjectId::new("game::Core")).unwrap().clone();
        let err = workspace
            .add_configuration(Configuration::new(core, "debug", OutputKind::Lib))
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateConfiguration { .. }));
        assert_eq!(workspace.configurations_constructed(), 2);
    }

    #[test]
    fn test_resolve_exact_target() {
        let workspace = workspace();
        let resolved = workspace
            .resolve(&consumer(), &ProjectId::new("game::Core"), &Target::new("release"))
            .unwrap();
        assert_eq!(resolved.target().as_str(), "release");
    }

    #[test]
    fn test_resolve_unknown_project() {
        let workspace = workspace();
        let err = workspace
            .resolve(&consumer(), &ProjectId::new("game::Nope"), &Target::new("debug"))
            .unwrap_err();
        assert!(err.is_configuration_mismatch());
        assert!(err.to_string().contains("game::App [debug]"));
    }

    #[test]
    fn test_resolve_missing_target_lists_available() {
        let workspace = workspace();
        let err = workspace
            .resolve(&consumer(), &ProjectId::new("game::Core"), &Target::new("profile"))
            .unwrap_err();
        match err {
            BuildError::MissingConfiguration { available, .. } => {
                assert_eq!(available, "debug, release");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
