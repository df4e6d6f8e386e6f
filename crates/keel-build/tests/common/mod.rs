//! Shared workspace fixtures for integration tests
#![allow(dead_code)]

use keel_build::{
    link, BuildResult, Configuration, LinkContext, LinkOptions, OutputKind, PlatformRegistry,
    Project, ProjectId, Workspace,
};
use std::sync::Arc;

pub const TARGET: &str = "win64|debug";

/// Register a configuration of `name`, creating the project on first use
///
/// Each configuration gets its own target path and an `<short name>/include`
/// include path before `setup` runs.
pub fn add(
    workspace: &mut Workspace,
    name: &str,
    output: OutputKind,
    setup: impl FnOnce(&mut Configuration),
) -> Arc<Configuration> {
    let project = workspace
        .project(&ProjectId::new(name))
        .cloned()
        .unwrap_or_else(|| workspace.add_project(Project::new(name)));
    let short = project.name.clone();

    let mut conf = Configuration::new(project, TARGET, output);
    conf.target_path = format!("out/{}", short);
    conf.target_library_path = format!("out/{}/lib", short);
    conf.include_paths.push(format!("{}/include", short));
    setup(&mut conf);
    workspace.add_configuration(conf).unwrap()
}

pub fn link_with(
    workspace: &Workspace,
    conf: &Arc<Configuration>,
    options: LinkOptions,
) -> BuildResult<()> {
    let platforms = PlatformRegistry::with_builtin_platforms();
    link(conf, &LinkContext::new(workspace, &platforms).with_options(options))
}

/// Link with default options (strict cycle checking)
pub fn link_default(workspace: &Workspace, conf: &Arc<Configuration>) -> BuildResult<()> {
    link_with(workspace, conf, LinkOptions::default())
}

pub fn link_lenient(workspace: &Workspace, conf: &Arc<Configuration>) -> BuildResult<()> {
    link_with(workspace, conf, LinkOptions::default().with_strict_cycles(false))
}

/// Short project names, in list order
pub fn names<'a>(list: impl IntoIterator<Item = &'a Arc<Configuration>>) -> Vec<String> {
    list.into_iter().map(|c| c.project().name.clone()).collect()
}
