//! Link pass: resolve one configuration's dependencies into its outputs
use crate::configuration::Configuration;
use crate::contribution::{contributions, Accumulator};
use crate::error::{BuildError, BuildResult};
use crate::graph::DependencyGraph;
use crate::platform::PlatformRegistry;
use crate::propagation::PropagationState;
use crate::resolved::{DotNetDependency, ResolvedOutputs};
use crate::tracker::DependencyTracker;
use crate::workspace::DependencyResolver;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, debug_span, trace};

/// Knobs of a single link pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Fail on any dependency cycle reachable from the configuration
    pub strict_cycles: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            strict_cycles: true,
        }
    }
}

impl LinkOptions {
    pub fn from_config(config: &keel_config::Config) -> Self {
        Self {
            strict_cycles: config.strict_cycles(),
        }
    }

    pub fn with_strict_cycles(mut self, strict: bool) -> Self {
        self.strict_cycles = strict;
        self
    }
}

/// Collaborators of a link pass
#[derive(Clone, Copy)]
pub struct LinkContext<'a> {
    pub resolver: &'a dyn DependencyResolver,
    pub platforms: &'a PlatformRegistry,
    pub options: LinkOptions,
    pub tracker: Option<&'a DependencyTracker>,
}

impl<'a> LinkContext<'a> {
    pub fn new(resolver: &'a dyn DependencyResolver, platforms: &'a PlatformRegistry) -> Self {
        Self {
            resolver,
            platforms,
            options: LinkOptions::default(),
            tracker: None,
        }
    }

    pub fn with_options(mut self, options: LinkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_tracker(mut self, tracker: &'a DependencyTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }
}

/// Link order of configurations: project priority, canonical name, then target
pub fn link_order(a: &Configuration, b: &Configuration) -> Ordering {
    a.project()
        .link_order(b.project())
        .then_with(|| a.target().cmp(b.target()))
}

/// Resolve `root`'s outputs, exactly once
///
/// A failed pass publishes nothing and leaves the configuration unlinked.
pub fn link(root: &Arc<Configuration>, ctx: &LinkContext<'_>) -> BuildResult<()> {
    root.begin_link()?;

    let span = debug_span!("link", configuration = %root);
    let _enter = span.enter();

    match resolve(root, ctx) {
        Ok(outputs) => {
            debug!(
                public = outputs.public_dependencies.len(),
                private = outputs.private_dependencies.len(),
                "Linked {}",
                root
            );
            root.finish_link(outputs);
            Ok(())
        }
        Err(e) => {
            root.abort_link();
            Err(e)
        }
    }
}

fn resolve(root: &Arc<Configuration>, ctx: &LinkContext<'_>) -> BuildResult<ResolvedOutputs> {
    if let Some(tracker) = ctx.tracker {
        tracker.record(root);
    }

    let graph = DependencyGraph::build(root, ctx.resolver)?;

    if ctx.options.strict_cycles {
        if let Some(chain) = graph.find_cycle() {
            return Err(BuildError::CircularDependency(chain.join(" -> ")));
        }
    }

    let mut acc = Accumulator::default();
    acc.outputs.library_paths.extend(
        ctx.platforms
            .get(&root.platform)
            .platform_library_paths(root),
    );

    // The root expands its children but is never visited as a dependency of
    // itself, except through a cycle.
    let root_node = graph.node(graph.root());
    let root_state = PropagationState::root();
    let mut stack: Vec<_> = root_node
        .children()
        .iter()
        .rev()
        .map(|edge| {
            (
                edge.child,
                root_state.next(edge, true, root_node.configuration.output.is_dynamic_library()),
            )
        })
        .collect();
    let mut visited = HashSet::new();

    while let Some((id, state)) = stack.pop() {
        if !visited.insert((id, state)) {
            continue;
        }

        let node = graph.node(id);
        let dependency = &node.configuration;
        let is_dynamic = dependency.output.is_dynamic_library();
        stack.extend(
            node.children()
                .iter()
                .rev()
                .map(|edge| (edge.child, state.next(edge, false, is_dynamic))),
        );

        trace!(dependency = %dependency, state = ?state, "Visiting");

        if state.is_exposed_to_root() {
            acc.classify(dependency, state.has_public_path_to_root);
        }

        let tasks = ctx.platforms.get(&dependency.platform);
        for effect in contributions(root, dependency, &state, tasks)? {
            acc.apply(effect, dependency, &state, tasks);
        }
    }

    finish(root, acc, visited.len())
}

fn finish(root: &Configuration, acc: Accumulator, visits: usize) -> BuildResult<ResolvedOutputs> {
    let overlap: Vec<String> = acc
        .public
        .iter()
        .filter(|c| acc.private.contains(*c))
        .map(|c| c.to_string())
        .chain(
            acc.dotnet_public
                .iter()
                .filter(|d| acc.dotnet_private.contains(*d))
                .map(|d| d.configuration.to_string()),
        )
        .collect();
    if !overlap.is_empty() {
        return Err(BuildError::InconsistentResolution {
            configuration: root.to_string(),
            overlap: overlap.join(", "),
        });
    }

    let mut outputs = acc.outputs;

    let mut public: Vec<_> = acc.public.into_iter().collect();
    let mut private: Vec<_> = acc.private.into_iter().collect();
    public.sort_by(|a, b| link_order(a, b));
    private.sort_by(|a, b| link_order(a, b));

    let mut dotnet_public: Vec<DotNetDependency> = acc.dotnet_public.into_iter().collect();
    let mut dotnet_private: Vec<DotNetDependency> = acc.dotnet_private.into_iter().collect();
    dotnet_public.sort_by(|a, b| link_order(&a.configuration, &b.configuration));
    dotnet_private.sort_by(|a, b| link_order(&a.configuration, &b.configuration));

    outputs.link_dependencies.sort_by(|a, b| link_order(a, b));

    outputs.dependencies = public.iter().chain(private.iter()).cloned().collect();
    outputs.public_dependencies = public;
    outputs.private_dependencies = private;
    outputs.dotnet_public_dependencies = dotnet_public;
    outputs.dotnet_private_dependencies = dotnet_private;

    trace!(visits, "Resolved {}", root);
    Ok(outputs)
}
