//! Dependency graph of one link pass
//!
//! The graph holds one node per distinct configuration reachable from the root.
//! A configuration reached along several paths shares its node, and each node's
//! children are resolved once and frozen before any propagation walk starts.

use crate::configuration::{Configuration, ConfigurationKey};
use crate::error::{BuildError, BuildResult};
use crate::setting::{DependencySetting, DependencyType};
use crate::workspace::DependencyResolver;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Index of a node inside its [`DependencyGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[cfg(test)]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Declared edge from a node to one of its dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub child: NodeId,
    pub kind: DependencyType,
    /// Setting registered by the declaring configuration
    pub setting: DependencySetting,
}

#[derive(Debug)]
pub struct DependencyNode {
    pub configuration: Arc<Configuration>,
    children: Vec<DependencyEdge>,
}

impl DependencyNode {
    /// Children sorted by link order
    pub fn children(&self) -> &[DependencyEdge] {
        &self.children
    }
}

#[derive(Debug)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    index: HashMap<ConfigurationKey, NodeId>,
    root: NodeId,
}

impl DependencyGraph {
    /// Resolve every configuration reachable from `root`
    pub fn build(
        root: &Arc<Configuration>,
        resolver: &dyn DependencyResolver,
    ) -> BuildResult<Self> {
        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            root: NodeId(0),
        };
        let root_id = graph.insert(root.clone());
        graph.root = root_id;

        let mut pending = vec![root_id];
        while let Some(id) = pending.pop() {
            let declaring = graph.nodes[id.0].configuration.clone();
            let mut children = Vec::with_capacity(declaring.declaration().len());

            for (kind, project, target) in declaring.declaration().edges() {
                let dependency = resolver.resolve(&declaring, project, target)?;
                if dependency.target() != target {
                    return Err(BuildError::TargetMismatch {
                        configuration: declaring.to_string(),
                        project: project.clone(),
                        requested: target.clone(),
                        resolved: dependency.target().clone(),
                    });
                }

                let setting = declaring
                    .declaration()
                    .setting(project, target)
                    .unwrap_or(DependencySetting::DEFAULT);

                let child = match graph.index.get(&dependency.key()) {
                    Some(existing) => *existing,
                    None => {
                        let fresh = graph.insert(dependency);
                        pending.push(fresh);
                        fresh
                    }
                };

                children.push(DependencyEdge {
                    child,
                    kind,
                    setting,
                });
            }

            children.sort_by(|a, b| {
                graph.nodes[a.child.0]
                    .configuration
                    .project()
                    .link_order(graph.nodes[b.child.0].configuration.project())
            });
            graph.nodes[id.0].children = children;
        }

        debug!(
            "Built dependency graph for {}: {} nodes",
            root,
            graph.nodes.len()
        );
        Ok(graph)
    }

    fn insert(&mut self, configuration: Arc<Configuration>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.insert(configuration.key(), id);
        self.nodes.push(DependencyNode {
            configuration,
            children: Vec::new(),
        });
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.nodes[id.0]
    }

    pub fn find(&self, key: &ConfigurationKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DependencyNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First cycle reachable from the root, as a chain of configuration names
    /// ending with its first element
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            OnPath,
            Done,
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        // (node, next child to explore)
        let mut path: Vec<(NodeId, usize)> = vec![(self.root, 0)];
        marks[self.root.0] = Mark::OnPath;

        while let Some((id, next)) = path.last().copied() {
            let children = &self.nodes[id.0].children;
            if next == children.len() {
                marks[id.0] = Mark::Done;
                path.pop();
                continue;
            }

            if let Some(top) = path.last_mut() {
                top.1 += 1;
            }

            let child = children[next].child;
            match marks[child.0] {
                Mark::New => {
                    marks[child.0] = Mark::OnPath;
                    path.push((child, 0));
                }
                Mark::OnPath => {
                    let start = path.iter().position(|(n, _)| *n == child).unwrap_or(0);
                    let mut chain: Vec<String> = path[start..]
                        .iter()
                        .map(|(n, _)| self.nodes[n.0].configuration.to_string())
                        .collect();
                    chain.push(self.nodes[child.0].configuration.to_string());
                    return Some(chain);
                }
                Mark::Done => {}
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Project, ProjectId};
    use crate::targets::{OutputKind, Target};
    use crate::workspace::Workspace;

    fn lib(
        workspace: &mut Workspace,
        name: &str,
        deps: &[(&str, DependencyType)],
    ) -> Arc<Configuration> {
        let project = workspace
            .project(&ProjectId::new(name))
            .cloned()
            .unwrap_or_else(|| workspace.add_project(Project::new(name)));
        let mut conf = Configuration::new(project, "debug", OutputKind::Lib);
        for (dep, kind) in deps {
            match kind {
                DependencyType::Public => {
                    conf.add_public_dependency(*dep, "debug", DependencySetting::DEFAULT)
                }
                DependencyType::Private => {
                    conf.add_private_dependency(*dep, "debug", DependencySetting::DEFAULT)
                }
            }
            .unwrap();
        }
        workspace.add_configuration(conf).unwrap()
    }

    #[test]
    fn test_shared_node_for_diamond() {
        let mut ws = Workspace::new();
        lib(&mut ws, "d::D", &[]);
        lib(&mut ws, "d::B", &[("d::D", DependencyType::Public)]);
        lib(&mut ws, "d::C", &[("d::D", DependencyType::Private)]);
        let root = lib(
            &mut ws,
            "d::A",
            &[("d::B", DependencyType::Public), ("d::C", DependencyType::Public)],
        );

        let graph = DependencyGraph::build(&root, &ws).unwrap();
        assert_eq!(graph.len(), 4);
        assert!(graph.find_cycle().is_none());

        let d = graph.find(&ConfigurationKey {
            project: ProjectId::new("d::D"),
            target: Target::new("debug"),
        });
        assert!(d.is_some());
    }

    #[test]
    fn test_children_sorted_by_link_order() {
        let mut ws = Workspace::new();
        ws.add_project(
            Project::new("z::Early")
                .with_dependencies_order(crate::project::DEPENDENCIES_ORDER_FIRST),
        );
        lib(&mut ws, "z::Early", &[]);
        lib(&mut ws, "a::Beta", &[]);
        lib(&mut ws, "a::Alpha", &[]);
        let root = lib(
            &mut ws,
            "a::Root",
            &[
                ("a::Beta", DependencyType::Private),
                ("a::Alpha", DependencyType::Public),
                ("z::Early", DependencyType::Public),
            ],
        );

        let graph = DependencyGraph::build(&root, &ws).unwrap();
        let names: Vec<&str> = graph
            .node(graph.root())
            .children()
            .iter()
            .map(|e| graph.node(e.child).configuration.project().id.as_str())
            .collect();
        assert_eq!(names, vec!["z::Early", "a::Alpha", "a::Beta"]);
    }

    #[test]
    fn test_unknown_dependency_names_declaring_configuration() {
        let mut ws = Workspace::new();
        let root = lib(&mut ws, "a::Root", &[("a::Ghost", DependencyType::Public)]);

        let err = DependencyGraph::build(&root, &ws).unwrap_err();
        assert!(err.is_configuration_mismatch());
        assert!(err.to_string().contains("a::Root [debug]"));
    }

    #[test]
    fn test_find_cycle_reports_chain() {
        let mut ws = Workspace::new();
        let a_project = ws.add_project(Project::new("c::A"));
        ws.add_project(Project::new("c::B"));

        let mut a = Configuration::new(a_project, "debug", OutputKind::Lib);
        a.add_public_dependency("c::B", "debug", DependencySetting::DEFAULT).unwrap();
        let a = ws.add_configuration(a).unwrap();
        lib(&mut ws, "c::B", &[("c::A", DependencyType::Public)]);

        let graph = DependencyGraph::build(&a, &ws).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.find_cycle(),
            Some(vec![
                "c::A [debug]".to_string(),
                "c::B [debug]".to_string(),
                "c::A [debug]".to_string(),
            ])
        );
    }

    struct WrongTarget(Arc<Configuration>);

    impl DependencyResolver for WrongTarget {
        fn resolve(
            &self,
            _: &Configuration,
            _: &ProjectId,
            _: &Target,
        ) -> BuildResult<Arc<Configuration>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_target_mismatch() {
        let release = Arc::new(Configuration::new(
            Arc::new(Project::new("m::Core")),
            "release",
            OutputKind::Lib,
        ));
        let mut root =
            Configuration::new(Arc::new(Project::new("m::App")), "debug", OutputKind::Exe);
        root.add_public_dependency("m::Core", "debug", DependencySetting::DEFAULT).unwrap();

        let err = DependencyGraph::build(&Arc::new(root), &WrongTarget(release)).unwrap_err();
        assert!(matches!(err, BuildError::TargetMismatch { .. }));
    }
}
