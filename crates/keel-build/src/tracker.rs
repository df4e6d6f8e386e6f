//! Record of the declared dependency graph, dumped as JSON or Graphviz
use crate::configuration::{Configuration, ConfigurationKey};
use crate::error::{BuildError, BuildResult};
use crate::project::ProjectKind;
use crate::setting::{DependencySetting, DependencyType};
use crate::targets::OutputKind;
use indexmap::IndexMap;
use keel_config::DumpFormat;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

const COLOR_EXE: &str = "lightcyan";
const COLOR_DLL: &str = "pink";
const COLOR_LIB: &str = "lemonchiffon";
const COLOR_UNKNOWN: &str = "white";
const COLOR_PUBLIC: &str = "green";
const COLOR_PRIVATE: &str = "red";
const SHAPE_PROJECT: &str = "egg";
const SHAPE_EXTERN: &str = "diamond";
const SHAPE_UNKNOWN: &str = "octagon";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedNode {
    pub id: String,
    pub project: String,
    pub target: String,
    pub output: OutputKind,
    pub kind: ProjectKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedEdge {
    pub from: String,
    pub to: String,
    pub kind: DependencyType,
    pub setting: DependencySetting,
}

/// Deterministic snapshot of everything recorded so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackedGraph {
    pub nodes: Vec<TrackedNode>,
    pub edges: Vec<TrackedEdge>,
}

#[derive(Default)]
struct Recorded {
    nodes: IndexMap<ConfigurationKey, TrackedNode>,
    edges: IndexMap<(String, String), TrackedEdge>,
}

/// Thread-safe recorder fed by link passes
#[derive(Default)]
pub struct DependencyTracker {
    recorded: Mutex<Recorded>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a configuration and its declared edges
    pub fn record(&self, configuration: &Configuration) {
        let key = configuration.key();
        let from = key.to_string();
        let mut recorded = self.lock();

        recorded.nodes.insert(
            key.clone(),
            TrackedNode {
                id: from.clone(),
                project: key.project.to_string(),
                target: key.target.to_string(),
                output: configuration.output,
                kind: configuration.project().kind,
            },
        );

        for (kind, project, target) in configuration.declaration().edges() {
            let to = ConfigurationKey {
                project: project.clone(),
                target: target.clone(),
            }
            .to_string();
            let setting = configuration
                .declaration()
                .setting(project, target)
                .unwrap_or(DependencySetting::DEFAULT);
            recorded.edges.insert(
                (from.clone(), to.clone()),
                TrackedEdge {
                    from: from.clone(),
                    to,
                    kind,
                    setting,
                },
            );
        }
    }

    pub fn snapshot(&self) -> TrackedGraph {
        let recorded = self.lock();
        let mut nodes: Vec<_> = recorded.nodes.values().cloned().collect();
        let mut edges: Vec<_> = recorded.edges.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        TrackedGraph { nodes, edges }
    }

    pub fn to_json(&self) -> BuildResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    pub fn to_dot(&self) -> String {
        let graph = self.snapshot();
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(out, "digraph dependencies {{");
        let _ = writeln!(out, "    graph [rankdir = \"TD\" splines=true];");

        for node in &graph.nodes {
            let shape = if node.kind.is_export() {
                SHAPE_EXTERN
            } else {
                SHAPE_PROJECT
            };
            let _ = writeln!(
                out,
                "    \"{}\" [label=\"{}\\n{}\" shape={} style=filled fillcolor={}];",
                node.id,
                node.project,
                node.target,
                shape,
                node_color(node.output)
            );
        }

        // Edge targets that were never linked themselves
        for edge in &graph.edges {
            if !graph.nodes.iter().any(|n| n.id == edge.to) {
                let _ = writeln!(
                    out,
                    "    \"{}\" [shape={} style=filled fillcolor={}];",
                    edge.to, SHAPE_UNKNOWN, COLOR_UNKNOWN
                );
            }
        }

        for edge in &graph.edges {
            let color = match edge.kind {
                DependencyType::Public => COLOR_PUBLIC,
                DependencyType::Private => COLOR_PRIVATE,
            };
            let _ = writeln!(
                out,
                "    \"{}\" -> \"{}\" [color={} penwidth=2 tooltip=\"{}\"];",
                edge.from, edge.to, color, edge.setting
            );
        }

        let _ = writeln!(out, "}}");
        out
    }

    pub fn render(&self, format: DumpFormat) -> BuildResult<String> {
        match format {
            DumpFormat::Json => self.to_json(),
            DumpFormat::Dot => Ok(self.to_dot()),
        }
    }

    /// Write the graph to `path`, creating parent directories
    pub fn write(&self, path: &Path, format: DumpFormat) -> BuildResult<()> {
        let contents = self.render(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        fs::write(path, contents).map_err(|e| BuildError::io(path, e))?;
        info!("Wrote dependency graph to {}", path.display());
        Ok(())
    }
}

fn node_color(output: OutputKind) -> &'static str {
    match output.simple() {
        OutputKind::Exe | OutputKind::AppleApp => COLOR_EXE,
        OutputKind::Dll | OutputKind::AppleBundle | OutputKind::AppleFramework => COLOR_DLL,
        OutputKind::Lib => COLOR_LIB,
        _ => COLOR_UNKNOWN,
    }
}
