//! Keel dependency resolution
//!
//! Turns declared inter-project dependencies into the resolved, per-configuration
//! inputs project-file generators consume:
//! - Projects, configurations and their public/private dependency declarations
//! - Dependency graph with shared nodes per configuration
//! - Path-sensitive propagation of include paths, libraries and copy lists
//! - Deterministic link order and build-order queries
//! - Parallel linking of a whole workspace
//! - Dependency graph dumps (JSON, Graphviz)
//!
//! # Example
//!
//! ```
//! use keel_build::{
//!     link, Configuration, DependencySetting, LinkContext, OutputKind, PlatformRegistry,
//!     Project, ProjectId, Workspace,
//! };
//!
//! let mut workspace = Workspace::new();
//! let core = workspace.add_project(Project::new("game::Core"));
//! let app = workspace.add_project(Project::new("game::App"));
//!
//! workspace
//!     .add_configuration(Configuration::new(core, "debug", OutputKind::Lib))
//!     .unwrap();
//! let mut game = Configuration::new(app, "debug", OutputKind::Exe);
//! game.add_public_dependency("game::Core", "debug", DependencySetting::DEFAULT)
//!     .unwrap();
//! let game = workspace.add_configuration(game).unwrap();
//!
//! let platforms = PlatformRegistry::new();
//! link(&game, &LinkContext::new(&workspace, &platforms)).unwrap();
//! assert!(game.resolved().unwrap().is_public(&ProjectId::new("game::Core")));
//! ```

pub mod build_order;
pub mod builder;
pub mod configuration;
pub mod contribution;
pub mod error;
pub mod graph;
pub mod link;
pub mod platform;
pub mod project;
pub mod propagation;
pub mod resolved;
pub mod setting;
pub mod targets;
pub mod tracker;
pub mod workspace;

// Re-export main types
pub use build_order::{recursive_dependencies, BuildOrder};
pub use builder::{LinkStats, Linker, LinkerConfig};
pub use configuration::{Configuration, ConfigurationKey, DependencyDeclaration, LinkState};
pub use contribution::{contributions, Effect};
pub use error::{BuildError, BuildResult};
pub use graph::{DependencyEdge, DependencyGraph, DependencyNode, NodeId};
pub use link::{link, link_order, LinkContext, LinkOptions};
pub use platform::{ConfigurationTasks, DefaultPlatform, PlatformRegistry, UnixPlatform};
pub use project::{
    Project, ProjectId, ProjectKind, DEPENDENCIES_ORDER_FIRST, DEPENDENCIES_ORDER_LAST,
    DEPENDENCIES_ORDER_NORMAL,
};
pub use propagation::PropagationState;
pub use resolved::{DotNetDependency, ResolvedOutputs};
pub use setting::{DependencySetting, DependencyType};
pub use targets::{OutputKind, Platform, Target};
pub use tracker::{DependencyTracker, TrackedEdge, TrackedGraph, TrackedNode};
pub use workspace::{DependencyResolver, Workspace};
