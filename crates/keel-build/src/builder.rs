//! Link orchestration over a whole workspace
use crate::configuration::Configuration;
use crate::error::BuildResult;
use crate::link::{link, LinkContext, LinkOptions};
use crate::platform::PlatformRegistry;
use crate::tracker::DependencyTracker;
use crate::workspace::Workspace;

use keel_config::{Config, DumpFormat};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};

/// Linker configuration
#[derive(Debug, Clone)]
pub struct LinkerConfig {
    /// Link configurations on a worker pool
    pub multithreaded: bool,
    /// Worker count, `None` lets rayon decide
    pub threads: Option<usize>,
    pub options: LinkOptions,
    /// Where to write the dependency graph, if anywhere
    pub dump: Option<(PathBuf, DumpFormat)>,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            multithreaded: true,
            threads: None,
            options: LinkOptions::default(),
            dump: None,
        }
    }
}

impl LinkerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            multithreaded: config.multithreaded(),
            threads: config.threads(),
            options: LinkOptions::from_config(config),
            dump: config
                .dump_enabled()
                .then(|| (config.dump_path(), config.dump_format())),
        }
    }
}

/// Link statistics
#[derive(Debug, Clone, Default)]
pub struct LinkStats {
    /// Configurations registered in the workspace
    pub total_configurations: usize,
    /// Configurations linked by this run
    pub linked_configurations: usize,
    /// Configurations that were already linked
    pub skipped_configurations: usize,
    pub total_time: Duration,
}

/// Links every configuration of a workspace
pub struct Linker {
    config: LinkerConfig,
    platforms: PlatformRegistry,
}

impl Linker {
    pub fn new(platforms: PlatformRegistry) -> Self {
        Self {
            config: LinkerConfig::default(),
            platforms,
        }
    }

    /// Set linker configuration
    pub fn with_config(mut self, config: LinkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable/disable the worker pool
    pub fn with_multithreaded(mut self, multithreaded: bool) -> Self {
        self.config.multithreaded = multithreaded;
        self
    }

    pub fn with_options(mut self, options: LinkOptions) -> Self {
        self.config.options = options;
        self
    }

    /// Write the dependency graph after linking
    pub fn with_dump(mut self, path: impl Into<PathBuf>, format: DumpFormat) -> Self {
        self.config.dump = Some((path.into(), format));
        self
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Link all configurations not linked yet, stopping at the first error
    pub fn link_all(&self, workspace: &Workspace) -> BuildResult<LinkStats> {
        let start = Instant::now();
        let span = info_span!("link_all", configurations = workspace.len());
        let _enter = span.enter();

        let tracker = self.config.dump.as_ref().map(|_| DependencyTracker::new());
        let mut ctx =
            LinkContext::new(workspace, &self.platforms).with_options(self.config.options);
        if let Some(tracker) = &tracker {
            ctx = ctx.with_tracker(tracker);
        }

        let pending: Vec<&Arc<Configuration>> =
            workspace.configurations().filter(|c| !c.is_linked()).collect();
        let skipped = workspace.len() - pending.len();
        let linked = AtomicUsize::new(0);

        let link_one = |conf: &&Arc<Configuration>| -> BuildResult<()> {
            link(conf, &ctx)?;
            linked.fetch_add(1, Ordering::Relaxed);
            Ok(())
        };

        if self.config.multithreaded {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(threads) = self.config.threads {
                builder = builder.num_threads(threads);
            }
            let pool = builder.build()?;
            debug!(
                "Linking {} configurations on {} workers",
                pending.len(),
                pool.current_num_threads()
            );
            pool.install(|| pending.par_iter().try_for_each(link_one))?;
        } else {
            debug!("Linking {} configurations sequentially", pending.len());
            pending.iter().try_for_each(link_one)?;
        }

        if let (Some(tracker), Some((path, format))) = (&tracker, &self.config.dump) {
            tracker.write(path, *format)?;
        }

        let stats = LinkStats {
            total_configurations: workspace.len(),
            linked_configurations: linked.load(Ordering::Relaxed),
            skipped_configurations: skipped,
            total_time: start.elapsed(),
        };

        info!(
            "Linked {} configurations ({} already linked) in {:.2}s",
            stats.linked_configurations,
            stats.skipped_configurations,
            stats.total_time.as_secs_f64()
        );

        Ok(stats)
    }
}

impl Default for Linker {
    fn default() -> Self {
        Self::new(PlatformRegistry::with_builtin_platforms())
    }
}
