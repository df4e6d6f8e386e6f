//! Build order over linked configurations
//!
//! Both queries read the `dependencies` list of already linked configurations
//! and reject cycles, which the link pass itself tolerates when strict cycle
//! checking is off.

use crate::configuration::Configuration;
use crate::error::{BuildError, BuildResult};
use crate::link::link_order;
use indexmap::IndexSet;
use std::collections::HashSet;
use std::sync::Arc;

/// Every configuration `configuration` transitively depends on
///
/// Dependencies come before their dependents.
pub fn recursive_dependencies(
    configuration: &Arc<Configuration>,
) -> BuildResult<Vec<Arc<Configuration>>> {
    let mut resolved = IndexSet::new();
    let mut visiting = HashSet::new();
    let mut path = vec![configuration.to_string()];
    visiting.insert(configuration.clone());

    collect(configuration, &mut resolved, &mut visiting, &mut path)?;
    Ok(resolved.into_iter().collect())
}

fn collect(
    configuration: &Arc<Configuration>,
    resolved: &mut IndexSet<Arc<Configuration>>,
    visiting: &mut HashSet<Arc<Configuration>>,
    path: &mut Vec<String>,
) -> BuildResult<()> {
    let outputs = configuration.try_resolved()?;

    // A configuration listing itself only proves a cycle through it; follow the
    // other entries first so the reported chain names the whole loop
    let mut self_reference = false;
    for dependency in &outputs.dependencies {
        if dependency == configuration {
            self_reference = true;
            continue;
        }
        if resolved.contains(dependency) {
            continue;
        }
        if !visiting.insert(dependency.clone()) {
            return Err(cycle(path, dependency));
        }

        path.push(dependency.to_string());
        collect(dependency, resolved, visiting, path)?;
        path.pop();

        visiting.remove(dependency);
        resolved.insert(dependency.clone());
    }

    if self_reference {
        return Err(cycle(path, configuration));
    }
    Ok(())
}

fn cycle(path: &[String], closing: &Configuration) -> BuildError {
    let closing = closing.to_string();
    let start = path.iter().position(|p| *p == closing).unwrap_or(0);
    let mut chain = path[start..].to_vec();
    chain.push(closing);
    BuildError::CircularDependency(chain.join(" -> "))
}

/// Waves of linked configurations that can be built concurrently
#[derive(Debug, Clone)]
pub struct BuildOrder {
    configurations: Vec<Arc<Configuration>>,
}

impl BuildOrder {
    pub fn new(configurations: impl IntoIterator<Item = Arc<Configuration>>) -> BuildResult<Self> {
        let configurations: Vec<_> = configurations.into_iter().collect();
        if let Some(unlinked) = configurations.iter().find(|c| !c.is_linked()) {
            return Err(BuildError::not_linked(unlinked));
        }
        Ok(Self { configurations })
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Dependencies of `configuration` that are part of this order
    ///
    /// A self entry, left behind by a cycle through `configuration`, is
    /// skipped so the loop itself gets reported.
    fn local_dependencies<'a>(
        &'a self,
        members: &'a HashSet<&'a Arc<Configuration>>,
        configuration: &'a Arc<Configuration>,
    ) -> impl Iterator<Item = &'a Arc<Configuration>> + 'a {
        configuration
            .resolved()
            .map(|r| r.dependencies.as_slice())
            .unwrap_or_default()
            .iter()
            .filter(move |d| *d != configuration && members.contains(d))
    }

    /// Kahn layering: each group depends only on earlier groups
    pub fn parallel_groups(&self) -> BuildResult<Vec<Vec<Arc<Configuration>>>> {
        let members: HashSet<&Arc<Configuration>> = self.configurations.iter().collect();
        let mut built: HashSet<&Arc<Configuration>> = HashSet::new();
        let mut groups = Vec::new();

        while built.len() < members.len() {
            let mut group: Vec<Arc<Configuration>> = self
                .configurations
                .iter()
                .filter(|c| !built.contains(c))
                .filter(|c| self.local_dependencies(&members, c).all(|d| built.contains(d)))
                .cloned()
                .collect();

            if group.is_empty() {
                return Err(self.cycle_error(&members, &built));
            }

            group.sort_by(|a, b| link_order(a, b));
            for conf in &group {
                if let Some(member) = members.get(conf) {
                    built.insert(*member);
                }
            }
            groups.push(group);
        }

        Ok(groups)
    }

    /// Groups flattened into a single sequential order
    pub fn sequence(&self) -> BuildResult<Vec<Arc<Configuration>>> {
        Ok(self.parallel_groups()?.into_iter().flatten().collect())
    }

    fn cycle_error(
        &self,
        members: &HashSet<&Arc<Configuration>>,
        built: &HashSet<&Arc<Configuration>>,
    ) -> BuildError {
        let mut done = HashSet::new();
        for start in self.configurations.iter().filter(|c| !built.contains(c)) {
            let mut path = Vec::new();
            if let Some(chain) = self.find_cycle(members, start, &mut done, &mut path) {
                return BuildError::CircularDependency(chain);
            }
        }
        BuildError::CircularDependency("unknown cycle".to_string())
    }

    fn find_cycle(
        &self,
        members: &HashSet<&Arc<Configuration>>,
        configuration: &Arc<Configuration>,
        done: &mut HashSet<Arc<Configuration>>,
        path: &mut Vec<Arc<Configuration>>,
    ) -> Option<String> {
        if let Some(start) = path.iter().position(|p| p == configuration) {
            let mut chain: Vec<String> = path[start..].iter().map(|c| c.to_string()).collect();
            chain.push(configuration.to_string());
            return Some(chain.join(" -> "));
        }
        if done.contains(configuration) {
            return None;
        }

        path.push(configuration.clone());
        for dependency in self.local_dependencies(members, configuration) {
            if let Some(chain) = self.find_cycle(members, dependency, done, path) {
                return Some(chain);
            }
        }
        path.pop();
        done.insert(configuration.clone());
        None
    }
}
