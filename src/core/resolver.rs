//! Plugin dependency graph resolution.
//!
//! Load order is a post-order DFS over the declared dependency edges, so
//! every dependency lands at a strictly earlier index than its dependents.
//! Sibling order falls out of `add_node` insertion order; callers must not
//! rely on it.

use rustc_hash::{FxHashMap, FxHashSet};

pub type Result<T> = std::result::Result<T, ResolveError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    CircularDependency { id: String },
    UnknownDependency { id: String, dependency: String },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::CircularDependency { id } => {
                write!(f, "circular dependency involving '{}'", id)
            }
            ResolveError::UnknownDependency { id, dependency } => {
                write!(f, "'{}' depends on unknown node '{}'", id, dependency)
            }
        }
    }
}

impl std::error::Error for ResolveError {}

#[derive(Debug, Default)]
pub struct DependencyResolver {
    deps: FxHashMap<String, Vec<String>>,
    order: Vec<String>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a node and its dependency set. Re-adding an id overwrites its
    /// dependencies but keeps the original insertion position.
    pub fn add_node(&mut self, id: String, dependencies: Vec<String>) {
        if self.deps.insert(id.clone(), dependencies).is_none() {
            self.order.push(id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.deps.contains_key(id)
    }

    /// True iff the graph holds at least one cycle (self-loops included).
    /// Dependencies on unknown ids are treated as leaves here; they are
    /// reported by [`resolve_load_order`](Self::resolve_load_order) instead.
    pub fn has_circular_dependencies(&self) -> bool {
        let mut visiting = FxHashSet::default();
        let mut visited = FxHashSet::default();
        for id in &self.order {
            if self.probe_cycle(id, &mut visiting, &mut visited) {
                return true;
            }
        }
        false
    }

    fn probe_cycle(
        &self,
        id: &str,
        visiting: &mut FxHashSet<String>,
        visited: &mut FxHashSet<String>,
    ) -> bool {
        if visited.contains(id) {
            return false;
        }
        if !visiting.insert(id.to_string()) {
            return true;
        }
        if let Some(deps) = self.deps.get(id) {
            for dep in deps {
                if visiting.contains(dep.as_str()) || self.probe_cycle(dep, visiting, visited) {
                    return true;
                }
            }
        }
        visiting.remove(id);
        visited.insert(id.to_string());
        false
    }

    /// Returns every node id ordered so that each node's dependencies appear
    /// strictly before it. Fails on cycles and on dependencies that were
    /// never added.
    pub fn resolve_load_order(&self) -> Result<Vec<String>> {
        let mut visiting = FxHashSet::default();
        let mut visited = FxHashSet::default();
        let mut out = Vec::with_capacity(self.order.len());
        for id in &self.order {
            self.visit(id, &mut visiting, &mut visited, &mut out)?;
        }
        Ok(out)
    }

    fn visit(
        &self,
        id: &str,
        visiting: &mut FxHashSet<String>,
        visited: &mut FxHashSet<String>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        if visited.contains(id) {
            return Ok(());
        }
        if !visiting.insert(id.to_string()) {
            return Err(ResolveError::CircularDependency { id: id.to_string() });
        }
        if let Some(deps) = self.deps.get(id) {
            for dep in deps {
                if !self.deps.contains_key(dep.as_str()) {
                    return Err(ResolveError::UnknownDependency {
                        id: id.to_string(),
                        dependency: dep.clone(),
                    });
                }
                if visiting.contains(dep.as_str()) {
                    return Err(ResolveError::CircularDependency { id: dep.clone() });
                }
                self.visit(dep, visiting, visited, out)?;
            }
        }
        visiting.remove(id);
        visited.insert(id.to_string());
        out.push(id.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/resolver.rs"]
mod tests;
