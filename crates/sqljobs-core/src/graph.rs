//! Dependency graph over task keys of a job spec.
//!
//! Design:
//! - Forward edges: task -> tasks it depends on (waits for)
//! - Reverse edges: task -> tasks that depend on it (waiting tasks)
//! - Invariant: edges and reverse_edges must be kept in sync
//!
//! The graph is a lint-time view of a static document. Nothing here schedules
//! anything; execution and `run_if` evaluation belong to the external service.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::{JobSpec, TaskKey};

/// Dependency graph for checking a spec's `depends_on` relation.
///
/// Maintains both directions for efficient lookups:
/// - `edges`: key -> set of keys it depends on
/// - `reverse_edges`: key -> set of keys waiting for it
pub struct DependencyGraph {
    /// Every known key, in first-seen (declaration) order. Drives
    /// deterministic iteration for cycle search and topological order.
    order: Vec<TaskKey>,

    /// Forward edges: task -> tasks it depends on (waits for).
    edges: HashMap<TaskKey, HashSet<TaskKey>>,

    /// Reverse edges: task -> tasks that depend on it.
    reverse_edges: HashMap<TaskKey, HashSet<TaskKey>>,
}

impl DependencyGraph {
    /// Create an empty dependency graph.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            edges: HashMap::new(),
            reverse_edges: HashMap::new(),
        }
    }

    /// Build the graph of a spec's `depends_on` relation.
    ///
    /// Keys referenced from `depends_on` but missing from `tasks` are still
    /// registered as nodes; `validate` reports them separately as unknown
    /// references.
    pub fn from_spec(spec: &JobSpec) -> Self {
        let mut graph = Self::new();
        for task in &spec.tasks {
            graph.add_task(task.task_key.clone());
        }
        for task in &spec.tasks {
            for dep in &task.depends_on {
                graph.add_dependency(task.task_key.clone(), dep.task_key.clone());
            }
        }
        graph
    }

    /// Register a key without edges.
    pub fn add_task(&mut self, key: TaskKey) {
        if !self.order.contains(&key) {
            self.order.push(key);
        }
    }

    /// Add a dependency: `task` depends on `depends_on`.
    ///
    /// Maintains the invariant by updating both directions:
    /// - edges: task -> {depends_on}
    /// - reverse_edges: depends_on -> {task}
    pub fn add_dependency(&mut self, task: TaskKey, depends_on: TaskKey) {
        self.add_task(task.clone());
        self.add_task(depends_on.clone());
        self.edges
            .entry(task.clone())
            .or_default()
            .insert(depends_on.clone());
        self.reverse_edges.entry(depends_on).or_default().insert(task);
    }

    /// Number of known keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Does `key` wait on anything?
    pub fn has_dependencies(&self, key: &TaskKey) -> bool {
        self.edges.get(key).map(|d| !d.is_empty()).unwrap_or(false)
    }

    /// Direct dependencies of `key`, sorted for stable output.
    pub fn dependencies_of(&self, key: &TaskKey) -> Vec<TaskKey> {
        let mut deps: Vec<TaskKey> = self
            .edges
            .get(key)
            .map(|d| d.iter().cloned().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    /// Tasks that directly wait on `key`, sorted for stable output.
    pub fn dependents_of(&self, key: &TaskKey) -> Vec<TaskKey> {
        let mut deps: Vec<TaskKey> = self
            .reverse_edges
            .get(key)
            .map(|d| d.iter().cloned().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    /// Keys with no dependencies, in declaration order. These are the entry
    /// points the service may start immediately.
    pub fn roots(&self) -> Vec<TaskKey> {
        self.order
            .iter()
            .filter(|k| !self.has_dependencies(k))
            .cloned()
            .collect()
    }

    /// Find a cycle in the `depends_on` relation.
    ///
    /// Returns one witness path `a -> ... -> a` (first and last element
    /// equal), or `None` for a DAG. Three-state depth-first search; a node on
    /// the current path seen again closes the cycle.
    pub fn detect_cycle(&self) -> Option<Vec<TaskKey>> {
        let mut state: HashMap<&TaskKey, VisitState> = HashMap::new();
        let mut path: Vec<TaskKey> = Vec::new();
        for key in &self.order {
            if !state.contains_key(key) {
                if let Some(cycle) = self.visit(key, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        key: &'a TaskKey,
        state: &mut HashMap<&'a TaskKey, VisitState>,
        path: &mut Vec<TaskKey>,
    ) -> Option<Vec<TaskKey>> {
        state.insert(key, VisitState::OnPath);
        path.push(key.clone());

        if let Some(deps) = self.edges.get(key) {
            let mut deps: Vec<&TaskKey> = deps.iter().collect();
            deps.sort();
            for dep in deps {
                match state.get(dep) {
                    Some(VisitState::OnPath) => {
                        let start = path.iter().position(|k| k == dep).unwrap_or(0);
                        let mut cycle: Vec<TaskKey> = path[start..].to_vec();
                        cycle.push(dep.clone());
                        return Some(cycle);
                    }
                    Some(VisitState::Done) => {}
                    None => {
                        if let Some(cycle) = self.visit(dep, state, path) {
                            return Some(cycle);
                        }
                    }
                }
            }
        }

        path.pop();
        state.insert(key, VisitState::Done);
        None
    }

    /// Topological order of the graph (Kahn's algorithm): every task appears
    /// after all of its dependencies. Roots come out in declaration order,
    /// later ties in key order. Returns `None` if the graph has a cycle.
    pub fn execution_order(&self) -> Option<Vec<TaskKey>> {
        let mut remaining: HashMap<&TaskKey, usize> = self
            .order
            .iter()
            .map(|k| (k, self.edges.get(k).map(HashSet::len).unwrap_or(0)))
            .collect();

        let mut ready: VecDeque<&TaskKey> = self
            .order
            .iter()
            .filter(|k| remaining[k] == 0)
            .collect();

        let mut result = Vec::with_capacity(self.order.len());
        while let Some(key) = ready.pop_front() {
            result.push(key.clone());
            let mut dependents: Vec<&TaskKey> = self
                .reverse_edges
                .get(key)
                .map(|d| d.iter().collect())
                .unwrap_or_default();
            dependents.sort();
            for dependent in dependents {
                let count = remaining.get_mut(dependent).expect("known key");
                *count -= 1;
                if *count == 0 {
                    ready.push_back(dependent);
                }
            }
        }

        if result.len() == self.order.len() {
            Some(result)
        } else {
            None
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    OnPath,
    Done,
}
