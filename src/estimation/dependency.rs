//! Dependency graph with Kahn's algorithm for topological sorting
//!
//! Nodes are task IDs and edges run from a dependency to its dependent. The
//! graph never holds tasks themselves: an index maps each ID to its position in
//! the input list, and two adjacency maps hold the edges in both directions.
//! Ordered maps keep every traversal, and therefore every report, deterministic.

use super::error::{EstimationError, EstimationResult};
use crate::models::Task;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Validated DAG built from a task list
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Task ID -> position in the input task list
    index: BTreeMap<String, usize>,
    /// Task ID -> IDs it depends on, in declaration order
    depends_on: BTreeMap<String, Vec<String>>,
    /// Task ID -> IDs that depend on it, sorted
    dependents: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build and validate the graph for a task list.
    ///
    /// Fails on duplicate IDs, on dependencies naming unknown tasks (first
    /// offender in input order) and on cycles.
    pub fn build(tasks: &[Task]) -> EstimationResult<Self> {
        let mut index = BTreeMap::new();
        for (position, task) in tasks.iter().enumerate() {
            if index.insert(task.id.clone(), position).is_some() {
                return Err(EstimationError::DuplicateTaskId(task.id.clone()));
            }
        }

        let mut depends_on: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for id in index.keys() {
            depends_on.insert(id.clone(), Vec::new());
            dependents.insert(id.clone(), Vec::new());
        }

        for task in tasks {
            for dep_id in &task.dependencies {
                if !index.contains_key(dep_id) {
                    return Err(EstimationError::UnknownDependency {
                        task_id: task.id.clone(),
                        dependency_id: dep_id.clone(),
                    });
                }

                let deps = depends_on.entry(task.id.clone()).or_default();
                // Repeated references to the same dependency are one edge
                if deps.contains(dep_id) {
                    continue;
                }
                deps.push(dep_id.clone());

                dependents
                    .entry(dep_id.clone())
                    .or_default()
                    .push(task.id.clone());
            }
        }

        for blocked in dependents.values_mut() {
            blocked.sort();
        }

        let graph = Self {
            index,
            depends_on,
            dependents,
        };

        if let Some(cycle) = graph.find_cycle() {
            return Err(EstimationError::CyclicDependency { cycle });
        }

        log::debug!(
            "Built dependency graph: {} tasks, {} edges",
            graph.len(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.depends_on.values().map(|v| v.len()).sum()
    }

    /// Position of a task in the input list
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Get all tasks that `id` depends on
    pub fn get_dependencies(&self, id: &str) -> &[String] {
        self.depends_on.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get all tasks that depend on `id`
    pub fn get_dependents(&self, id: &str) -> &[String] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Depth-first search for a cycle.
    ///
    /// Returns the IDs along the first cycle found, starting from the node
    /// that was reached again while still in progress.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut in_progress: HashSet<&str> = HashSet::new();
        let mut completed: HashSet<&str> = HashSet::new();
        let mut path: Vec<&str> = Vec::new();

        for node in self.index.keys() {
            if completed.contains(node.as_str()) {
                continue;
            }
            if let Some(cycle) =
                self.dfs_cycle_detect(node, &mut in_progress, &mut completed, &mut path)
            {
                return Some(cycle.into_iter().map(str::to_string).collect());
            }
        }

        None
    }

    /// DFS helper for cycle detection
    fn dfs_cycle_detect<'a>(
        &'a self,
        node: &'a str,
        in_progress: &mut HashSet<&'a str>,
        completed: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<&'a str>> {
        in_progress.insert(node);
        path.push(node);

        for dep in self.get_dependencies(node) {
            let dep = dep.as_str();
            if in_progress.contains(dep) {
                let cycle_start = path.iter().position(|&n| n == dep).unwrap_or(0);
                return Some(path[cycle_start..].to_vec());
            }

            if !completed.contains(dep) {
                if let Some(cycle) = self.dfs_cycle_detect(dep, in_progress, completed, path) {
                    return Some(cycle);
                }
            }
        }

        in_progress.remove(node);
        completed.insert(node);
        path.pop();
        None
    }

    /// Execution order using Kahn's algorithm.
    ///
    /// Among tasks that are ready at the same time the smallest ID goes first,
    /// so identical input always yields the identical order.
    pub fn execution_order(&self) -> EstimationResult<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> = self
            .depends_on
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.len());

        while let Some(node) = ready.pop_first() {
            order.push(node.to_string());

            for dependent in self.get_dependents(node) {
                if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent.as_str());
                    }
                }
            }
        }

        if order.len() != self.len() {
            return Err(EstimationError::InternalConsistency(format!(
                "topological order covers {} of {} tasks in a validated graph",
                order.len(),
                self.len()
            )));
        }

        Ok(order)
    }

    /// Tasks with no dependencies
    pub fn roots(&self) -> Vec<String> {
        self.depends_on
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Tasks nothing depends on
    pub fn sinks(&self) -> Vec<String> {
        self.dependents
            .iter()
            .filter(|(_, blocked)| blocked.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Get statistics about the dependency graph
    pub fn stats(&self) -> DependencyStats {
        DependencyStats {
            total_nodes: self.len(),
            total_dependencies: self.edge_count(),
            max_depth: self.calculate_max_depth(),
            root_nodes: self.roots(),
            leaf_nodes: self.sinks(),
        }
    }

    /// Longest dependency chain, counted in edges
    fn calculate_max_depth(&self) -> usize {
        let mut memo: HashMap<&str, usize> = HashMap::new();
        self.index
            .keys()
            .map(|id| self.node_depth(id, &mut memo))
            .max()
            .unwrap_or(0)
    }

    /// Depth of a single node (memoized). Only called on acyclic graphs.
    fn node_depth<'a>(&'a self, node: &'a str, memo: &mut HashMap<&'a str, usize>) -> usize {
        if let Some(&depth) = memo.get(node) {
            return depth;
        }

        let depth = self
            .get_dependencies(node)
            .iter()
            .map(|d| 1 + self.node_depth(d, memo))
            .max()
            .unwrap_or(0);

        memo.insert(node, depth);
        depth
    }
}

/// Statistics about a dependency graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyStats {
    pub total_nodes: usize,
    pub total_dependencies: usize,
    /// Maximum depth of the dependency chain
    pub max_depth: usize,
    /// Tasks with no dependencies (can start immediately)
    pub root_nodes: Vec<String>,
    /// Tasks nothing depends on (end points)
    pub leaf_nodes: Vec<String>,
}
