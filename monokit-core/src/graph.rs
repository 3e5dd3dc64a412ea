//! Dependency graph management using petgraph.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Error, Result};
use crate::package::Package;

/// Directed acyclic graph of package dependencies.
///
/// Edges point from a package to its dependencies. Declared dependencies that
/// do not name an in-workspace package are treated as external and carry no
/// edge. Read-only for the duration of one command invocation.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    packages: HashMap<NodeIndex, Package>,
    cached_topological_order: Vec<String>,
    dependency_levels: Vec<Vec<String>>,
}

impl DependencyGraph {
    /// Creates a new dependency graph from a list of packages.
    ///
    /// # Errors
    ///
    /// Returns `Error::CircularDependency` reporting the offending cycle
    /// (e.g. `a -> b -> a`) if the local edges form a cycle.
    pub fn new(packages: Vec<Package>) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut packages_map = HashMap::new();

        for package in &packages {
            let node = graph.add_node(package.name.clone());
            node_map.insert(package.name.clone(), node);
            packages_map.insert(node, package.clone());
        }

        for package in &packages {
            let from_node = node_map[&package.name];
            for dep_name in &package.deps {
                // Names not present in the workspace are external dependencies.
                if let Some(to_node) = node_map.get(dep_name) {
                    graph.add_edge(from_node, *to_node, ());
                }
            }
        }

        let topological_order = Self::topological_sort(&graph)?;
        let dependency_levels = Self::compute_dependency_levels(&graph, &topological_order);

        Ok(Self {
            graph,
            node_map,
            packages: packages_map,
            cached_topological_order: topological_order,
            dependency_levels,
        })
    }

    /// Kahn's algorithm over dependency edges. A non-empty residual set means
    /// a cycle, which is recovered via DFS so the error can name the path.
    fn topological_sort(graph: &DiGraph<String, ()>) -> Result<Vec<String>> {
        let mut remaining: HashMap<NodeIndex, usize> = graph
            .node_indices()
            .map(|idx| {
                (
                    idx,
                    graph.neighbors_directed(idx, Direction::Outgoing).count(),
                )
            })
            .collect();

        let mut ready: Vec<NodeIndex> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(idx, _)| *idx)
            .collect();
        ready.sort_by(|a, b| graph[*a].cmp(&graph[*b]));

        let mut order = Vec::with_capacity(graph.node_count());
        while let Some(idx) = ready.pop() {
            remaining.remove(&idx);
            order.push(graph[idx].clone());

            let mut released = Vec::new();
            for dependent in graph.neighbors_directed(idx, Direction::Incoming) {
                if let Some(count) = remaining.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        released.push(dependent);
                    }
                }
            }
            released.sort_by(|a, b| graph[*b].cmp(&graph[*a]));
            ready.extend(released);
        }

        if order.len() != graph.node_count() {
            return Err(Error::CircularDependency(Self::find_cycle(graph)));
        }

        Ok(order)
    }

    /// Locates one directed cycle with a recursion-stack DFS and renders it
    /// as `a -> b -> a`.
    fn find_cycle(graph: &DiGraph<String, ()>) -> String {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();
        let mut on_stack = HashSet::new();

        fn visit(
            graph: &DiGraph<String, ()>,
            node: NodeIndex,
            visited: &mut HashSet<NodeIndex>,
            stack: &mut Vec<NodeIndex>,
            on_stack: &mut HashSet<NodeIndex>,
        ) -> Option<Vec<NodeIndex>> {
            visited.insert(node);
            stack.push(node);
            on_stack.insert(node);

            for next in graph.neighbors_directed(node, Direction::Outgoing) {
                if on_stack.contains(&next) {
                    let start = stack.iter().position(|n| *n == next).unwrap_or(0);
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                if !visited.contains(&next) {
                    if let Some(cycle) = visit(graph, next, visited, stack, on_stack) {
                        return Some(cycle);
                    }
                }
            }

            stack.pop();
            on_stack.remove(&node);
            None
        }

        for node in graph.node_indices() {
            if !visited.contains(&node) {
                if let Some(cycle) = visit(graph, node, &mut visited, &mut stack, &mut on_stack) {
                    return cycle
                        .iter()
                        .map(|idx| graph[*idx].as_str())
                        .collect::<Vec<_>>()
                        .join(" -> ");
                }
            }
        }

        "unknown cycle".to_string()
    }

    fn compute_dependency_levels(
        graph: &DiGraph<String, ()>,
        order: &[String],
    ) -> Vec<Vec<String>> {
        let index_of: HashMap<&str, NodeIndex> = graph
            .node_indices()
            .map(|idx| (graph[idx].as_str(), idx))
            .collect();

        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut level_map: HashMap<&str, usize> = HashMap::new();

        for package_name in order {
            let node = index_of[package_name.as_str()];
            let level = graph
                .neighbors_directed(node, Direction::Outgoing)
                .filter_map(|dep| level_map.get(graph[dep].as_str()))
                .max()
                .map(|l| l + 1)
                .unwrap_or(0);

            level_map.insert(package_name, level);
            while levels.len() <= level {
                levels.push(Vec::new());
            }
            levels[level].push(package_name.clone());
        }

        levels
    }

    fn node(&self, package_name: &str) -> Result<NodeIndex> {
        self.node_map
            .get(package_name)
            .copied()
            .ok_or_else(|| Error::PackageNotFound {
                name: package_name.to_string(),
                available: self.available_names(),
            })
    }

    fn available_names(&self) -> String {
        let mut names: Vec<&str> = self.node_map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(", ")
    }

    /// Retrieves a package by name.
    #[inline]
    pub fn get_package(&self, name: &str) -> Option<&Package> {
        self.node_map
            .get(name)
            .and_then(|idx| self.packages.get(idx))
    }

    /// Returns package names in topological order (dependencies before
    /// dependents). Cached during graph construction.
    #[inline]
    pub fn topological_order(&self) -> &[String] {
        &self.cached_topological_order
    }

    /// Returns dependency levels: each level contains packages whose
    /// dependencies all live in earlier levels.
    #[inline]
    pub fn dependency_levels(&self) -> &[Vec<String>] {
        &self.dependency_levels
    }

    /// Returns direct dependencies of a package.
    pub fn dependencies(&self, package_name: &str) -> Result<Vec<String>> {
        let node = self.node(package_name)?;
        let mut deps: Vec<String> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|idx| self.graph[idx].clone())
            .collect();
        deps.sort();
        Ok(deps)
    }

    /// Returns direct dependents of a package (packages that depend on it).
    pub fn dependents(&self, package_name: &str) -> Result<Vec<String>> {
        let node = self.node(package_name)?;
        let mut dependents: Vec<String> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|idx| self.graph[idx].clone())
            .collect();
        dependents.sort();
        Ok(dependents)
    }

    /// Returns all transitive dependents of a package, excluding the package
    /// itself. Breadth-first over reverse edges; terminates because the
    /// graph is finite and acyclic.
    pub fn all_dependents(&self, package_name: &str) -> Result<HashSet<String>> {
        let mut result = HashSet::new();
        let mut queue = std::collections::VecDeque::from([package_name.to_string()]);

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents(&current)? {
                if result.insert(dependent.clone()) {
                    queue.push_back(dependent);
                }
            }
        }

        result.remove(package_name);
        Ok(result)
    }

    /// Returns all packages in the graph, sorted by name.
    pub fn all_packages(&self) -> Vec<&Package> {
        let mut packages: Vec<&Package> = self.packages.values().collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }
}
