//! Change detection for determining affected packages.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Result;
use crate::graph::DependencyGraph;

/// Packages touched by a set of changed files.
///
/// `directly_changed` and `dependents` are disjoint; their union is the
/// effective changed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub directly_changed: BTreeSet<String>,
    pub dependents: BTreeSet<String>,
}

impl ChangeSet {
    /// Union of directly changed packages and their dependents.
    pub fn all(&self) -> BTreeSet<String> {
        self.directly_changed
            .union(&self.dependents)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.directly_changed.is_empty() && self.dependents.is_empty()
    }
}

/// Detects packages affected by file changes.
pub struct ChangeDetector;

impl ChangeDetector {
    /// Maps changed file paths (relative to the workspace root) onto packages
    /// and, when requested, collects their transitive dependents.
    ///
    /// A file belongs to the package whose path is the longest matching
    /// prefix; package paths are disjoint so ties cannot occur. Files owned
    /// by no package are ignored.
    pub fn detect(
        graph: &DependencyGraph,
        changed_files: &[impl AsRef<Path>],
        include_dependents: bool,
    ) -> Result<ChangeSet> {
        let mut directly_changed = BTreeSet::new();

        for file_path in changed_files {
            if let Some(name) = Self::owning_package(graph, file_path.as_ref()) {
                directly_changed.insert(name);
            }
        }

        let mut dependents = BTreeSet::new();
        if include_dependents {
            for name in &directly_changed {
                for dependent in graph.all_dependents(name)? {
                    if !directly_changed.contains(&dependent) {
                        dependents.insert(dependent);
                    }
                }
            }
        }

        Ok(ChangeSet {
            directly_changed,
            dependents,
        })
    }

    fn owning_package(graph: &DependencyGraph, file_path: &Path) -> Option<String> {
        graph
            .all_packages()
            .into_iter()
            .filter(|pkg| file_path.starts_with(&pkg.path))
            .max_by_key(|pkg| pkg.path.as_os_str().len())
            .map(|pkg| pkg.name.clone())
    }
}
