//! Version planning from conventional commit history.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use semver::{Prerelease, Version};
use serde::Serialize;
use tracing::info;

use crate::conventional::{determine_bump, Bump, CommitRecord};
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;

/// A planned version change for one package.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedRelease {
    pub name: String,
    pub old_version: String,
    pub new_version: String,
    pub bump: Bump,
    /// Rendered changelog entry for this release.
    pub changelog: String,
}

/// Mapping from package name to its planned release, in topological order
/// (dependencies before dependents). Packages with a final bump of `None`
/// are omitted.
#[derive(Debug, Default, Clone, Serialize)]
pub struct VersionPlan {
    pub releases: IndexMap<String, PlannedRelease>,
}

impl VersionPlan {
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn get(&self, name: &str) -> Option<&PlannedRelease> {
        self.releases.get(name)
    }
}

/// Computes version bumps and changelog entries across the workspace.
pub struct VersionPlanner;

impl VersionPlanner {
    /// Plans version bumps for every package in `scope` (default: all).
    ///
    /// A package's own bump is the strongest of its commit-derived bumps; a
    /// forced bump acts as a floor, never a ceiling. After own bumps are
    /// computed, any bumped dependency forces at least a `Patch` on each of
    /// its dependents, applied in a single topological pass (the graph is
    /// acyclic, so one pass reaches the fixed point).
    pub fn plan(
        graph: &DependencyGraph,
        commits_by_package: &HashMap<String, Vec<CommitRecord>>,
        forced: Option<Bump>,
        prerelease: Option<&str>,
        scope: Option<&BTreeSet<String>>,
    ) -> Result<VersionPlan> {
        let in_scope = |name: &str| scope.map(|s| s.contains(name)).unwrap_or(true);

        let mut own_bumps: HashMap<&str, Bump> = HashMap::new();
        for name in graph.topological_order() {
            if !in_scope(name) {
                continue;
            }
            let commits = commits_by_package
                .get(name)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let derived = determine_bump(commits);
            let effective = match forced {
                Some(floor) if derived > floor => {
                    // Commit history wins over a weaker forced bump; record
                    // the decision so operators can see why.
                    info!(
                        package = %name,
                        derived = derived.as_str(),
                        forced = floor.as_str(),
                        "commit-derived bump exceeds forced bump, keeping derived"
                    );
                    derived
                }
                Some(floor) => floor,
                None => derived,
            };
            own_bumps.insert(name.as_str(), effective);
        }

        // Cascade pass: dependents are finalized after their dependencies,
        // which topological order guarantees.
        let mut final_bumps: IndexMap<&str, Bump> = IndexMap::new();
        for name in graph.topological_order() {
            if !in_scope(name) {
                continue;
            }
            let mut bump = own_bumps[name.as_str()];
            let deps = graph.dependencies(name)?;
            let dependency_bumped = deps.iter().any(|dep| {
                final_bumps
                    .get(dep.as_str())
                    .map(|b| *b > Bump::None)
                    .unwrap_or(false)
            });
            if dependency_bumped && bump < Bump::Patch {
                // Dependents re-pin the new dependency version even without
                // functional changes of their own.
                bump = Bump::Patch;
            }
            final_bumps.insert(name.as_str(), bump);
        }

        let mut plan = VersionPlan::default();
        for (name, bump) in final_bumps {
            if bump == Bump::None {
                continue;
            }
            let package = graph
                .get_package(name)
                .expect("planned package exists in graph");
            let old_version = Version::parse(&package.version).map_err(|e| {
                Error::Release(format!(
                    "package '{}' has invalid version '{}': {}",
                    name, package.version, e
                ))
            })?;
            let new_version = next_version(&old_version, bump, prerelease)?;

            let commits = commits_by_package
                .get(name)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let changelog = render_changelog(&new_version.to_string(), commits);

            plan.releases.insert(
                name.to_string(),
                PlannedRelease {
                    name: name.to_string(),
                    old_version: old_version.to_string(),
                    new_version: new_version.to_string(),
                    bump,
                    changelog,
                },
            );
        }

        Ok(plan)
    }
}

/// Applies standard semver increment rules. With a prerelease tag, the
/// trailing number is incremented when the current version already carries
/// that tag; otherwise the numeric core is bumped and `<tag>.0` appended.
pub fn next_version(current: &Version, bump: Bump, prerelease: Option<&str>) -> Result<Version> {
    if let Some(tag) = prerelease {
        if let Some(next) = increment_prerelease(current, tag) {
            return Ok(next);
        }
    }

    let mut next = match bump {
        Bump::Major => Version::new(current.major + 1, 0, 0),
        Bump::Minor => Version::new(current.major, current.minor + 1, 0),
        Bump::Patch => Version::new(current.major, current.minor, current.patch + 1),
        Bump::None => Version::new(current.major, current.minor, current.patch),
    };

    if let Some(tag) = prerelease {
        next.pre = Prerelease::new(&format!("{}.0", tag))
            .map_err(|e| Error::Release(format!("invalid prerelease tag '{}': {}", tag, e)))?;
    }

    Ok(next)
}

fn increment_prerelease(current: &Version, tag: &str) -> Option<Version> {
    let pre = current.pre.as_str();
    let rest = pre.strip_prefix(tag)?.strip_prefix('.')?;
    let counter: u64 = rest.parse().ok()?;

    let mut next = current.clone();
    next.pre = Prerelease::new(&format!("{}.{}", tag, counter + 1)).ok()?;
    Some(next)
}

/// Section order for changelog rendering; unlisted types land under "Other".
const SECTION_ORDER: &[&str] = &[
    "feat", "fix", "perf", "revert", "refactor", "docs", "style", "test", "chore", "ci", "build",
];

/// Renders one changelog entry: commits grouped by type into labeled
/// sections, commit order preserved within each section.
pub fn render_changelog(version: &str, commits: &[CommitRecord]) -> String {
    let mut out = format!("## {}\n", version);

    if commits.is_empty() {
        out.push_str("\n- Version bump only\n");
        return out;
    }

    let mut grouped: IndexMap<&str, Vec<&CommitRecord>> = IndexMap::new();
    for key in SECTION_ORDER {
        grouped.insert(key, Vec::new());
    }
    for commit in commits {
        grouped
            .entry(commit.commit_type.as_str())
            .or_default()
            .push(commit);
    }

    for (_, section_commits) in grouped {
        let Some(first) = section_commits.first() else {
            continue;
        };
        out.push_str(&format!("\n### {}\n\n", first.section_label()));
        for commit in section_commits {
            let short_sha: String = commit.sha.chars().take(7).collect();
            let scope = commit
                .scope
                .as_deref()
                .map(|s| format!("**{}**: ", s))
                .unwrap_or_default();
            let breaking = if commit.breaking { " [breaking]" } else { "" };
            if short_sha.is_empty() {
                out.push_str(&format!("- {}{}{}\n", scope, commit.subject, breaking));
            } else {
                out.push_str(&format!(
                    "- {}{}{} ({})\n",
                    scope, commit.subject, breaking, short_sha
                ));
            }
        }
    }

    out
}
