//! Applying a version plan: manifest writes, changelogs, commit and tags.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::VersioningConfig;
use crate::error::Result;
use crate::git::Vcs;
use crate::graph::DependencyGraph;
use crate::manifest::ManifestStore;
use crate::version::VersionPlan;

/// Outcome of applying a plan to one package.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedRelease {
    pub name: String,
    pub new_version: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Outcome of applying a whole plan.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutcome {
    pub applied: Vec<AppliedRelease>,
    pub commit_sha: Option<String>,
    pub tags: Vec<String>,
}

impl ReleaseOutcome {
    pub fn all_applied(&self) -> bool {
        self.applied.iter().all(|a| a.success)
    }
}

/// Applies `VersionPlan`s through the manifest and VCS collaborators.
pub struct ReleaseOrchestrator<'a> {
    root: PathBuf,
    manifests: &'a dyn ManifestStore,
    vcs: &'a dyn Vcs,
    config: VersioningConfig,
    dry_run: bool,
    write_changelogs: bool,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        manifests: &'a dyn ManifestStore,
        vcs: &'a dyn Vcs,
        config: VersioningConfig,
    ) -> Self {
        Self {
            root: root.into(),
            manifests,
            vcs,
            config,
            dry_run: false,
            write_changelogs: true,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn write_changelogs(mut self, write: bool) -> Self {
        self.write_changelogs = write;
        self
    }

    /// Applies the plan: per package, write the new version and prepend the
    /// changelog entry; then a single release commit and one tag per package.
    ///
    /// Package writes are independent: a failed write marks that package
    /// failed in the outcome without rolling back the others. The commit and
    /// tag steps run only when every write succeeded and can be disabled by
    /// the caller passing `commit = false` / `tag = false`.
    pub fn apply(
        &self,
        graph: &DependencyGraph,
        plan: &VersionPlan,
        commit: bool,
        tag: bool,
    ) -> Result<ReleaseOutcome> {
        let mut outcome = ReleaseOutcome {
            applied: Vec::new(),
            commit_sha: None,
            tags: Vec::new(),
        };

        for release in plan.releases.values() {
            let Some(package) = graph.get_package(&release.name) else {
                outcome.applied.push(AppliedRelease {
                    name: release.name.clone(),
                    new_version: release.new_version.clone(),
                    success: false,
                    error: Some("package not present in graph".to_string()),
                });
                continue;
            };

            if self.dry_run {
                info!(
                    package = %release.name,
                    old = %release.old_version,
                    new = %release.new_version,
                    "dry run: would bump version"
                );
                outcome.applied.push(AppliedRelease {
                    name: release.name.clone(),
                    new_version: release.new_version.clone(),
                    success: true,
                    error: None,
                });
                continue;
            }

            let manifest_path = self.root.join(package.manifest_path());
            let result = self
                .manifests
                .write_version(&manifest_path, &release.new_version)
                .and_then(|()| {
                    if self.write_changelogs {
                        self.prepend_changelog(
                            &self.root.join(&package.path).join("CHANGELOG.md"),
                            &release.changelog,
                        )
                    } else {
                        Ok(())
                    }
                });

            match result {
                Ok(()) => {
                    info!(
                        package = %release.name,
                        old = %release.old_version,
                        new = %release.new_version,
                        "bumped version"
                    );
                    outcome.applied.push(AppliedRelease {
                        name: release.name.clone(),
                        new_version: release.new_version.clone(),
                        success: true,
                        error: None,
                    });
                }
                Err(e) => outcome.applied.push(AppliedRelease {
                    name: release.name.clone(),
                    new_version: release.new_version.clone(),
                    success: false,
                    error: Some(e.to_string()),
                }),
            }
        }

        if self.dry_run || !outcome.all_applied() {
            return Ok(outcome);
        }

        if commit {
            let summary = plan
                .releases
                .values()
                .map(|r| format!("{}@{}", r.name, r.new_version))
                .collect::<Vec<_>>()
                .join(", ");
            let message = self.config.commit_message.replace("{packages}", &summary);
            let sha = self.vcs.create_commit(&message, &[])?;
            outcome.commit_sha = Some(sha);

            if tag {
                for release in plan.releases.values() {
                    let tag_name = self
                        .config
                        .tag_format
                        .replace("{name}", &release.name)
                        .replace("{version}", &release.new_version);
                    self.vcs
                        .create_tag(&tag_name, &format!("Release {}", tag_name))?;
                    outcome.tags.push(tag_name);
                }
            }
        }

        Ok(outcome)
    }

    fn prepend_changelog(&self, path: &std::path::Path, entry: &str) -> Result<()> {
        let existing = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };

        let mut content = String::with_capacity(entry.len() + existing.len() + 2);
        content.push_str(entry);
        if !existing.is_empty() {
            content.push('\n');
            content.push_str(&existing);
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
