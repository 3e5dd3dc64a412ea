use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use monokit_core::config::VersioningConfig;
use monokit_core::conventional::CommitRecord;
use monokit_core::git::{RawCommit, Vcs};
use monokit_core::graph::DependencyGraph;
use monokit_core::manifest::{ManifestStore, TomlManifestStore};
use monokit_core::package::Package;
use monokit_core::release::ReleaseOrchestrator;
use monokit_core::version::VersionPlanner;
use monokit_core::Result;

#[derive(Default)]
struct MockVcs {
    commits: Mutex<Vec<String>>,
    tags: Mutex<Vec<String>>,
}

impl Vcs for MockVcs {
    fn changed_files(&self, _since: &str) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    fn commits_since(
        &self,
        _since: Option<&str>,
        _path: Option<&Path>,
    ) -> Result<Vec<RawCommit>> {
        Ok(Vec::new())
    }

    fn create_commit(&self, message: &str, _paths: &[PathBuf]) -> Result<String> {
        self.commits.lock().unwrap().push(message.to_string());
        Ok("deadbeef".to_string())
    }

    fn create_tag(&self, name: &str, _message: &str) -> Result<()> {
        self.tags.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn latest_tag(&self, _pattern: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

fn setup_workspace(root: &Path) -> DependencyGraph {
    for (name, version, deps) in [("a", "1.0.0", ""), ("b", "0.2.0", "\"a\"")] {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("monokit.toml"),
            format!(
                "name = \"{}\"\nversion = \"{}\"\ndependencies = [{}]\n",
                name, version, deps
            ),
        )
        .unwrap();
    }

    DependencyGraph::new(vec![
        Package::new("a".to_string(), "1.0.0".to_string(), "a".into(), vec![], vec![]),
        Package::new(
            "b".to_string(),
            "0.2.0".to_string(),
            "b".into(),
            vec!["a".to_string()],
            vec![],
        ),
    ])
    .unwrap()
}

fn feat_history() -> HashMap<String, Vec<CommitRecord>> {
    let mut history = HashMap::new();
    history.insert(
        "a".to_string(),
        vec![CommitRecord::parse("feat: new capability", "abc1234").unwrap()],
    );
    history
}

#[test]
fn applying_a_plan_writes_versions_and_changelogs() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let graph = setup_workspace(root);

    let plan = VersionPlanner::plan(&graph, &feat_history(), None, None, None).unwrap();
    assert_eq!(plan.len(), 2);

    let store = TomlManifestStore;
    let vcs = MockVcs::default();
    let orchestrator =
        ReleaseOrchestrator::new(root, &store, &vcs, VersioningConfig::default());

    let outcome = orchestrator.apply(&graph, &plan, true, true).unwrap();
    assert!(outcome.all_applied());
    assert_eq!(outcome.commit_sha.as_deref(), Some("deadbeef"));

    // Re-reading each manifest returns exactly the planned version.
    assert_eq!(
        store.read_version(&root.join("a/monokit.toml")).unwrap(),
        "1.1.0"
    );
    assert_eq!(
        store.read_version(&root.join("b/monokit.toml")).unwrap(),
        "0.2.1"
    );

    let changelog = fs::read_to_string(root.join("a/CHANGELOG.md")).unwrap();
    assert!(changelog.starts_with("## 1.1.0"));
    assert!(changelog.contains("new capability"));

    assert_eq!(
        *vcs.tags.lock().unwrap(),
        vec!["a@1.1.0".to_string(), "b@0.2.1".to_string()]
    );
    let commits = vcs.commits.lock().unwrap();
    assert_eq!(commits.len(), 1);
    assert!(commits[0].contains("a@1.1.0, b@0.2.1"));
}

#[test]
fn dry_run_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let graph = setup_workspace(root);

    let plan = VersionPlanner::plan(&graph, &feat_history(), None, None, None).unwrap();

    let store = TomlManifestStore;
    let vcs = MockVcs::default();
    let orchestrator = ReleaseOrchestrator::new(root, &store, &vcs, VersioningConfig::default())
        .dry_run(true);

    let outcome = orchestrator.apply(&graph, &plan, true, true).unwrap();
    assert!(outcome.all_applied());
    assert!(outcome.commit_sha.is_none());
    assert!(outcome.tags.is_empty());

    assert_eq!(
        store.read_version(&root.join("a/monokit.toml")).unwrap(),
        "1.0.0"
    );
    assert!(!root.join("a/CHANGELOG.md").exists());
}

#[test]
fn changelog_entries_prepend() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let graph = setup_workspace(root);
    fs::write(root.join("a/CHANGELOG.md"), "## 1.0.0\n\n- old entry\n").unwrap();

    let plan = VersionPlanner::plan(&graph, &feat_history(), None, None, None).unwrap();

    let store = TomlManifestStore;
    let vcs = MockVcs::default();
    ReleaseOrchestrator::new(root, &store, &vcs, VersioningConfig::default())
        .apply(&graph, &plan, false, false)
        .unwrap();

    let changelog = fs::read_to_string(root.join("a/CHANGELOG.md")).unwrap();
    let new_at = changelog.find("## 1.1.0").unwrap();
    let old_at = changelog.find("## 1.0.0").unwrap();
    assert!(new_at < old_at);
}

#[test]
fn package_writes_are_independent() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let graph = setup_workspace(root);
    // Break b's manifest so only its write fails.
    fs::remove_file(root.join("b/monokit.toml")).unwrap();

    let plan = VersionPlanner::plan(&graph, &feat_history(), None, None, None).unwrap();

    let store = TomlManifestStore;
    let vcs = MockVcs::default();
    let outcome = ReleaseOrchestrator::new(root, &store, &vcs, VersioningConfig::default())
        .apply(&graph, &plan, true, true)
        .unwrap();

    assert!(!outcome.all_applied());
    let a = outcome.applied.iter().find(|r| r.name == "a").unwrap();
    let b = outcome.applied.iter().find(|r| r.name == "b").unwrap();
    assert!(a.success);
    assert!(!b.success);

    // a's write landed even though b failed; no commit or tags were made.
    assert_eq!(
        store.read_version(&root.join("a/monokit.toml")).unwrap(),
        "1.1.0"
    );
    assert!(vcs.commits.lock().unwrap().is_empty());
    assert!(vcs.tags.lock().unwrap().is_empty());
}
