//! Command implementations for the CLI.

mod discovery;
mod execution;
mod maintenance;
mod releasing;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use monokit_core::change::ChangeDetector;
use monokit_core::config::{find_workspace_root, WorkspaceConfig};
use monokit_core::filter::filter_by_scope;
use monokit_core::git::{GitCli, Vcs};
use monokit_core::graph::DependencyGraph;
use monokit_core::scanner::Scanner;

pub use discovery::{cmd_changed, cmd_list};
pub use execution::{cmd_exec, cmd_run};
pub use maintenance::{cmd_clean, cmd_init};
pub use releasing::{cmd_release, cmd_version, VersionArgs};

/// Loaded workspace state shared by every command.
pub struct Workspace {
    pub root: PathBuf,
    pub config: WorkspaceConfig,
    pub graph: DependencyGraph,
}

/// Loads configuration, scans packages and builds the graph. Configuration
/// and graph errors abort here, before any command logic runs.
pub fn load_workspace(root_flag: Option<PathBuf>) -> Result<Workspace> {
    let root = match root_flag {
        Some(root) => root,
        None => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            find_workspace_root(&cwd)
                .context("no monokit.toml workspace found; run `monokit init` first")?
        }
    };

    let config = WorkspaceConfig::load(&root)?;
    let scanner = Scanner::from_config(&root, &config)?;
    let packages = scanner.scan(Some(&config))?;
    let graph = DependencyGraph::new(packages)?;

    Ok(Workspace {
        root,
        config,
        graph,
    })
}

/// Resolves the selected package names from `--scope` and `--since` filters,
/// sorted by name.
pub fn select_packages(
    workspace: &Workspace,
    scope: Option<&str>,
    since: Option<&str>,
    include_dependents: bool,
) -> Result<Vec<String>> {
    let packages = filter_by_scope(workspace.graph.all_packages(), scope)?;
    let mut names: Vec<String> = packages.into_iter().map(|p| p.name.clone()).collect();

    if let Some(since) = since {
        let vcs = GitCli::new(&workspace.root);
        let changed_files = vcs.changed_files(since)?;
        let change_set =
            ChangeDetector::detect(&workspace.graph, &changed_files, include_dependents)?;
        let changed = change_set.all();
        names.retain(|name| changed.contains(name));
    }

    Ok(names)
}

/// A filter that matches nothing is reported, per command policy, rather
/// than silently producing an empty run.
pub fn ensure_selection(names: &[String], what: &str) -> Result<()> {
    if names.is_empty() {
        bail!("no packages matched {}", what);
    }
    Ok(())
}
