//! `version` and `release`: conventional-commit version planning and
//! publishing.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use anyhow::{bail, Result};
use monokit_core::conventional::{Bump, CommitRecord};
use monokit_core::filter::filter_by_scope;
use monokit_core::git::{GitCli, Vcs};
use monokit_core::manifest::TomlManifestStore;
use monokit_core::release::ReleaseOrchestrator;
use monokit_core::scheduler::{ExecutionOptions, Scheduler, TaskSpec};
use monokit_core::version::{VersionPlan, VersionPlanner};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::commands::{load_workspace, Workspace};
use crate::output;

pub struct VersionArgs {
    pub scope: Option<String>,
    pub bump: Option<String>,
    pub prerelease: Option<String>,
    pub dry_run: bool,
    pub yes: bool,
    pub no_commit: bool,
    pub no_tag: bool,
    pub no_changelog: bool,
    pub json: bool,
}

/// Gathers conventional commits per package since each package's latest
/// release tag, restricted to paths under the package directory.
fn collect_commits(
    workspace: &Workspace,
    vcs: &dyn Vcs,
) -> Result<HashMap<String, Vec<CommitRecord>>> {
    let mut commits_by_package = HashMap::new();

    for package in workspace.graph.all_packages() {
        let tag_pattern = workspace
            .config
            .versioning
            .tag_format
            .replace("{name}", &package.name)
            .replace("{version}", "*");
        let since = vcs.latest_tag(&tag_pattern)?;
        debug!(
            package = %package.name,
            since = since.as_deref().unwrap_or("<beginning>"),
            "collecting commits"
        );

        let raw = vcs.commits_since(since.as_deref(), Some(&package.path))?;
        let parsed: Vec<CommitRecord> = raw
            .iter()
            .filter_map(|c| CommitRecord::parse(&c.message, &c.sha))
            .collect();
        commits_by_package.insert(package.name.clone(), parsed);
    }

    Ok(commits_by_package)
}

fn scope_set(workspace: &Workspace, scope: Option<&str>) -> Result<Option<BTreeSet<String>>> {
    let Some(scope) = scope else {
        return Ok(None);
    };
    let names: BTreeSet<String> = filter_by_scope(workspace.graph.all_packages(), Some(scope))?
        .into_iter()
        .map(|p| p.name.clone())
        .collect();
    Ok(Some(names))
}

fn print_plan(plan: &VersionPlan) {
    output::header("Version Plan");
    for release in plan.releases.values() {
        println!(
            "  {} {} {} {} {}",
            release.name.bold().white(),
            release.old_version.bright_black(),
            "->".bright_black(),
            release.new_version.bold().green(),
            format!("({})", release.bump.as_str()).bright_black()
        );
    }
    println!();
}

pub fn cmd_version(root: Option<PathBuf>, args: VersionArgs) -> Result<i32> {
    let workspace = load_workspace(root)?;
    let vcs = GitCli::new(&workspace.root);

    let forced = match args.bump.as_deref() {
        Some(raw) => match Bump::from_str(raw) {
            Some(bump) => Some(bump),
            None => bail!("invalid bump '{}' (expected patch, minor or major)", raw),
        },
        None => None,
    };

    let scope = scope_set(&workspace, args.scope.as_deref())?;
    let commits = collect_commits(&workspace, &vcs)?;
    let plan = VersionPlanner::plan(
        &workspace.graph,
        &commits,
        forced,
        args.prerelease.as_deref(),
        scope.as_ref(),
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        if args.dry_run {
            return Ok(0);
        }
    } else {
        if plan.is_empty() {
            output::header("Version Plan");
            println!("  {} No version changes required", "OK".green());
            println!();
            return Ok(0);
        }
        print_plan(&plan);
    }

    if plan.is_empty() {
        return Ok(0);
    }

    if args.dry_run {
        println!("  {}", "Dry run, nothing written".bright_black());
        println!();
        return Ok(0);
    }

    if !args.yes && !output::confirm("Apply this version plan?")? {
        println!("  {}", "Aborted".yellow());
        return Ok(0);
    }

    let store = TomlManifestStore;
    let orchestrator = ReleaseOrchestrator::new(
        &workspace.root,
        &store,
        &vcs,
        workspace.config.versioning.clone(),
    )
    .write_changelogs(!args.no_changelog);

    let outcome = orchestrator.apply(&workspace.graph, &plan, !args.no_commit, !args.no_tag)?;

    for applied in &outcome.applied {
        if applied.success {
            println!(
                "  {} {} {}",
                "OK".green(),
                applied.name.bold().white(),
                applied.new_version.green()
            );
        } else {
            println!(
                "  {} {} {}",
                "FAILED".red(),
                applied.name.bold().red(),
                applied.error.as_deref().unwrap_or("unknown error").red()
            );
        }
    }
    if let Some(sha) = &outcome.commit_sha {
        println!();
        println!(
            "  {} Release commit {}",
            "OK".green(),
            sha.chars().take(7).collect::<String>().bright_black()
        );
        for tag in &outcome.tags {
            println!("  {} Tagged {}", "OK".green(), tag.bold().white());
        }
    }
    println!();

    Ok(if outcome.all_applied() { 0 } else { 1 })
}

pub fn cmd_release(
    root: Option<PathBuf>,
    scope: Option<String>,
    prerelease: Option<String>,
    dry_run: bool,
    yes: bool,
    concurrency: Option<usize>,
) -> Result<i32> {
    let workspace = load_workspace(root)?;
    let vcs = GitCli::new(&workspace.root);

    let scope = scope_set(&workspace, scope.as_deref())?;
    let commits = collect_commits(&workspace, &vcs)?;
    let plan = VersionPlanner::plan(
        &workspace.graph,
        &commits,
        None,
        prerelease.as_deref(),
        scope.as_ref(),
    )?;

    if plan.is_empty() {
        output::header("Release");
        println!("  {} Nothing to release", "OK".green());
        println!();
        return Ok(0);
    }

    print_plan(&plan);

    if dry_run {
        println!("  {}", "Dry run, nothing written".bright_black());
        println!();
        return Ok(0);
    }

    if !yes && !output::confirm("Version and publish these packages?")? {
        println!("  {}", "Aborted".yellow());
        return Ok(0);
    }

    let store = TomlManifestStore;
    let outcome = ReleaseOrchestrator::new(
        &workspace.root,
        &store,
        &vcs,
        workspace.config.versioning.clone(),
    )
    .apply(&workspace.graph, &plan, true, true)?;

    if !outcome.all_applied() {
        for applied in outcome.applied.iter().filter(|a| !a.success) {
            println!(
                "  {} {} {}",
                "FAILED".red(),
                applied.name.bold().red(),
                applied.error.as_deref().unwrap_or("unknown error").red()
            );
        }
        println!();
        return Ok(1);
    }

    // Publish step: run each released package's publish script in
    // topological order, stopping admission on the first failure.
    let mut tasks = Vec::new();
    for name in plan.releases.keys() {
        let Some(package) = workspace.graph.get_package(name) else {
            continue;
        };
        if let Some(script) = package.get_script("publish") {
            tasks.push(TaskSpec {
                package: name.clone(),
                command: script.command.clone(),
                env: script.env.clone(),
            });
        }
    }

    if tasks.is_empty() {
        println!(
            "  {} Versioned {} packages; none define a publish script",
            "OK".green(),
            plan.len().to_string().bold().cyan()
        );
        println!();
        return Ok(0);
    }

    output::header("Publishing");
    let options = ExecutionOptions {
        concurrency: concurrency.unwrap_or(workspace.config.concurrency),
        fail_fast: true,
        topological: true,
        global_env: workspace.config.env.clone(),
        override_env: HashMap::new(),
    };
    let report = Scheduler::new(&workspace.root, options).run(&workspace.graph, &tasks)?;

    output::print_report(&report);
    output::print_summary(&report);

    Ok(if report.is_failure() { 1 } else { 0 })
}
