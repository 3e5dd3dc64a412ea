//! `run` and `exec`: task execution across the workspace.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use monokit_core::config::WorkspaceConfig;
use monokit_core::scheduler::{ExecutionOptions, RunReport, Scheduler, TaskSpec};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::commands::{ensure_selection, load_workspace, select_packages, Workspace};
use crate::output;
use crate::{ExecutionArgs, SelectionArgs};

fn build_options(config: &WorkspaceConfig, execution: &ExecutionArgs) -> ExecutionOptions {
    ExecutionOptions {
        concurrency: execution.concurrency.unwrap_or(config.concurrency),
        fail_fast: execution.fail_fast || config.fail_fast,
        topological: config.topological && !execution.no_topological,
        global_env: config.env.clone(),
        override_env: HashMap::new(),
    }
}

fn run_and_report(
    workspace: &Workspace,
    tasks: &[TaskSpec],
    execution: &ExecutionArgs,
) -> Result<i32> {
    let options = build_options(&workspace.config, execution);
    debug!(
        tasks = tasks.len(),
        concurrency = options.concurrency,
        fail_fast = options.fail_fast,
        topological = options.topological,
        "scheduling tasks"
    );

    let scheduler = Scheduler::new(&workspace.root, options);
    let report: RunReport = scheduler.run(&workspace.graph, tasks)?;

    if execution.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report);
        output::print_summary(&report);
    }

    Ok(if report.is_failure() { 1 } else { 0 })
}

pub fn cmd_run(
    root: Option<PathBuf>,
    script: &str,
    selection: &SelectionArgs,
    execution: &ExecutionArgs,
) -> Result<i32> {
    let workspace = load_workspace(root)?;
    let selected = select_packages(
        &workspace,
        selection.scope.as_deref(),
        selection.since.as_deref(),
        selection.include_dependents,
    )?;
    ensure_selection(&selected, "the selection filters")?;

    // Packages without the script drop out of the run; they still satisfy
    // ordering for their dependents because they have nothing to execute.
    let mut tasks = Vec::new();
    let mut without_script = 0usize;
    for name in &selected {
        let package = workspace
            .graph
            .get_package(name)
            .ok_or_else(|| anyhow::anyhow!("selected package '{}' not in graph", name))?;
        match package.get_script(script) {
            Some(s) => tasks.push(TaskSpec {
                package: name.clone(),
                command: s.command.clone(),
                env: s.env.clone(),
            }),
            None => without_script += 1,
        }
    }

    if tasks.is_empty() {
        let mut known = workspace.config.script_names();
        for package in workspace.graph.all_packages() {
            known.extend(package.scripts.iter().map(|s| s.name.clone()));
        }
        known.sort();
        known.dedup();
        bail!(
            "script '{}' not defined in any selected package (known scripts: {})",
            script,
            known.join(", ")
        );
    }

    if !execution.json {
        output::header(&format!("Running '{}'", script));
        if without_script > 0 {
            println!(
                "  {}",
                format!("{} selected packages have no '{}' script", without_script, script)
                    .bright_black()
            );
        }
    }

    run_and_report(&workspace, &tasks, execution)
}

pub fn cmd_exec(
    root: Option<PathBuf>,
    command: &[String],
    selection: &SelectionArgs,
    execution: &ExecutionArgs,
) -> Result<i32> {
    let workspace = load_workspace(root)?;
    let selected = select_packages(
        &workspace,
        selection.scope.as_deref(),
        selection.since.as_deref(),
        selection.include_dependents,
    )?;
    ensure_selection(&selected, "the selection filters")?;

    let command = command.join(" ");
    let tasks: Vec<TaskSpec> = selected
        .iter()
        .map(|name| TaskSpec {
            package: name.clone(),
            command: command.clone(),
            env: HashMap::new(),
        })
        .collect();

    if !execution.json {
        output::header(&format!("Executing '{}'", command));
    }

    run_and_report(&workspace, &tasks, execution)
}
