//! `list` and `changed`: workspace inspection.

use std::path::PathBuf;

use anyhow::Result;
use monokit_core::change::ChangeDetector;
use monokit_core::filter::filter_by_scope;
use monokit_core::git::{GitCli, Vcs};
use owo_colors::OwoColorize;

use crate::commands::load_workspace;
use crate::output;

pub fn cmd_list(root: Option<PathBuf>, json: bool) -> Result<i32> {
    let workspace = load_workspace(root)?;
    let packages = workspace.graph.all_packages();

    if json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(0);
    }

    output::header("Workspace Packages");
    if packages.is_empty() {
        println!("  {} No packages found", "WARNING:".yellow());
    } else {
        for package in &packages {
            println!(
                "  {} {} {}",
                package.name.bold().white(),
                package.version.green(),
                format!("({})", package.path.display()).bright_black()
            );
        }
        println!();
        println!(
            "  {} {} packages",
            "OK".green(),
            packages.len().to_string().bold().cyan()
        );
    }
    println!();
    Ok(0)
}

pub fn cmd_changed(
    root: Option<PathBuf>,
    since: &str,
    no_dependents: bool,
    scope: Option<&str>,
    json: bool,
) -> Result<i32> {
    let workspace = load_workspace(root)?;

    let vcs = GitCli::new(&workspace.root);
    let changed_files = vcs.changed_files(since)?;
    let change_set = ChangeDetector::detect(&workspace.graph, &changed_files, !no_dependents)?;

    // Scope narrows the report after detection, so a dependent outside the
    // scope never reappears through the closure.
    let in_scope: std::collections::BTreeSet<String> =
        filter_by_scope(workspace.graph.all_packages(), scope)?
            .into_iter()
            .map(|p| p.name.clone())
            .collect();
    let direct: Vec<&String> = change_set
        .directly_changed
        .iter()
        .filter(|n| in_scope.contains(*n))
        .collect();
    let dependents: Vec<&String> = change_set
        .dependents
        .iter()
        .filter(|n| in_scope.contains(*n))
        .collect();

    if json {
        let payload = serde_json::json!({
            "since": since,
            "directly_changed": direct,
            "dependents": dependents,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(0);
    }

    output::header(&format!("Changed since {}", since));
    if direct.is_empty() && dependents.is_empty() {
        println!("  {} No packages changed", "OK".green());
    } else {
        for name in &direct {
            println!("  {} {}", "changed".yellow(), name.bold().white());
        }
        for name in &dependents {
            println!(
                "  {} {}",
                "dependent".bright_black(),
                name.bold().white()
            );
        }
        println!();
        println!(
            "  {} {} changed, {} dependents",
            "WARNING:".yellow(),
            direct.len().to_string().bold().yellow(),
            dependents.len().to_string().bold().yellow()
        );
    }
    println!();
    Ok(0)
}
