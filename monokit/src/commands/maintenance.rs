//! `clean` and `init`: workspace maintenance.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use monokit_core::clean::{matching_paths, remove_paths};
use monokit_core::config::MANIFEST_FILE;
use monokit_core::filter::filter_by_scope;
use owo_colors::OwoColorize;

use crate::commands::load_workspace;
use crate::output;

pub fn cmd_clean(
    root: Option<PathBuf>,
    scope: Option<&str>,
    dry_run: bool,
    yes: bool,
) -> Result<i32> {
    let workspace = load_workspace(root)?;
    let packages = filter_by_scope(workspace.graph.all_packages(), scope)?;

    output::header("Clean");

    let patterns = &workspace.config.clean.patterns;
    if patterns.is_empty() {
        println!(
            "  {} No clean patterns configured under [workspace.clean]",
            "WARNING:".yellow()
        );
        println!();
        return Ok(0);
    }

    let paths = matching_paths(&workspace.root, &packages, patterns)?;
    if paths.is_empty() {
        println!("  {} Nothing to clean", "OK".green());
        println!();
        return Ok(0);
    }

    for path in &paths {
        let shown = path.strip_prefix(&workspace.root).unwrap_or(path);
        println!("  - {}", shown.display().to_string().yellow());
    }
    println!();

    if dry_run {
        println!(
            "  {}",
            format!("Dry run, {} paths would be removed", paths.len()).bright_black()
        );
        println!();
        return Ok(0);
    }

    if !yes && !output::confirm(&format!("Remove {} paths?", paths.len()))? {
        println!("  {}", "Aborted".yellow());
        return Ok(0);
    }

    let removed = remove_paths(&paths)?;
    println!(
        "  {} Removed {} paths",
        "OK".green(),
        removed.to_string().bold().green()
    );
    println!();
    Ok(0)
}

const STARTER_WORKSPACE: &str = r#"[workspace]
packages = ["packages/*"]
concurrency = 4
fail_fast = false
topological = true

[workspace.scripts]
build = "echo build"
test = "echo test"

[workspace.clean]
patterns = ["target", "dist", "*.log"]

[workspace.versioning]
tag_format = "{name}@{version}"
commit_message = "chore(release): publish {packages}"
"#;

pub fn cmd_init(root: Option<PathBuf>) -> Result<i32> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };

    let path = root.join(MANIFEST_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    std::fs::create_dir_all(root.join("packages"))?;
    std::fs::write(&path, STARTER_WORKSPACE)?;

    output::header("Initialized");
    println!(
        "  {} Wrote {}",
        "OK".green(),
        path.display().to_string().bold().white()
    );
    println!(
        "  {}",
        "Add packages under packages/, each with its own monokit.toml".bright_black()
    );
    println!();
    Ok(0)
}
