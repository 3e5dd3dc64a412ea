//! Terminal output helpers shared by the commands.

use std::io::{BufRead, Write};

use anyhow::Result;
use monokit_core::scheduler::{RunReport, TaskStatus};
use owo_colors::OwoColorize;

pub fn header(title: &str) {
    println!("{}", format!("[{}]", title).bold().cyan());
    println!();
}

/// Prints one line per task result, with captured output for failures.
/// Cancelled and skipped tasks are listed too, so the report accounts for
/// every selected package.
pub fn print_report(report: &RunReport) {
    for result in report.results() {
        match result.status {
            TaskStatus::Success => {
                println!(
                    "  {} {} {}",
                    "OK".green(),
                    result.package.bold().white(),
                    format!("({:.2}s)", result.duration.as_secs_f64()).bright_black()
                );
            }
            TaskStatus::Failed => {
                println!(
                    "  {} {} {}",
                    "FAILED".red(),
                    result.package.bold().red(),
                    result
                        .exit_code
                        .map(|c| format!("(exit {})", c))
                        .unwrap_or_default()
                        .bright_black()
                );
                if !result.stdout.trim().is_empty() {
                    for line in result.stdout.trim().lines() {
                        println!("     {}", line);
                    }
                }
                if !result.stderr.trim().is_empty() {
                    for line in result.stderr.trim().lines() {
                        println!("     {}", line.bright_red());
                    }
                }
            }
            TaskStatus::Skipped => {
                println!(
                    "  {} {} {}",
                    "SKIPPED".yellow(),
                    result.package.bold().yellow(),
                    "(dependency failed)".bright_black()
                );
            }
            TaskStatus::Cancelled => {
                println!(
                    "  {} {}",
                    "CANCELLED".yellow(),
                    result.package.bold().yellow()
                );
            }
        }
    }
}

pub fn print_summary(report: &RunReport) {
    println!();
    let succeeded = report.count(TaskStatus::Success);
    let failed = report.count(TaskStatus::Failed);
    let skipped = report.count(TaskStatus::Skipped) + report.count(TaskStatus::Cancelled);

    if report.all_success() {
        println!(
            "  {} All {} tasks succeeded",
            "OK".green(),
            succeeded.to_string().bold().green()
        );
    } else {
        println!(
            "  {} {} succeeded, {} failed, {} not run",
            "WARNING:".yellow(),
            succeeded.to_string().bold().green(),
            failed.to_string().bold().red(),
            skipped.to_string().bold().yellow()
        );
    }
    println!();
}

/// Asks a yes/no question on stdout and reads one line from stdin. Anything
/// other than `y`/`yes` declines.
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt.bold());
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
