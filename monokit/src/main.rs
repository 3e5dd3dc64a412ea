mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "monokit")]
#[command(about = "Monorepo orchestration: task running, change detection, versioning")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root; discovered from the current directory when omitted.
    #[arg(long)]
    root: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, action)]
    quiet: bool,
}

#[derive(clap::Args)]
struct SelectionArgs {
    /// Comma-separated package names or glob patterns.
    #[arg(long)]
    scope: Option<String>,

    /// Only packages changed since this git reference.
    #[arg(long)]
    since: Option<String>,

    /// With --since, also select transitive dependents of changed packages.
    #[arg(long, action)]
    include_dependents: bool,
}

#[derive(clap::Args)]
struct ExecutionArgs {
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    #[arg(long, action)]
    fail_fast: bool,

    /// Ignore dependency order when scheduling.
    #[arg(long, action)]
    no_topological: bool,

    #[arg(long, action)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a configured script across packages.
    Run {
        script: String,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        execution: ExecutionArgs,
    },
    /// Run an arbitrary shell command across packages.
    Exec {
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        execution: ExecutionArgs,
    },
    /// List packages changed since a git reference.
    Changed {
        since: String,
        #[arg(long, action)]
        no_dependents: bool,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long, action)]
        json: bool,
    },
    /// List workspace packages.
    List {
        #[arg(long, action)]
        json: bool,
    },
    /// Plan and apply version bumps from conventional commits.
    Version {
        #[arg(long)]
        scope: Option<String>,
        /// Forced minimum bump: patch, minor or major.
        #[arg(long)]
        bump: Option<String>,
        #[arg(long)]
        prerelease: Option<String>,
        #[arg(long, action)]
        dry_run: bool,
        #[arg(short = 'y', long, action)]
        yes: bool,
        #[arg(long, action)]
        no_commit: bool,
        #[arg(long, action)]
        no_tag: bool,
        #[arg(long, action)]
        no_changelog: bool,
        #[arg(long, action)]
        json: bool,
    },
    /// Version, then run the publish script for released packages.
    Release {
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        prerelease: Option<String>,
        #[arg(long, action)]
        dry_run: bool,
        #[arg(short = 'y', long, action)]
        yes: bool,
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,
    },
    /// Remove configured clean patterns under each package.
    Clean {
        #[arg(long)]
        scope: Option<String>,
        #[arg(long, action)]
        dry_run: bool,
        #[arg(short = 'y', long, action)]
        yes: bool,
    },
    /// Write a starter workspace file.
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    let exit_code = match cli.command {
        Commands::Run {
            script,
            selection,
            execution,
        } => commands::cmd_run(cli.root, &script, &selection, &execution)?,
        Commands::Exec {
            command,
            selection,
            execution,
        } => commands::cmd_exec(cli.root, &command, &selection, &execution)?,
        Commands::Changed {
            since,
            no_dependents,
            scope,
            json,
        } => commands::cmd_changed(cli.root, &since, no_dependents, scope.as_deref(), json)?,
        Commands::List { json } => commands::cmd_list(cli.root, json)?,
        Commands::Version {
            scope,
            bump,
            prerelease,
            dry_run,
            yes,
            no_commit,
            no_tag,
            no_changelog,
            json,
        } => commands::cmd_version(
            cli.root,
            commands::VersionArgs {
                scope,
                bump,
                prerelease,
                dry_run,
                yes,
                no_commit,
                no_tag,
                no_changelog,
                json,
            },
        )?,
        Commands::Release {
            scope,
            prerelease,
            dry_run,
            yes,
            concurrency,
        } => commands::cmd_release(cli.root, scope, prerelease, dry_run, yes, concurrency)?,
        Commands::Clean { scope, dry_run, yes } => {
            commands::cmd_clean(cli.root, scope.as_deref(), dry_run, yes)?
        }
        Commands::Init => commands::cmd_init(cli.root)?,
    };

    std::process::exit(exit_code);
}
