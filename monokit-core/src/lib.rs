//! Core library for monorepo orchestration.

pub mod change;
pub mod clean;
pub mod config;
pub mod conventional;
pub mod error;
pub mod filter;
pub mod git;
pub mod graph;
pub mod manifest;
pub mod package;
pub mod release;
pub mod scanner;
pub mod scheduler;
pub mod version;

pub use change::{ChangeDetector, ChangeSet};
pub use config::{PackageManifest, WorkspaceConfig, MANIFEST_FILE};
pub use conventional::{determine_bump, Bump, CommitRecord};
pub use error::{Error, Result};
pub use git::{GitCli, RawCommit, Vcs};
pub use graph::DependencyGraph;
pub use manifest::{ManifestStore, TomlManifestStore};
pub use package::{Package, Script};
pub use release::{ReleaseOrchestrator, ReleaseOutcome};
pub use scanner::Scanner;
pub use scheduler::{
    ExecutionOptions, ProcessOutput, ProcessRunner, RunReport, Scheduler, ShellRunner, TaskResult,
    TaskSpec, TaskStatus,
};
pub use version::{PlannedRelease, VersionPlan, VersionPlanner};
