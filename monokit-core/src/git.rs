//! Version-control collaborator, backed by the `git` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// A raw log entry before conventional-commit parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    pub sha: String,
    pub message: String,
}

/// Narrow VCS interface consumed by the core. Mockable in tests.
pub trait Vcs: Send + Sync {
    /// Files changed since a reference, relative to the repository root.
    fn changed_files(&self, since: &str) -> Result<Vec<PathBuf>>;

    /// Commits reachable from HEAD, newest first, optionally bounded below
    /// by a reference and restricted to a path.
    fn commits_since(&self, since: Option<&str>, path: Option<&Path>) -> Result<Vec<RawCommit>>;

    /// Stages the given paths (all tracked changes when empty) and commits.
    /// Returns the new commit sha.
    fn create_commit(&self, message: &str, paths: &[PathBuf]) -> Result<String>;

    fn create_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Most recent tag matching a glob pattern, if any.
    fn latest_tag(&self, pattern: &str) -> Result<Option<String>>;
}

/// Production implementation shelling out to `git`.
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::Git(format!("failed to run git {}: {}", args.join(" "), e)))?;

        if !output.status.success() {
            return Err(Error::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Vcs for GitCli {
    fn changed_files(&self, since: &str) -> Result<Vec<PathBuf>> {
        let diff = self.run(&["diff", "--name-only", since])?;
        let untracked = self.run(&["ls-files", "--others", "--exclude-standard"])?;

        let mut files: Vec<PathBuf> = diff
            .lines()
            .chain(untracked.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn commits_since(&self, since: Option<&str>, path: Option<&Path>) -> Result<Vec<RawCommit>> {
        // Unit/record separators keep multi-line messages parseable.
        let mut args = vec!["log".to_string(), "--format=%H%x1f%B%x1e".to_string()];
        if let Some(since) = since {
            args.push(format!("{}..HEAD", since));
        }
        if let Some(path) = path {
            args.push("--".to_string());
            args.push(path.display().to_string());
        }

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run(&arg_refs)?;

        let commits = output
            .split('\u{1e}')
            .filter_map(|record| {
                let record = record.trim();
                let (sha, message) = record.split_once('\u{1f}')?;
                Some(RawCommit {
                    sha: sha.trim().to_string(),
                    message: message.trim().to_string(),
                })
            })
            .collect();

        Ok(commits)
    }

    fn create_commit(&self, message: &str, paths: &[PathBuf]) -> Result<String> {
        if paths.is_empty() {
            self.run(&["add", "-A"])?;
        } else {
            let mut args = vec!["add".to_string()];
            args.extend(paths.iter().map(|p| p.display().to_string()));
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            self.run(&arg_refs)?;
        }

        self.run(&["commit", "-m", message])?;
        let sha = self.run(&["rev-parse", "HEAD"])?;
        Ok(sha.trim().to_string())
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        self.run(&["tag", "-a", name, "-m", message])?;
        Ok(())
    }

    fn latest_tag(&self, pattern: &str) -> Result<Option<String>> {
        let output = self.run(&["tag", "-l", pattern, "--sort=-creatordate"])?;
        Ok(output.lines().next().map(|s| s.trim().to_string()))
    }
}
