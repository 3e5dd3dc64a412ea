//! TOML configuration parsing for package manifests and the workspace file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::package::Script;

/// File name of both the workspace file and per-package manifests.
pub const MANIFEST_FILE: &str = "monokit.toml";

/// A script value as written in TOML: either a bare command string or a
/// table with a command and extra environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    Simple(String),
    Detailed {
        command: String,
        #[serde(default)]
        env: HashMap<String, String>,
    },
}

impl ScriptValue {
    fn to_script(&self, name: &str) -> Script {
        match self {
            ScriptValue::Simple(command) => Script {
                name: name.to_string(),
                command: command.clone(),
                env: HashMap::new(),
            },
            ScriptValue::Detailed { command, env } => Script {
                name: name.to_string(),
                command: command.clone(),
                env: env.clone(),
            },
        }
    }
}

fn scripts_to_vec(scripts: &HashMap<String, ScriptValue>) -> Vec<Script> {
    let mut out: Vec<Script> = scripts
        .iter()
        .map(|(name, value)| value.to_script(name))
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Package manifest as defined in a package's `monokit.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub scripts: HashMap<String, ScriptValue>,
}

impl PackageManifest {
    pub fn parse(content: &str, context: &Path) -> Result<Self> {
        let manifest: PackageManifest = toml::from_str(content)
            .map_err(|e| Error::toml(e, context.display().to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("package name must not be empty".to_string()));
        }
        semver::Version::parse(&self.version).map_err(|e| {
            Error::Config(format!(
                "package '{}' has invalid version '{}': {}",
                self.name, self.version, e
            ))
        })?;
        Ok(())
    }

    pub fn to_scripts(&self) -> Vec<Script> {
        scripts_to_vec(&self.scripts)
    }
}

/// Versioning formats used when applying a version plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Tag template with `{name}` and `{version}` placeholders.
    #[serde(default = "default_tag_format")]
    pub tag_format: String,
    /// Commit message template with a `{packages}` placeholder.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

fn default_tag_format() -> String {
    "{name}@{version}".to_string()
}

fn default_commit_message() -> String {
    "chore(release): publish {packages}".to_string()
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            tag_format: default_tag_format(),
            commit_message: default_commit_message(),
        }
    }
}

/// File-cleaning configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Glob patterns removed under each package directory.
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Workspace-level configuration from the root `monokit.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Globs selecting package directories, relative to the root.
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
    /// Globs excluded from discovery.
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default = "default_topological")]
    pub topological: bool,
    /// Global environment layer applied to every task.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Workspace-level scripts, shadowed by package scripts of the same name.
    #[serde(default)]
    pub scripts: HashMap<String, ScriptValue>,
    #[serde(default)]
    pub versioning: VersioningConfig,
    #[serde(default)]
    pub clean: CleanConfig,
}

fn default_packages() -> Vec<String> {
    vec!["packages/*".to_string()]
}

fn default_concurrency() -> usize {
    4
}

fn default_topological() -> bool {
    true
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            packages: default_packages(),
            ignore: Vec::new(),
            concurrency: default_concurrency(),
            fail_fast: false,
            topological: default_topological(),
            env: HashMap::new(),
            scripts: HashMap::new(),
            versioning: VersioningConfig::default(),
            clean: CleanConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkspaceFile {
    workspace: WorkspaceConfig,
}

impl WorkspaceConfig {
    /// Loads and validates the root `monokit.toml`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the file is missing, unparseable or
    /// carries invalid values. Configuration errors abort the invocation
    /// before any graph work.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(Error::Config(format!(
                "workspace file not found at {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        let file: WorkspaceFile =
            toml::from_str(&content).map_err(|e| Error::toml(e, path.display().to_string()))?;
        let config = file.workspace;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.packages.is_empty() {
            return Err(Error::Config(
                "workspace.packages must not be empty".to_string(),
            ));
        }
        for pattern in self.packages.iter().chain(self.ignore.iter()) {
            glob::Pattern::new(pattern)
                .map_err(|e| Error::Config(format!("invalid glob '{}': {}", pattern, e)))?;
        }
        Ok(())
    }

    pub fn to_scripts(&self) -> Vec<Script> {
        scripts_to_vec(&self.scripts)
    }

    pub fn get_script(&self, name: &str) -> Option<Script> {
        self.scripts.get(name).map(|v| v.to_script(name))
    }

    pub fn script_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scripts.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Finds the workspace root by walking upwards from `start` until a
/// `monokit.toml` with a `[workspace]` table is found.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(MANIFEST_FILE);
        if candidate.exists() {
            if let Ok(content) = std::fs::read_to_string(&candidate) {
                if let Ok(value) = content.parse::<toml::Value>() {
                    if value.get("workspace").is_some() {
                        return Some(dir.to_path_buf());
                    }
                }
            }
        }
        current = dir.parent();
    }
    None
}
