//! Workspace scanner for discovering package manifests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glob::Pattern;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::{PackageManifest, WorkspaceConfig, MANIFEST_FILE};
use crate::error::{Error, Result};
use crate::package::Package;

/// Discovers packages under a workspace root.
///
/// Walks the filesystem for `monokit.toml` manifests whose directory matches
/// one of the package globs and none of the ignore globs. A pure function of
/// its inputs: no ambient state is consulted beyond the supplied root.
pub struct Scanner {
    root: PathBuf,
    package_globs: Vec<Pattern>,
    ignore_globs: Vec<Pattern>,
}

impl Scanner {
    pub fn new(
        root: impl Into<PathBuf>,
        package_globs: &[String],
        ignore_globs: &[String],
    ) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<Pattern>> {
            patterns
                .iter()
                .map(|p| {
                    Pattern::new(p)
                        .map_err(|e| Error::Config(format!("invalid glob '{}': {}", p, e)))
                })
                .collect()
        };

        Ok(Self {
            root: root.into(),
            package_globs: compile(package_globs)?,
            ignore_globs: compile(ignore_globs)?,
        })
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &WorkspaceConfig) -> Result<Self> {
        Self::new(root, &config.packages, &config.ignore)
    }

    /// Scans the workspace and returns packages sorted by name.
    ///
    /// Workspace-level scripts are merged into each package unless the
    /// package declares a script with the same name.
    ///
    /// # Errors
    ///
    /// Fails when two manifests declare the same package name, or when a
    /// manifest is unreadable or invalid.
    pub fn scan(&self, workspace_config: Option<&WorkspaceConfig>) -> Result<Vec<Package>> {
        let manifest_paths: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(|e| e.ok())
            .filter(|e| e.depth() > 0 && e.file_name() == MANIFEST_FILE)
            .map(|e| e.path().to_path_buf())
            .filter(|path| self.matches(path))
            .collect();

        let packages: Result<Vec<Package>> = manifest_paths
            .into_par_iter()
            .map(|manifest_path| self.parse_manifest(&manifest_path, workspace_config))
            .collect();

        let mut packages = packages?;
        packages.sort_by(|a, b| a.name.cmp(&b.name));

        let mut seen: HashMap<&str, &Path> = HashMap::new();
        for package in &packages {
            if let Some(first) = seen.insert(&package.name, &package.path) {
                return Err(Error::DuplicatePackage {
                    name: package.name.clone(),
                    first: first.to_path_buf(),
                    second: package.path.clone(),
                });
            }
        }

        Ok(packages)
    }

    fn matches(&self, manifest_path: &Path) -> bool {
        let Some(package_dir) = manifest_path.parent() else {
            return false;
        };
        let Ok(relative) = package_dir.strip_prefix(&self.root) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            // The root manifest is the workspace file, not a package.
            return false;
        }

        let included = self.package_globs.iter().any(|g| g.matches_path(relative));
        let ignored = self.ignore_globs.iter().any(|g| g.matches_path(relative));
        included && !ignored
    }

    fn parse_manifest(
        &self,
        manifest_path: &Path,
        workspace_config: Option<&WorkspaceConfig>,
    ) -> Result<Package> {
        let content = std::fs::read_to_string(manifest_path)?;
        let manifest = PackageManifest::parse(&content, manifest_path)?;

        let package_dir = manifest_path
            .parent()
            .expect("manifest path always has a parent");
        let relative_path = package_dir
            .strip_prefix(&self.root)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| package_dir.to_path_buf());

        let mut scripts = manifest.to_scripts();
        if let Some(config) = workspace_config {
            for workspace_script in config.to_scripts() {
                if !scripts.iter().any(|s| s.name == workspace_script.name) {
                    scripts.push(workspace_script);
                }
            }
        }

        Ok(Package::new(
            manifest.name,
            manifest.version,
            relative_path,
            manifest.dependencies,
            scripts,
        ))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
