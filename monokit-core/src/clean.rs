//! File cleaning via glob patterns under package directories.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::package::Package;

/// Collects paths matching the clean patterns under each package directory.
pub fn matching_paths(
    root: &Path,
    packages: &[&Package],
    patterns: &[String],
) -> Result<Vec<PathBuf>> {
    let mut matches = Vec::new();

    for package in packages {
        let package_dir = root.join(&package.path);
        for pattern in patterns {
            let full = package_dir.join(pattern);
            let glob_str = full.to_string_lossy();
            let paths = glob::glob(&glob_str)
                .map_err(|e| Error::Config(format!("invalid clean pattern '{}': {}", pattern, e)))?;
            for path in paths.flatten() {
                matches.push(path);
            }
        }
    }

    matches.sort();
    matches.dedup();
    Ok(matches)
}

/// Removes the given paths. Files and directories both supported; missing
/// paths are ignored.
pub fn remove_paths(paths: &[PathBuf]) -> Result<usize> {
    let mut removed = 0;
    for path in paths {
        if path.is_dir() {
            std::fs::remove_dir_all(path)?;
            removed += 1;
        } else if path.exists() {
            std::fs::remove_file(path)?;
            removed += 1;
        }
        info!(path = %path.display(), "removed");
    }
    Ok(removed)
}
