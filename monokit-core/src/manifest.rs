//! Manifest read/write collaborator used when applying a version plan.

use std::fs;
use std::path::Path;

use toml::Value;

use crate::error::{Error, Result};

/// Reads and writes the `version` field of package manifests. Each write is
/// independent: a multi-package plan may partially apply, with every failure
/// reported per package.
pub trait ManifestStore: Send + Sync {
    fn read_version(&self, manifest_path: &Path) -> Result<String>;
    fn write_version(&self, manifest_path: &Path, new_version: &str) -> Result<()>;
}

/// Production store operating on `monokit.toml` files.
pub struct TomlManifestStore;

impl TomlManifestStore {
    fn parse(&self, manifest_path: &Path) -> Result<Value> {
        let content = fs::read_to_string(manifest_path)?;
        content
            .parse()
            .map_err(|e| Error::toml(e, manifest_path.display().to_string()))
    }
}

impl ManifestStore for TomlManifestStore {
    fn read_version(&self, manifest_path: &Path) -> Result<String> {
        let value = self.parse(manifest_path)?;
        value
            .get("version")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                Error::Release(format!(
                    "no version field in {}",
                    manifest_path.display()
                ))
            })
    }

    fn write_version(&self, manifest_path: &Path, new_version: &str) -> Result<()> {
        semver::Version::parse(new_version)
            .map_err(|e| Error::Release(format!("invalid version '{}': {}", new_version, e)))?;

        let mut value = self.parse(manifest_path)?;
        let table = value.as_table_mut().ok_or_else(|| {
            Error::Release(format!(
                "manifest {} is not a TOML table",
                manifest_path.display()
            ))
        })?;
        table.insert(
            "version".to_string(),
            Value::String(new_version.to_string()),
        );

        let updated = toml::to_string_pretty(&value)?;
        fs::write(manifest_path, updated)?;
        Ok(())
    }
}
