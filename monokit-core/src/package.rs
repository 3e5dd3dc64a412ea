//! Package data model.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A named script that can be executed for a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub command: String,
    /// Script-level environment, layered over the workspace environment.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Represents a package in the monorepo.
///
/// Built once per invocation by the scanner and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    /// Path relative to the workspace root.
    pub path: PathBuf,
    #[serde(
        deserialize_with = "deserialize_deps",
        serialize_with = "serialize_deps"
    )]
    pub deps: SmallVec<[String; 4]>,
    pub scripts: Vec<Script>,
}

fn deserialize_deps<'de, D>(deserializer: D) -> Result<SmallVec<[String; 4]>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let vec: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(SmallVec::from_vec(vec))
}

fn serialize_deps<S>(deps: &SmallVec<[String; 4]>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let vec: Vec<&String> = deps.iter().collect();
    vec.serialize(serializer)
}

impl Package {
    pub fn new(
        name: String,
        version: String,
        path: PathBuf,
        deps: Vec<String>,
        scripts: Vec<Script>,
    ) -> Self {
        Self {
            name,
            version,
            path,
            deps: SmallVec::from_vec(deps),
            scripts,
        }
    }

    #[inline]
    pub fn get_script(&self, name: &str) -> Option<&Script> {
        self.scripts.iter().find(|s| s.name == name)
    }

    /// Path to this package's manifest, relative to the workspace root.
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(crate::config::MANIFEST_FILE)
    }
}
