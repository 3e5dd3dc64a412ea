//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Duplicate package name '{name}' declared by {first} and {second}")]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Package not found: {name}. Available packages: {available}")]
    PackageNotFound { name: String, available: String },

    #[error("Task execution failed for {package}: {message}")]
    TaskExecution { package: String, message: String },

    #[error("Git error: {0}")]
    Git(String),

    #[error("Release error: {0}")]
    Release(String),
}

impl Error {
    pub(crate) fn toml(error: toml::de::Error, context: impl Into<String>) -> Self {
        Error::Toml {
            error,
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
