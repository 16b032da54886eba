//! Error types for registry operations.
//!
//! Covers every failure mode of loading and resolving schema documents: I/O,
//! serialization, unknown file formats, and broken parent links.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// File extension is not one of `yaml`, `yml` or `json`.
    #[error("unsupported document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Two declarations share a type name.
    #[error("duplicate type: {0}")]
    DuplicateType(String),

    /// A declaration names a parent that is not declared anywhere.
    #[error("type {type_name} names unknown parent {parent}")]
    UnknownParent {
        /// The declaring type.
        type_name: String,
        /// The missing parent.
        parent: String,
    },

    /// Parent links form a cycle; the payload is the cycle path.
    #[error("parent cycle detected: {0}")]
    ParentCycle(String),

    /// All configured sources failed.
    #[error("no schema sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;
