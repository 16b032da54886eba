//! Serializable schema documents.
//!
//! A document lists type declarations. Parents are referenced by name and
//! may be declared later in the same document or in another document loaded
//! into the same registry.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! types:
//!   - name: Model
//!     params:
//!       seed: 42
//!       lr: { value: 0.01, help: "learning rate", short: l }
//!   - name: Trainer
//!     parents: [Model]
//!     params:
//!       epochs: { help: "number of epochs", type: integer }
//! ```

use std::path::Path;

use param_schema_core::TypeSchema;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Document format version written by this crate.
pub const DOCUMENT_VERSION: &str = "1.0";

/// One type declaration inside a [`SchemaDocument`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Type name, unique across a registry.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent type names, merged in this order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    /// Own parameter table.
    #[serde(default)]
    pub params: TypeSchema,
}

/// A file's worth of type declarations.
///
/// # Examples
///
/// ```
/// use param_schema_registry::SchemaDocument;
///
/// let doc = SchemaDocument::from_yaml_str(r#"
/// types:
///   - name: Model
///     params:
///       seed: 42
/// "#).unwrap();
/// assert_eq!(doc.version, "1.0");
/// assert_eq!(doc.types[0].params.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Declared types.
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

impl SchemaDocument {
    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`YamlError`](RegistryError::YamlError) on malformed input.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`](RegistryError::JsonError) on malformed input.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Loads a document, choosing the parser from the file extension
    /// (`yaml`, `yml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedFormat`](RegistryError::UnsupportedFormat) for
    /// other extensions, [`IoError`](RegistryError::IoError) if the file
    /// cannot be read, or a parse error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)
            .ok_or_else(|| RegistryError::UnsupportedFormat(path.to_path_buf()))?;
        let raw = std::fs::read_to_string(path)?;
        match format {
            DocumentFormat::Yaml => Self::from_yaml_str(&raw),
            DocumentFormat::Json => Self::from_json_str(&raw),
        }
    }
}

/// Supported document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl DocumentFormat {
    /// Detects the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}
