//! Registry configuration.
//!
//! Defines the YAML-serializable configuration that tells tools where schema
//! documents live and which types to hide from listings.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! sources:
//!   - schemas/
//!   - legacy/schemas.yaml
//! exclude:
//!   - InternalBase
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::loader::SchemaRegistry;

/// Conventional configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".param-schema.yml";

/// Top-level registry configuration.
///
/// # Examples
///
/// ```no_run
/// use param_schema_registry::RegistryConfig;
///
/// let config = RegistryConfig::load(".param-schema.yml").unwrap();
/// let registry = config.open_registry(".").unwrap();
/// for name in registry.names().filter(|n| !config.is_excluded(n)) {
///     println!("{name}");
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Document files or directories, tried in order as a fallback chain.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    /// Type names hidden from listings.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            version: crate::document::DOCUMENT_VERSION.to_string(),
            sources: vec![PathBuf::from("schemas")],
            exclude: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::RegistryError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::RegistryError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `type_name` is in the exclusion list.
    pub fn is_excluded(&self, type_name: &str) -> bool {
        self.exclude.iter().any(|t| t == type_name)
    }

    /// Loads the registry from the configured sources.
    ///
    /// Relative source paths are resolved against `base_dir`, usually the
    /// directory holding the configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`NoSourcesAvailable`](crate::RegistryError::NoSourcesAvailable)
    /// if no source loads.
    pub fn open_registry(&self, base_dir: impl AsRef<Path>) -> Result<SchemaRegistry> {
        let base_dir = base_dir.as_ref();
        self.sources
            .iter()
            .fold(SchemaRegistry::builder(), |builder, source| {
                builder.from_path(base_dir.join(source))
            })
            .build()
    }
}
