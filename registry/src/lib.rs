//! Schema documents and registries for `param-schema-core`.
//!
//! Type hierarchies are declared in YAML or JSON documents that reference
//! parents by name. A [`SchemaRegistry`] loads those documents, resolves
//! every parent link into a shared [`TypeDef`](param_schema_core::TypeDef),
//! and rejects unknown parents, duplicate names and cycles.
//!
//! Where documents come from is configured with a [`RegistryConfig`]
//! (conventionally `.param-schema.yml`) or a [`RegistryBuilder`] fallback
//! chain.

mod config;
mod document;
mod error;
mod loader;

pub use config::{DEFAULT_CONFIG_FILE, RegistryConfig};
pub use document::{DOCUMENT_VERSION, DocumentFormat, SchemaDocument, TypeDecl};
pub use error::{RegistryError, Result};
pub use loader::{RegistryBuilder, RegistrySource, SchemaRegistry};
