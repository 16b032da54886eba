//! Registry loading with parent resolution and fallback chains.
//!
//! [`SchemaRegistry`] turns [`SchemaDocument`]s into linked
//! [`TypeDef`]s: every parent name is resolved to the shared definition of
//! that parent, so the core merge walks an explicit graph. Unknown parents,
//! duplicate names and parent cycles are rejected while loading.
//!
//! # Loading patterns
//!
//! ```no_run
//! use param_schema_registry::SchemaRegistry;
//!
//! // Load every *.yaml / *.yml / *.json document in a directory
//! let registry = SchemaRegistry::from_dir("schemas/").unwrap();
//! assert!(registry.get("Trainer").is_some());
//!
//! // Load a single document
//! let registry = SchemaRegistry::from_file("schemas.yaml").unwrap();
//!
//! // Use the builder for a fallback chain
//! let registry = SchemaRegistry::builder()
//!     .from_dir("schemas/")
//!     .from_file("schemas.yaml")
//!     .build()
//!     .unwrap();
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use param_schema_core::{TypeDef, ValidationError, validate_type};
use tracing::{debug, info};

use crate::document::{DocumentFormat, SchemaDocument, TypeDecl};
use crate::error::{RegistryError, Result};

/// Describes where a [`SchemaRegistry`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// Built from in-memory documents.
    Inline,
    /// Loaded from a single document file.
    File(PathBuf),
    /// Loaded from a directory of document files.
    Directory(PathBuf),
    /// Loaded via a fallback chain of multiple sources.
    Multiple(Vec<RegistrySource>),
}

/// Resolved type definitions indexed by name.
///
/// Names iterate in declaration order (document order, then file-name order
/// for directories).
///
/// # Examples
///
/// ```
/// use param_schema_registry::{SchemaDocument, SchemaRegistry};
///
/// let doc = SchemaDocument::from_yaml_str(r#"
/// types:
///   - name: Trainer
///     parents: [Model]
///     params:
///       epochs: { help: "number of epochs" }
///   - name: Model
///     params:
///       seed: 42
/// "#).unwrap();
///
/// let registry = SchemaRegistry::from_documents(vec![doc]).unwrap();
/// let trainer = registry.get("Trainer").unwrap();
/// assert_eq!(trainer.lineage(), vec!["Model", "Trainer"]);
/// assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Trainer", "Model"]);
/// ```
#[derive(Debug)]
pub struct SchemaRegistry {
    types: IndexMap<String, Arc<TypeDef>>,
    source: RegistrySource,
}

impl SchemaRegistry {
    /// Returns a new [`RegistryBuilder`] for configuring a fallback chain.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Resolves in-memory documents into a registry.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateType`](RegistryError::DuplicateType),
    /// [`UnknownParent`](RegistryError::UnknownParent) or
    /// [`ParentCycle`](RegistryError::ParentCycle) when parent links are
    /// broken.
    pub fn from_documents(documents: Vec<SchemaDocument>) -> Result<Self> {
        Self::resolve(documents, RegistrySource::Inline)
    }

    /// Loads a single YAML or JSON document.
    ///
    /// # Errors
    ///
    /// Returns an I/O, format or parse error for the file, or a resolution
    /// error as for [`from_documents`](Self::from_documents).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = SchemaDocument::load(path)?;
        let registry = Self::resolve(vec![document], RegistrySource::File(path.to_path_buf()))?;
        info!(path = %path.display(), types = registry.len(), "Loaded schema document");
        Ok(registry)
    }

    /// Loads every `*.yaml`, `*.yml` and `*.json` document in a directory.
    ///
    /// Files are read in file-name order; parents may be declared in any
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](RegistryError::IoError) if the directory cannot be
    /// read, a parse error for any document, or a resolution error.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.is_file() && DocumentFormat::from_path(&file_path).is_some() {
                files.push(file_path);
            }
        }
        files.sort();

        let documents = files
            .iter()
            .map(SchemaDocument::load)
            .collect::<Result<Vec<_>>>()?;
        let registry = Self::resolve(documents, RegistrySource::Directory(path.to_path_buf()))?;
        info!(
            path = %path.display(),
            files = files.len(),
            types = registry.len(),
            "Loaded schema directory"
        );
        Ok(registry)
    }

    fn resolve(documents: Vec<SchemaDocument>, source: RegistrySource) -> Result<Self> {
        let mut decls: IndexMap<String, TypeDecl> = IndexMap::new();
        for decl in documents.into_iter().flat_map(|doc| doc.types) {
            if decls.contains_key(&decl.name) {
                return Err(RegistryError::DuplicateType(decl.name));
            }
            decls.insert(decl.name.clone(), decl);
        }

        let mut resolved: HashMap<String, Arc<TypeDef>> = HashMap::new();
        let mut visiting = Vec::new();
        for name in decls.keys() {
            resolve_decl(name, &decls, &mut resolved, &mut visiting)?;
        }

        let mut types = IndexMap::new();
        for name in decls.keys() {
            if let Some(def) = resolved.remove(name) {
                types.insert(name.clone(), def);
            }
        }
        Ok(Self { types, source })
    }

    /// Looks up a type by name.
    pub fn get(&self, name: &str) -> Option<&Arc<TypeDef>> {
        self.types.get(name)
    }

    /// Returns `true` if the registry declares `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over type names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Iterates over definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDef>> {
        self.types.values()
    }

    /// Returns where the registry was loaded from.
    pub fn source(&self) -> &RegistrySource {
        &self.source
    }

    /// Validates every declared type, pairing each problem with its type
    /// name.
    pub fn validate(&self) -> Vec<(String, ValidationError)> {
        self.types
            .iter()
            .flat_map(|(name, def)| {
                validate_type(def)
                    .into_iter()
                    .map(move |err| (name.clone(), err))
            })
            .collect()
    }
}

fn resolve_decl(
    name: &str,
    decls: &IndexMap<String, TypeDecl>,
    resolved: &mut HashMap<String, Arc<TypeDef>>,
    visiting: &mut Vec<String>,
) -> Result<Arc<TypeDef>> {
    if let Some(def) = resolved.get(name) {
        return Ok(Arc::clone(def));
    }
    if visiting.iter().any(|n| n == name) {
        let cycle = visiting
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(name))
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(RegistryError::ParentCycle(cycle));
    }

    let decl = &decls[name];
    visiting.push(name.to_string());
    let mut def = TypeDef::new(name).with_schema(decl.params.clone());
    for parent in &decl.parents {
        if !decls.contains_key(parent) {
            return Err(RegistryError::UnknownParent {
                type_name: name.to_string(),
                parent: parent.clone(),
            });
        }
        def = def.with_parent(resolve_decl(parent, decls, resolved, visiting)?);
    }
    visiting.pop();

    debug!(type_name = name, parents = decl.parents.len(), "Resolved type");
    let def = def.into_shared();
    resolved.insert(name.to_string(), Arc::clone(&def));
    Ok(def)
}

/// Builder for constructing a [`SchemaRegistry`] with a fallback chain.
///
/// Sources are tried in the order they are added. The first successful load
/// wins; if all fail, [`RegistryError::NoSourcesAvailable`] is returned.
///
/// # Example
///
/// ```no_run
/// use param_schema_registry::SchemaRegistry;
///
/// let registry = SchemaRegistry::builder()
///     .from_dir("/etc/param-schema/")
///     .from_file("./schemas.yaml")
///     .build()
///     .unwrap();
/// ```
pub struct RegistryBuilder {
    sources: Vec<RegistrySource>,
}

impl RegistryBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Adds a directory of documents as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(RegistrySource::Directory(path.into()));
        self
    }

    /// Adds a single document file as a source.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(RegistrySource::File(path.into()));
        self
    }

    /// Adds a path, as a directory if it is one and as a file otherwise.
    pub fn from_path(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            self.from_dir(path)
        } else {
            self.from_file(path)
        }
    }

    /// Attempts to load from configured sources in order.
    ///
    /// Returns the first successfully loaded registry. If all sources fail,
    /// returns [`RegistryError::NoSourcesAvailable`].
    pub fn build(self) -> Result<SchemaRegistry> {
        if self.sources.is_empty() {
            return Err(RegistryError::NoSourcesAvailable);
        }

        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                RegistrySource::Directory(path) => SchemaRegistry::from_dir(path),
                RegistrySource::File(path) => SchemaRegistry::from_file(path),
                RegistrySource::Inline | RegistrySource::Multiple(_) => continue,
            };

            match result {
                Ok(mut registry) => {
                    registry.source = RegistrySource::Multiple(all_sources);
                    return Ok(registry);
                }
                Err(err) => debug!(source = ?source, error = %err, "Schema source failed"),
            }
        }

        Err(RegistryError::NoSourcesAvailable)
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> SchemaDocument {
        SchemaDocument::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let err = SchemaRegistry::from_documents(vec![doc(
            "types:\n  - name: A\n    parents: [Missing]\n",
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnknownParent { ref type_name, ref parent }
                if type_name == "A" && parent == "Missing"
        ));
    }

    #[test]
    fn test_cycle_rejected_with_path() {
        let err = SchemaRegistry::from_documents(vec![doc(
            "types:\n  - name: A\n    parents: [B]\n  - name: B\n    parents: [A]\n",
        )])
        .unwrap_err();
        match err {
            RegistryError::ParentCycle(path) => assert_eq!(path, "A -> B -> A"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_across_documents_rejected() {
        let err = SchemaRegistry::from_documents(vec![
            doc("types:\n  - name: A\n"),
            doc("types:\n  - name: A\n"),
        ])
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateType(name) if name == "A"));
    }

    #[test]
    fn test_shared_parent_resolved_once() {
        let registry = SchemaRegistry::from_documents(vec![doc(
            "types:\n  - name: Root\n  - name: L\n    parents: [Root]\n  - name: R\n    parents: [Root]\n",
        )])
        .unwrap();
        let left = registry.get("L").unwrap();
        let right = registry.get("R").unwrap();
        assert!(Arc::ptr_eq(&left.parents()[0], &right.parents()[0]));
        assert_eq!(registry.source(), &RegistrySource::Inline);
    }

    #[test]
    fn test_builder_without_sources_fails() {
        assert!(matches!(
            SchemaRegistry::builder().build(),
            Err(RegistryError::NoSourcesAvailable)
        ));
    }

    #[test]
    fn test_validate_reports_type_name() {
        let registry = SchemaRegistry::from_documents(vec![doc(
            "types:\n  - name: T\n    params:\n      lr: { value: 1, help: x, short: lr }\n",
        )])
        .unwrap();
        let issues = registry.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].0, "T");
    }
}
