//! Statically declared type definitions.
//!
//! A [`TypeDef`] registers a type's own parameter table together with the
//! definitions of its parents. Parents are shared handles resolved when the
//! definition is built, so the merge walks an explicit graph instead of
//! inspecting an inheritance chain at runtime.
//!
//! # Example
//!
//! ```
//! use param_schema_core::*;
//!
//! let base = TypeDef::new("Model")
//!     .with_default("seed", 42)
//!     .with_param("lr", ParamSpec::new(0.01).with_help("learning rate"))
//!     .into_shared();
//!
//! let trainer = TypeDef::new("Trainer")
//!     .with_parent(base)
//!     .with_param("lr", ParamSpec::new(0.1).with_help("learning rate"));
//!
//! assert_eq!(trainer.parents().len(), 1);
//! assert_eq!(trainer.lineage(), vec!["Model", "Trainer"]);
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::compile::CustomExtractor;
use crate::{ParamSpec, SchemaEntry, TypeSchema};

/// A type's parameter declarations and its parents.
///
/// Definitions are immutable once shared. Build one with [`TypeDef::new`]
/// and the `with_*` methods, then call [`into_shared`](TypeDef::into_shared)
/// to hand it to child definitions.
#[derive(Clone)]
pub struct TypeDef {
    name: String,
    parents: Vec<Arc<TypeDef>>,
    schema: TypeSchema,
    extractor: Option<Arc<dyn CustomExtractor>>,
}

impl TypeDef {
    /// Creates a definition with an empty parameter table and no parents.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            schema: TypeSchema::new(),
            extractor: None,
        }
    }

    /// Appends a parent. Parents are merged in the order they are added.
    pub fn with_parent(mut self, parent: Arc<TypeDef>) -> Self {
        self.parents.push(parent);
        self
    }

    /// Declares a bare default value (no help text, not exposed on the CLI).
    pub fn with_default(self, key: &str, value: impl Into<Value>) -> Self {
        self.with_entry(key, SchemaEntry::Default(value.into()))
    }

    /// Declares a full parameter specification.
    pub fn with_param(self, key: &str, spec: ParamSpec) -> Self {
        self.with_entry(key, SchemaEntry::Spec(spec))
    }

    /// Declares an entry, replacing an earlier declaration of the same key
    /// in place.
    pub fn with_entry(mut self, key: &str, entry: SchemaEntry) -> Self {
        self.schema.insert(key.to_string(), entry);
        self
    }

    /// Replaces the whole parameter table.
    pub fn with_schema(mut self, schema: TypeSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Installs a custom extraction hook, run before declarative extraction.
    pub fn with_extractor(mut self, extractor: impl CustomExtractor + 'static) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    /// Wraps the definition for use as a parent.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct parents in declaration order.
    pub fn parents(&self) -> &[Arc<TypeDef>] {
        &self.parents
    }

    /// The type's own parameter table (parents not included).
    pub fn schema(&self) -> &TypeSchema {
        &self.schema
    }

    /// The custom extraction hook, if any.
    pub fn extractor(&self) -> Option<&Arc<dyn CustomExtractor>> {
        self.extractor.as_ref()
    }

    /// Looks up an entry in the type's own table.
    pub fn own_entry(&self, key: &str) -> Option<&SchemaEntry> {
        self.schema.get(key)
    }

    /// Type names in merge order: parents first (post-order, each name once),
    /// this type last.
    ///
    /// # Examples
    ///
    /// ```
    /// use param_schema_core::TypeDef;
    ///
    /// let root = TypeDef::new("Root").into_shared();
    /// let left = TypeDef::new("Left").with_parent(root.clone()).into_shared();
    /// let right = TypeDef::new("Right").with_parent(root).into_shared();
    /// let leaf = TypeDef::new("Leaf").with_parent(left).with_parent(right);
    ///
    /// assert_eq!(leaf.lineage(), vec!["Root", "Left", "Right", "Leaf"]);
    /// ```
    pub fn lineage(&self) -> Vec<&str> {
        self.linearize().into_iter().map(TypeDef::name).collect()
    }

    /// Definitions in merge order, matching [`lineage`](Self::lineage).
    ///
    /// A type reached through several parents appears once, at its first
    /// post-order position. A key's winning declaration is the last type in
    /// this order that declares it.
    pub fn linearize(&self) -> Vec<&TypeDef> {
        let mut defs = Vec::new();
        self.push_lineage(&mut defs);
        defs
    }

    fn push_lineage<'a>(&'a self, defs: &mut Vec<&'a TypeDef>) {
        for parent in &self.parents {
            parent.push_lineage(defs);
        }
        if !defs.iter().any(|d| d.name == self.name) {
            defs.push(self);
        }
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field(
                "parents",
                &self.parents.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("schema", &self.schema)
            .field("extractor", &self.extractor.is_some())
            .finish()
    }
}
