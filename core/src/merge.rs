//! Schema merging across a type's parents.
//!
//! Two merges walk the same parent graph:
//!
//! - [`collect_parameters`] keeps only documented specifications (entries
//!   with help text). It feeds CLI projection and generated docs.
//! - [`merge_defaults`] keeps every entry, bare defaults included. It answers
//!   "what does this type effectively default to".
//!
//! Both recurse into each parent in declaration order before applying the
//! type's own entries, so a key declared on a more specific type always wins
//! over the same key further up the parent graph. Among siblings, a later
//! parent overwrites an earlier one.
//!
//! # Example
//!
//! ```
//! use param_schema_core::*;
//! use serde_json::json;
//!
//! let base = TypeDef::new("Base")
//!     .with_default("seed", 42)
//!     .with_param("lr", ParamSpec::new(0.01).with_help("learning rate"))
//!     .into_shared();
//! let child = TypeDef::new("Child")
//!     .with_parent(base)
//!     .with_param("lr", ParamSpec::new(0.1).with_help("learning rate"));
//!
//! let merged = merge_defaults(&child);
//! assert_eq!(merged.effective_default("lr"), Some(&json!(0.1)));
//! assert_eq!(merged.effective_default("seed"), Some(&json!(42)));
//!
//! // Only documented entries take part in the CLI/doc merge.
//! assert_eq!(collect_parameters(&child).len(), 1);
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{ParamSpec, SchemaEntry, TypeDef};

/// The schema a type effectively presents after merging its parents.
///
/// Keys keep the position of their first appearance in the merge walk;
/// values are the most specific declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MergedSchema {
    entries: IndexMap<String, SchemaEntry>,
}

impl MergedSchema {
    /// Looks up the effective entry for a key.
    pub fn get(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.get(key)
    }

    /// Returns the effective default for a key, or `None` when the key is
    /// unknown or required.
    pub fn effective_default(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).and_then(SchemaEntry::default_value)
    }

    /// Returns `true` if the key is declared anywhere in the lineage.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys of entries without a default.
    pub fn required_keys(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_required())
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Defaulted keys with their unwrapped default values.
    pub fn defaults(&self) -> IndexMap<&str, &Value> {
        self.entries
            .iter()
            .filter_map(|(key, entry)| entry.default_value().map(|value| (key.as_str(), value)))
            .collect()
    }

    /// Iterates over effective entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Number of effective entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is declared in the lineage.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merges every declared entry of `def` and its parents, child wins.
pub fn merge_defaults(def: &TypeDef) -> MergedSchema {
    let mut entries = IndexMap::new();
    merge_into(def, &mut entries, &|_: &SchemaEntry| true);
    debug!(type_name = def.name(), entries = entries.len(), "Merged defaults");
    MergedSchema { entries }
}

/// Merges the documented specifications of `def` and its parents, child
/// wins.
///
/// Bare defaults and specifications without help never appear here, even
/// when they redeclare a documented parent key; the parent's documented
/// specification is kept in that case.
pub fn collect_parameters(def: &TypeDef) -> IndexMap<String, ParamSpec> {
    let mut entries = IndexMap::new();
    merge_into(def, &mut entries, &SchemaEntry::is_documented);
    debug!(type_name = def.name(), params = entries.len(), "Collected documented parameters");
    entries
        .into_iter()
        .filter_map(|(key, entry)| match entry {
            SchemaEntry::Spec(spec) => Some((key, spec)),
            SchemaEntry::Default(_) => None,
        })
        .collect()
}

fn merge_into(
    def: &TypeDef,
    acc: &mut IndexMap<String, SchemaEntry>,
    keep: &dyn Fn(&SchemaEntry) -> bool,
) {
    for ty in def.linearize() {
        for (key, entry) in ty.schema() {
            if keep(entry) {
                acc.insert(key.clone(), entry.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn documented(value: i64) -> ParamSpec {
        ParamSpec::new(value).with_help("doc")
    }

    fn diamond() -> TypeDef {
        let root = TypeDef::new("Root")
            .with_param("x", documented(0))
            .with_param("y", documented(0))
            .into_shared();
        let left = TypeDef::new("Left")
            .with_parent(Arc::clone(&root))
            .with_param("x", documented(1))
            .into_shared();
        let right = TypeDef::new("Right")
            .with_parent(root)
            .with_param("x", documented(2))
            .with_param("y", documented(2))
            .into_shared();
        TypeDef::new("Leaf").with_parent(left).with_parent(right)
    }

    #[test]
    fn test_later_parent_wins_among_siblings() {
        let merged = merge_defaults(&diamond());
        assert_eq!(merged.effective_default("x"), Some(&json!(2)));
        assert_eq!(merged.effective_default("y"), Some(&json!(2)));
    }

    #[test]
    fn test_direct_override_shadows_indirect() {
        let root = TypeDef::new("Root").with_default("x", 0).into_shared();
        let mid = TypeDef::new("Mid")
            .with_parent(root)
            .with_default("x", 1)
            .into_shared();
        let leaf = TypeDef::new("Leaf").with_parent(mid);
        assert_eq!(merge_defaults(&leaf).effective_default("x"), Some(&json!(1)));
    }

    #[test]
    fn test_shared_ancestor_does_not_undo_override() {
        let root = TypeDef::new("Root").with_default("x", 0).into_shared();
        let left = TypeDef::new("Left")
            .with_parent(Arc::clone(&root))
            .with_default("x", 1)
            .into_shared();
        let right = TypeDef::new("Right").with_parent(root).into_shared();
        let leaf = TypeDef::new("Leaf").with_parent(left).with_parent(right);
        assert_eq!(merge_defaults(&leaf).effective_default("x"), Some(&json!(1)));
    }

    #[test]
    fn test_key_order_follows_first_appearance() {
        let merged = merge_defaults(&diamond());
        let keys: Vec<&str> = merged.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_undocumented_override_keeps_parent_doc_entry() {
        let base = TypeDef::new("Base")
            .with_param("lr", ParamSpec::new(0.01).with_help("learning rate"))
            .into_shared();
        let child = TypeDef::new("Child").with_parent(base).with_default("lr", 0.5);

        let params = collect_parameters(&child);
        assert_eq!(params["lr"].value, Some(json!(0.01)));
        assert_eq!(merge_defaults(&child).effective_default("lr"), Some(&json!(0.5)));
    }

    #[test]
    fn test_required_keys_reported() {
        let def = TypeDef::new("T")
            .with_param("input", ParamSpec::required().with_help("input file"))
            .with_default("seed", 1);
        let merged = merge_defaults(&def);
        assert_eq!(merged.required_keys(), vec!["input"]);
        assert_eq!(merged.defaults().len(), 1);
    }
}
