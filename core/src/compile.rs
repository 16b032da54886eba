//! Argument compilation: splitting a keyword bag into the options a type
//! recognizes and everything else.
//!
//! [`compile_arguments`] reads every key declared on a type out of a
//! [`KeywordBag`], filling in schema defaults, and hands back the resolved
//! options together with the leftover bag so unrelated keywords can be
//! passed on instead of dropped.
//!
//! # Example
//!
//! ```
//! use param_schema_core::*;
//! use serde_json::{Value, json};
//!
//! let def = TypeDef::new("Trainer")
//!     .with_default("lr", 0.01)
//!     .with_param("epochs", ParamSpec::required().with_help("number of epochs"));
//!
//! let mut bag: KeywordBag = [("lr", json!(0.5)), ("device", json!("cpu"))].into_iter().collect();
//! let (resolved, leftover) = compile_arguments(&def, &mut bag, CompileOptions::default());
//!
//! assert_eq!(resolved.get("lr"), Some(&json!(0.5)));
//! assert_eq!(resolved.get("epochs"), Some(&Value::Null));
//! assert_eq!(resolved.missing(), vec!["epochs"]);
//! assert_eq!(leftover.keys().collect::<Vec<_>>(), vec!["device"]);
//! // The caller's bag is copied by default.
//! assert_eq!(bag.len(), 2);
//! ```

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{KeywordBag, TypeDef, extract_key};

/// Extraction mode flags.
///
/// # Examples
///
/// ```
/// use param_schema_core::CompileOptions;
///
/// let options = CompileOptions::default();
/// assert!(options.keep_entries);
/// assert!(!options.transitive);
///
/// let options = CompileOptions::default().transitive().in_place();
/// assert!(options.transitive);
/// assert!(!options.keep_entries);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Also extract the declarations of every ancestor.
    pub transitive: bool,
    /// Skip the type's custom extraction hook.
    pub override_static: bool,
    /// Work on a copy of the caller's bag instead of draining it.
    pub keep_entries: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            transitive: false,
            override_static: false,
            keep_entries: true,
        }
    }
}

impl CompileOptions {
    /// Enables transitive extraction.
    pub fn transitive(mut self) -> Self {
        self.transitive = true;
        self
    }

    /// Skips the custom extraction hook.
    pub fn override_static(mut self) -> Self {
        self.override_static = true;
        self
    }

    /// Drains the caller's bag instead of copying it.
    pub fn in_place(mut self) -> Self {
        self.keep_entries = false;
        self
    }
}

/// Options resolved for a type.
///
/// Required keys the caller did not supply resolve to [`Value::Null`]; they
/// are reported by [`missing`](ResolvedOptions::missing) rather than raised
/// as errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedOptions(IndexMap<String, Value>);

impl ResolvedOptions {
    /// Creates an empty set of options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option, replacing an earlier value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Reads an option. Absent required options read as `Some(&Null)`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if the option is unknown or resolved to `Null`.
    pub fn is_absent(&self, key: &str) -> bool {
        self.0.get(key).is_none_or(Value::is_null)
    }

    /// Keys that resolved to `Null`.
    pub fn missing(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Adds every option from `other`, overwriting on collision.
    pub fn merge(&mut self, other: ResolvedOptions) {
        self.0.extend(other.0);
    }

    /// Iterates over keys in resolution order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over options in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of resolved options.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts into a keyword bag, e.g. to feed a parent's extraction.
    pub fn into_bag(self) -> KeywordBag {
        KeywordBag::from(self.0)
    }
}

/// Bespoke extraction logic for a type.
///
/// When a [`TypeDef`] carries a hook, [`compile_arguments`] runs it first
/// (unless [`CompileOptions::override_static`] is set) and folds its result
/// into the declarative extraction. The hook should remove the keys it
/// recognizes from `bag`; keys it resolves are final and are not extracted
/// again from the type's table or, in transitive mode, from any ancestor's.
/// When hooks at several levels resolve the same key, the most specific one
/// wins. To reuse the declarative path from inside a hook,
/// call [`compile_arguments`] with `override_static` set.
///
/// Closures with the matching signature implement this trait.
///
/// # Examples
///
/// ```
/// use param_schema_core::*;
/// use serde_json::json;
///
/// let def = TypeDef::new("Scaled")
///     .with_default("size", 1)
///     .with_extractor(|_: &TypeDef, bag: &mut KeywordBag, _: CompileOptions| {
///         let mut resolved = ResolvedOptions::new();
///         let scale = extract_key(bag, "scale", json!(1), false, None);
///         resolved.insert("scale", scale);
///         resolved
///     });
///
/// let mut bag: KeywordBag = [("scale", json!(3))].into_iter().collect();
/// let (resolved, leftover) = compile_arguments(&def, &mut bag, CompileOptions::default());
/// assert_eq!(resolved.get("scale"), Some(&json!(3)));
/// assert_eq!(resolved.get("size"), Some(&json!(1)));
/// assert!(leftover.is_empty());
/// ```
pub trait CustomExtractor: Send + Sync {
    /// Extracts options for `def` from `bag`.
    fn compile_arguments(
        &self,
        def: &TypeDef,
        bag: &mut KeywordBag,
        options: CompileOptions,
    ) -> ResolvedOptions;
}

impl<F> CustomExtractor for F
where
    F: Fn(&TypeDef, &mut KeywordBag, CompileOptions) -> ResolvedOptions + Send + Sync,
{
    fn compile_arguments(
        &self,
        def: &TypeDef,
        bag: &mut KeywordBag,
        options: CompileOptions,
    ) -> ResolvedOptions {
        self(def, bag, options)
    }
}

/// Extracts every key `def` declares from `bag`.
///
/// Returns `(resolved, leftover)`. With [`CompileOptions::keep_entries`]
/// (the default) the caller's bag is left untouched and extraction runs on a
/// shallow copy, so repeated calls against the same bag give the same
/// result. Without it, recognized keys are drained from `bag` and the
/// leftover equals what remains in it.
///
/// Defaulted keys resolve to the caller's value or the schema default;
/// required keys resolve to the caller's value or [`Value::Null`].
///
/// In transitive mode every ancestor is extracted too, each exactly once and
/// in [`TypeDef::linearize`] order. A key is extracted only by its winning
/// declaration (the one [`merge_defaults`](crate::merge_defaults) keeps), so
/// the caller's value for an overridden key reaches the overriding
/// declaration even when an ancestor is shared by several parents.
pub fn compile_arguments(
    def: &TypeDef,
    bag: &mut KeywordBag,
    options: CompileOptions,
) -> (ResolvedOptions, KeywordBag) {
    if options.keep_entries {
        let mut working = bag.clone();
        let resolved = compile_into(def, &mut working, options);
        (resolved, working)
    } else {
        let resolved = compile_into(def, bag, options);
        (resolved, bag.clone())
    }
}

fn compile_into(def: &TypeDef, bag: &mut KeywordBag, options: CompileOptions) -> ResolvedOptions {
    let mut resolved = ResolvedOptions::new();
    let mut hooked: HashSet<String> = HashSet::new();
    if !options.override_static {
        run_extractor(def, bag, options, &mut resolved, &mut hooked);
    }

    if !options.transitive {
        extract_table(def, bag, &mut resolved, |key| !hooked.contains(key));
        return finish(def, bag, resolved);
    }

    // Each type is visited once; a key belongs to its last declarer.
    let lineage = def.linearize();
    let mut owner: HashMap<&str, usize> = HashMap::new();
    for (index, ty) in lineage.iter().enumerate() {
        for key in ty.schema().keys() {
            owner.insert(key.as_str(), index);
        }
    }

    let parent_options = CompileOptions {
        override_static: false,
        ..options
    };
    let last = lineage.len() - 1;
    for (index, ty) in lineage.iter().enumerate() {
        if index != last {
            run_extractor(ty, bag, parent_options, &mut resolved, &mut hooked);
        }
        extract_table(ty, bag, &mut resolved, |key| {
            owner.get(key) == Some(&index) && !hooked.contains(key)
        });
    }
    finish(def, bag, resolved)
}

/// Runs the hook of `def`, if any. Keys already resolved by a more specific
/// hook are kept.
fn run_extractor(
    def: &TypeDef,
    bag: &mut KeywordBag,
    options: CompileOptions,
    resolved: &mut ResolvedOptions,
    hooked: &mut HashSet<String>,
) {
    let Some(extractor) = def.extractor() else {
        return;
    };
    debug!(type_name = def.name(), "Running custom extractor");
    let from_hook = extractor.compile_arguments(def, bag, options);
    for (key, value) in from_hook.iter() {
        if hooked.insert(key.to_string()) {
            resolved.insert(key, value.clone());
        }
    }
}

/// Extracts the own-table keys of `def` accepted by `wanted`: defaults
/// first, then required keys.
fn extract_table(
    def: &TypeDef,
    bag: &mut KeywordBag,
    resolved: &mut ResolvedOptions,
    wanted: impl Fn(&str) -> bool,
) {
    for (key, entry) in def.schema() {
        if !wanted(key) {
            continue;
        }
        if let Some(default) = entry.default_value() {
            let value = extract_key(bag, key, default.clone(), false, None);
            resolved.insert(key.clone(), value);
        }
    }
    for (key, entry) in def.schema() {
        if wanted(key) && entry.is_required() {
            let value = extract_key(bag, key, Value::Null, false, None);
            resolved.insert(key.clone(), value);
        }
    }
}

fn finish(def: &TypeDef, bag: &KeywordBag, resolved: ResolvedOptions) -> ResolvedOptions {
    debug!(
        type_name = def.name(),
        resolved = resolved.len(),
        leftover = bag.len(),
        "Compiled arguments"
    );
    resolved
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ParamSpec;

    fn base() -> TypeDef {
        TypeDef::new("Base")
            .with_default("seed", 42)
            .with_param("lr", ParamSpec::new(0.01).with_help("learning rate"))
    }

    fn child() -> TypeDef {
        TypeDef::new("Child")
            .with_parent(base().into_shared())
            .with_param("lr", ParamSpec::new(0.1).with_help("learning rate"))
            .with_param("epochs", ParamSpec::required().with_help("epochs"))
    }

    fn bag(entries: &[(&str, Value)]) -> KeywordBag {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let mut input = KeywordBag::new();
        let (resolved, leftover) = compile_arguments(&base(), &mut input, CompileOptions::default());
        assert_eq!(resolved.get("seed"), Some(&json!(42)));
        assert_eq!(resolved.get("lr"), Some(&json!(0.01)));
        assert!(leftover.is_empty());
    }

    #[test]
    fn test_non_transitive_uses_own_table_only() {
        let mut input = bag(&[("seed", json!(7))]);
        let (resolved, leftover) = compile_arguments(&child(), &mut input, CompileOptions::default());
        assert!(resolved.get("seed").is_none());
        assert_eq!(leftover.get("seed"), Some(&json!(7)));
    }

    #[test]
    fn test_transitive_collects_ancestors() {
        let mut input = bag(&[("seed", json!(7)), ("lr", json!(0.5))]);
        let (resolved, leftover) =
            compile_arguments(&child(), &mut input, CompileOptions::default().transitive());
        assert_eq!(resolved.get("seed"), Some(&json!(7)));
        assert_eq!(resolved.get("lr"), Some(&json!(0.5)));
        assert!(resolved.is_absent("epochs"));
        assert!(leftover.is_empty());
    }

    #[test]
    fn test_transitive_child_default_wins() {
        let mut input = KeywordBag::new();
        let (resolved, _) =
            compile_arguments(&child(), &mut input, CompileOptions::default().transitive());
        assert_eq!(resolved.get("lr"), Some(&json!(0.1)));
    }

    #[test]
    fn test_in_place_drains_caller_bag() {
        let mut input = bag(&[("lr", json!(0.5)), ("other", json!(true))]);
        let (resolved, leftover) =
            compile_arguments(&base(), &mut input, CompileOptions::default().in_place());
        assert_eq!(resolved.get("lr"), Some(&json!(0.5)));
        assert_eq!(input, leftover);
        assert_eq!(input.keys().collect::<Vec<_>>(), vec!["other"]);
    }

    #[test]
    fn test_null_value_falls_back_to_default() {
        let mut input = bag(&[("lr", Value::Null)]);
        let (resolved, leftover) = compile_arguments(&base(), &mut input, CompileOptions::default());
        assert_eq!(resolved.get("lr"), Some(&json!(0.01)));
        assert!(leftover.contains_key("lr"));
    }

    #[test]
    fn test_override_static_skips_extractor() {
        let def = base().with_extractor(|_: &TypeDef, _: &mut KeywordBag, _: CompileOptions| {
            let mut resolved = ResolvedOptions::new();
            resolved.insert("hooked", true);
            resolved
        });
        let mut input = KeywordBag::new();

        let (hooked, _) = compile_arguments(&def, &mut input, CompileOptions::default());
        assert_eq!(hooked.get("hooked"), Some(&json!(true)));

        let (plain, _) =
            compile_arguments(&def, &mut input, CompileOptions::default().override_static());
        assert!(plain.get("hooked").is_none());
    }

    #[test]
    fn test_transitive_keeps_hook_value_over_ancestor_default() {
        let base = TypeDef::new("Base").with_default("scale", 1).into_shared();
        let def = TypeDef::new("Scaled").with_parent(base).with_extractor(
            |_: &TypeDef, bag: &mut KeywordBag, _: CompileOptions| {
                let mut resolved = ResolvedOptions::new();
                resolved.insert("scale", extract_key(bag, "scale", json!(1), false, None));
                resolved
            },
        );
        let mut input = bag(&[("scale", json!(3))]);
        let (resolved, leftover) =
            compile_arguments(&def, &mut input, CompileOptions::default().transitive());
        assert_eq!(resolved.get("scale"), Some(&json!(3)));
        assert!(leftover.is_empty());
    }

    #[test]
    fn test_ancestor_hook_runs_once_in_transitive_mode() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let root = TypeDef::new("Root")
            .with_default("seed", 42)
            .with_extractor(move |_: &TypeDef, _: &mut KeywordBag, _: CompileOptions| {
                counted.fetch_add(1, Ordering::SeqCst);
                ResolvedOptions::new()
            })
            .into_shared();
        let left = TypeDef::new("Left").with_parent(Arc::clone(&root)).into_shared();
        let right = TypeDef::new("Right").with_parent(root).into_shared();
        let leaf = TypeDef::new("Leaf").with_parent(left).with_parent(right);

        let mut input = KeywordBag::new();
        compile_arguments(&leaf, &mut input, CompileOptions::default().transitive());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolution_order_defaults_then_required() {
        let mut input = KeywordBag::new();
        let (resolved, _) = compile_arguments(&child(), &mut input, CompileOptions::default());
        assert_eq!(resolved.keys().collect::<Vec<_>>(), vec!["lr", "epochs"]);
    }
}
