//! Keyword bags and single-key extraction.
//!
//! A [`KeywordBag`] carries the keyword arguments passed into a
//! construction call. [`extract_key`] is the primitive the argument compiler
//! is built on: it reads one key, removing it from the bag unless asked to
//! keep it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Insertion-ordered mapping from keyword to value.
///
/// A `Null` value is the "unset" sentinel and is treated as absent by
/// [`extract_key`].
///
/// # Examples
///
/// ```
/// use param_schema_core::KeywordBag;
/// use serde_json::json;
///
/// let mut bag = KeywordBag::new();
/// bag.insert("lr", 0.5);
/// bag.insert("name", "run-1");
///
/// assert_eq!(bag.get("lr"), Some(&json!(0.5)));
/// assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["lr", "name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordBag(IndexMap<String, Value>);

impl KeywordBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Reads a value without removing it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Returns `true` if the key is present (even with a `Null` value).
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the bag has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwraps the underlying map.
    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }
}

impl From<IndexMap<String, Value>> for KeywordBag {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for KeywordBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for KeywordBag {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Extracts one key from a keyword bag.
///
/// If `key` is present with a non-`Null` value, it is removed from the bag
/// (left in place when `keep` is set) and its value returned, or `if_set`
/// instead when an override is supplied. Otherwise `default` is returned.
/// A missing key is never an error; pass [`Value::Null`] as the default to
/// get "absent" back.
///
/// # Examples
///
/// ```
/// use param_schema_core::{KeywordBag, extract_key};
/// use serde_json::{Value, json};
///
/// let mut bag: KeywordBag = [("lr", json!(0.5)), ("unset", Value::Null)].into_iter().collect();
///
/// assert_eq!(extract_key(&mut bag, "lr", json!(0.01), true, None), json!(0.5));
/// assert!(bag.contains_key("lr"));
///
/// assert_eq!(extract_key(&mut bag, "lr", json!(0.01), false, None), json!(0.5));
/// assert!(!bag.contains_key("lr"));
///
/// // `Null` counts as absent and is left alone.
/// assert_eq!(extract_key(&mut bag, "unset", json!(1), false, None), json!(1));
/// assert!(bag.contains_key("unset"));
/// ```
pub fn extract_key(
    bag: &mut KeywordBag,
    key: &str,
    default: Value,
    keep: bool,
    if_set: Option<Value>,
) -> Value {
    let present = bag.get(key).is_some_and(|value| !value.is_null());
    if !present {
        return default;
    }

    let value = if keep {
        bag.get(key).cloned()
    } else {
        bag.remove(key)
    };

    match if_set {
        Some(replacement) => replacement,
        None => value.unwrap_or(default),
    }
}
