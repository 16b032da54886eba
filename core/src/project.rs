//! Projection of documented parameters onto command-line flag declarations.
//!
//! [`define_arguments`] turns each documented parameter in a type's merged
//! schema into a [`FlagDecl`]. Declarations are plain data: binding them to
//! an argument parser is left to a consumer such as the `clap` module.
//!
//! # Example
//!
//! ```
//! use param_schema_core::*;
//!
//! let def = TypeDef::new("Loader")
//!     .with_param("shuffle", ParamSpec::new(true).with_help("shuffle samples"))
//!     .with_param("verbose", ParamSpec::new(false).with_help("log progress"))
//!     .with_default("seed", 42);
//!
//! let flags = define_arguments(&def);
//! assert_eq!(flags.len(), 2);
//! assert_eq!(flags[0].names(), vec!["--no_shuffle"]);
//! assert_eq!(flags[0].action, FlagAction::StoreFalse);
//! assert_eq!(flags[0].dest, "shuffle");
//! assert_eq!(flags[1].action, FlagAction::StoreTrue);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Nargs, ParamSpec, TypeDef, ValueType, collect_parameters};

/// What a flag does when it appears on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagAction {
    /// Takes one or more values.
    Store,
    /// Sets the destination to `true` on presence.
    StoreTrue,
    /// Sets the destination to `false` on presence.
    StoreFalse,
}

/// A command-line flag declaration derived from a documented parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDecl {
    /// Primary long name, without dashes.
    pub long: String,
    /// Short name, without the dash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    /// Additional long names, without dashes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Parameter key the parsed value is stored under.
    pub dest: String,
    /// Flag behavior.
    pub action: FlagAction,
    /// Value type hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    /// Arity hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nargs: Option<Nargs>,
    /// Default value (`None` for required flags).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Whether the flag must be supplied.
    pub required: bool,
    /// Help text.
    pub help: String,
}

impl FlagDecl {
    /// Visible flag spellings in the order a parser should try them: short
    /// form first, then the primary long name, then aliases.
    pub fn names(&self) -> Vec<String> {
        self.short
            .iter()
            .map(|s| format!("-{s}"))
            .chain(std::iter::once(format!("--{}", self.long)))
            .chain(self.aliases.iter().map(|a| format!("--{a}")))
            .collect()
    }

    /// Returns `true` if the flag collects a list of values.
    pub fn is_multiple(&self) -> bool {
        self.nargs.is_some_and(|n| n.is_multiple())
    }

    /// The type hint, or one inferred from the default.
    pub fn effective_type(&self) -> ValueType {
        self.value_type
            .clone()
            .or_else(|| self.default.as_ref().map(ValueType::infer))
            .unwrap_or_default()
    }
}

/// Builds flag declarations for every documented parameter of `def` and its
/// parents.
pub fn define_arguments(def: &TypeDef) -> Vec<FlagDecl> {
    collect_parameters(def)
        .iter()
        .map(|(key, spec)| project_param(key, spec))
        .collect()
}

/// Builds the flag declaration for one documented parameter.
///
/// - default `false`: a store-true flag named after the key;
/// - default `true`: a store-false flag named `<invert_meaning><key>`, or
///   `no_<key>` without a prefix;
/// - no default: a required flag;
/// - otherwise the flag carries the default, with `nargs = +` inferred for
///   list and mapping defaults.
///
/// An explicit `name` replaces the visible long name in every case.
pub fn project_param(key: &str, spec: &ParamSpec) -> FlagDecl {
    let nargs = spec.nargs.or_else(|| match &spec.value {
        Some(Value::Array(_) | Value::Object(_)) => Some(Nargs::OneOrMore),
        _ => None,
    });

    let (action, long, required) = match &spec.value {
        Some(Value::Bool(false)) => (FlagAction::StoreTrue, key.to_string(), false),
        Some(Value::Bool(true)) => {
            let prefix = spec.invert_meaning.as_deref().unwrap_or("no_");
            (FlagAction::StoreFalse, format!("{prefix}{key}"), false)
        }
        Some(_) => (FlagAction::Store, key.to_string(), false),
        None => (FlagAction::Store, key.to_string(), true),
    };

    FlagDecl {
        long: spec.name.clone().unwrap_or(long),
        short: spec.short.clone(),
        aliases: spec.alt.clone(),
        dest: key.to_string(),
        action,
        value_type: spec.value_type.clone(),
        nargs,
        default: spec.value.clone(),
        required,
        help: spec.help.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_invert_meaning_prefix() {
        let spec = ParamSpec::new(true)
            .with_help("use cache")
            .with_invert_meaning("disable_");
        let flag = project_param("cache", &spec);
        assert_eq!(flag.long, "disable_cache");
        assert_eq!(flag.dest, "cache");
        assert_eq!(flag.action, FlagAction::StoreFalse);
    }

    #[test]
    fn test_explicit_name_overrides_negation() {
        let spec = ParamSpec::new(true)
            .with_help("use cache")
            .with_invert_meaning("disable_")
            .with_name("skip-cache");
        let flag = project_param("cache", &spec);
        assert_eq!(flag.names(), vec!["--skip-cache"]);
        assert_eq!(flag.dest, "cache");
        assert_eq!(flag.action, FlagAction::StoreFalse);
    }

    #[test]
    fn test_required_without_default() {
        let flag = project_param("input", &ParamSpec::required().with_help("input"));
        assert!(flag.required);
        assert_eq!(flag.default, None);
        assert_eq!(flag.action, FlagAction::Store);
    }

    #[test]
    fn test_list_default_infers_nargs() {
        let flag = project_param("layers", &ParamSpec::new(json!([64, 32])).with_help("sizes"));
        assert_eq!(flag.nargs, Some(Nargs::OneOrMore));
        assert_eq!(flag.effective_type(), ValueType::Integer);

        let explicit = ParamSpec::new(json!([64, 32]))
            .with_help("sizes")
            .with_nargs(Nargs::Exact(2));
        assert_eq!(project_param("layers", &explicit).nargs, Some(Nargs::Exact(2)));
    }

    #[test]
    fn test_short_prepended_and_alt_appended() {
        let spec = ParamSpec::new(0.01)
            .with_help("learning rate")
            .with_short("l")
            .with_alt("learning_rate");
        let flag = project_param("lr", &spec);
        assert_eq!(flag.names(), vec!["-l", "--lr", "--learning_rate"]);
        assert_eq!(flag.default, Some(json!(0.01)));
    }

    #[test]
    fn test_null_default_is_optional_store() {
        let flag = project_param("resume", &ParamSpec::new(Value::Null).with_help("checkpoint"));
        assert!(!flag.required);
        assert_eq!(flag.action, FlagAction::Store);
        assert_eq!(flag.default, Some(Value::Null));
    }
}
