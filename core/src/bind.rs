//! Binding flag declarations to [`clap`].
//!
//! [`build_command`] registers one [`Arg`] per [`FlagDecl`];
//! [`bag_from_matches`] reads the parsed values back into a
//! [`KeywordBag`] keyed by destination, ready for
//! [`compile_arguments`](crate::compile_arguments). Only values given on the
//! command line are copied into the bag; defaults are left to the schema.
//!
//! # Example
//!
//! ```
//! use param_schema_core::*;
//! use serde_json::json;
//!
//! let def = TypeDef::new("Trainer")
//!     .with_param("lr", ParamSpec::new(0.01).with_help("learning rate").with_short("l"))
//!     .with_param("shuffle", ParamSpec::new(true).with_help("shuffle samples"));
//! let flags = define_arguments(&def);
//!
//! let matches = build_command("train", &flags)
//!     .try_get_matches_from(["train", "-l", "0.5", "--no_shuffle"])
//!     .unwrap();
//! let mut bag = bag_from_matches(&flags, &matches);
//! assert_eq!(bag.get("lr"), Some(&json!(0.5)));
//!
//! let (resolved, _) = compile_arguments(&def, &mut bag, CompileOptions::default());
//! assert_eq!(resolved.get("shuffle"), Some(&json!(false)));
//! ```

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use serde_json::Value;

use crate::{FlagAction, FlagDecl, KeywordBag, Nargs, ValueType};

/// Builds a command with one argument per declaration.
///
/// Validate the type first; colliding flag names make clap panic.
pub fn build_command(name: impl Into<String>, decls: &[FlagDecl]) -> Command {
    decls
        .iter()
        .fold(Command::new(name.into()), |command, decl| command.arg(to_arg(decl)))
}

/// Converts a declaration into a clap argument with id `decl.dest`.
///
/// Declarations are expected to have passed [`validate_type`](crate::validate_type):
/// clap panics on duplicate flag names, and a `short` longer than one
/// character keeps only its first character.
pub fn to_arg(decl: &FlagDecl) -> Arg {
    debug_assert!(
        decl.short.as_ref().is_none_or(|s| s.chars().count() == 1),
        "short flag for {} must be a single character",
        decl.dest
    );
    let mut arg = Arg::new(decl.dest.clone())
        .long(decl.long.clone())
        .help(decl.help.clone());
    if let Some(short) = decl.short.as_deref().and_then(|s| s.chars().next()) {
        arg = arg.short(short);
    }
    if !decl.aliases.is_empty() {
        arg = arg.aliases(decl.aliases.clone());
    }

    match decl.action {
        FlagAction::StoreTrue => arg.action(ArgAction::SetTrue),
        FlagAction::StoreFalse => arg.action(ArgAction::SetFalse),
        FlagAction::Store => {
            arg = match decl.nargs {
                Some(Nargs::Exact(n)) => arg.num_args(n),
                Some(Nargs::Optional) => arg.num_args(0..=1),
                Some(Nargs::ZeroOrMore) => arg.num_args(0..),
                Some(Nargs::OneOrMore) => arg.num_args(1..),
                None => arg,
            };
            arg = if decl.is_multiple() {
                arg.action(ArgAction::Append)
            } else {
                arg.action(ArgAction::Set)
            };
            arg = with_value_parser(arg, &decl.effective_type());
            if decl.required {
                arg = arg.required(true);
            }
            match &decl.default {
                Some(Value::Array(items)) if !items.is_empty() => {
                    arg.default_values(items.iter().map(render_default))
                }
                Some(value) if is_scalar(value) => arg.default_value(render_default(value)),
                _ => arg,
            }
        }
    }
}

/// Reads values supplied on the command line into a keyword bag.
///
/// Flags that were not given (or only carry their default) are left out so
/// schema defaults apply during extraction.
pub fn bag_from_matches(decls: &[FlagDecl], matches: &ArgMatches) -> KeywordBag {
    let mut bag = KeywordBag::new();
    for decl in decls {
        let id = decl.dest.as_str();
        if matches.value_source(id) != Some(ValueSource::CommandLine) {
            continue;
        }
        let value = match decl.action {
            FlagAction::StoreTrue | FlagAction::StoreFalse => Some(Value::Bool(matches.get_flag(id))),
            FlagAction::Store => read_values(decl, matches),
        };
        if let Some(value) = value {
            bag.insert(id, value);
        }
    }
    bag
}

fn with_value_parser(arg: Arg, value_type: &ValueType) -> Arg {
    match value_type {
        ValueType::Bool => arg.value_parser(value_parser!(bool)),
        ValueType::Integer => arg.value_parser(value_parser!(i64)),
        ValueType::Float => arg.value_parser(value_parser!(f64)),
        ValueType::Choice(choices) => arg.value_parser(choices.clone()),
        _ => arg.value_parser(value_parser!(String)),
    }
}

fn read_values(decl: &FlagDecl, matches: &ArgMatches) -> Option<Value> {
    let id = decl.dest.as_str();
    let values = match decl.effective_type() {
        ValueType::Bool => collect::<bool>(matches, id),
        ValueType::Integer => collect::<i64>(matches, id),
        ValueType::Float => collect::<f64>(matches, id),
        _ => collect::<String>(matches, id),
    }?;

    if decl.is_multiple() {
        Some(Value::Array(values))
    } else {
        values.into_iter().next()
    }
}

fn collect<T>(matches: &ArgMatches, id: &str) -> Option<Vec<Value>>
where
    T: Clone + Send + Sync + 'static + Into<Value>,
{
    matches
        .try_get_many::<T>(id)
        .ok()
        .flatten()
        .map(|values| values.cloned().map(Into::into).collect())
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

fn render_default(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{ParamSpec, TypeDef, define_arguments};

    fn flags() -> Vec<FlagDecl> {
        let def = TypeDef::new("T")
            .with_param(
                "layers",
                ParamSpec::new(json!([64, 32])).with_help("layer sizes"),
            )
            .with_param(
                "optimizer",
                ParamSpec::new("adam")
                    .with_help("optimizer")
                    .with_type(ValueType::Choice(vec!["adam".into(), "sgd".into()])),
            )
            .with_param("input", ParamSpec::required().with_help("input file").with_alt("in"))
            .with_param("verbose", ParamSpec::new(false).with_help("verbose"));
        define_arguments(&def)
    }

    #[test]
    fn test_list_values_collected() {
        let flags = flags();
        let matches = build_command("t", &flags)
            .try_get_matches_from(["t", "--input", "a.csv", "--layers", "8", "4", "2"])
            .unwrap();
        let bag = bag_from_matches(&flags, &matches);
        assert_eq!(bag.get("layers"), Some(&json!([8, 4, 2])));
        assert_eq!(bag.get("input"), Some(&json!("a.csv")));
        assert!(!bag.contains_key("verbose"));
        assert!(!bag.contains_key("optimizer"));
    }

    #[test]
    fn test_alias_and_flag() {
        let flags = flags();
        let matches = build_command("t", &flags)
            .try_get_matches_from(["t", "--in", "b.csv", "--verbose"])
            .unwrap();
        let bag = bag_from_matches(&flags, &matches);
        assert_eq!(bag.get("input"), Some(&json!("b.csv")));
        assert_eq!(bag.get("verbose"), Some(&json!(true)));
    }

    #[test]
    fn test_required_flag_enforced() {
        let flags = flags();
        let result = build_command("t", &flags).try_get_matches_from(["t"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_choice_rejects_unknown_value() {
        let flags = flags();
        let result = build_command("t", &flags).try_get_matches_from([
            "t",
            "--input",
            "x",
            "--optimizer",
            "rmsprop",
        ]);
        assert!(result.is_err());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "single character")]
    fn test_multi_character_short_is_rejected() {
        let def = TypeDef::new("T")
            .with_param("lr", ParamSpec::new(0.1).with_help("learning rate").with_short("lr"));
        let _ = to_arg(&define_arguments(&def)[0]);
    }
}
