//! Parameter documentation rendering.
//!
//! Produces the option list describing a type's own parameter table, for an
//! offline documentation step. Nothing here touches live objects.

use serde_json::Value;

use crate::{SchemaEntry, TypeDef};

const SECTION_HEADER: &str = "kw : dict containing the following options.";

/// Renders one line per parameter in the type's own table, in declaration
/// order.
///
/// # Examples
///
/// ```
/// use param_schema_core::*;
///
/// let def = TypeDef::new("Trainer")
///     .with_param("lr", ParamSpec::new(0.01).with_help("learning rate"))
///     .with_param("input", ParamSpec::required().with_help("input file"))
///     .with_default("seed", 42);
///
/// assert_eq!(
///     defaults_info(&def),
///     vec![
///         "- lr [default: 0.01] learning rate",
///         "- input input file",
///         "- seed [default: 42]",
///     ]
/// );
/// ```
pub fn defaults_info(def: &TypeDef) -> Vec<String> {
    def.schema()
        .iter()
        .map(|(key, entry)| describe_entry(key, entry))
        .collect()
}

/// Renders a parameters section: a header line followed by the indented
/// option lines from [`defaults_info`].
///
/// Returns `None` when the type declares no parameters.
pub fn parameters_section(def: &TypeDef, indent: usize) -> Option<String> {
    let lines = defaults_info(def);
    if lines.is_empty() {
        return None;
    }
    let pad = " ".repeat(indent);
    let mut section = format!("{pad}{SECTION_HEADER}\n");
    for line in lines {
        section.push_str(&format!("{pad}    {line}\n"));
    }
    Some(section)
}

fn describe_entry(key: &str, entry: &SchemaEntry) -> String {
    let help = entry.spec().and_then(|spec| spec.help.as_deref());
    match (entry.default_value(), help) {
        (Some(value), Some(help)) => format!("- {key} [default: {}] {help}", render_value(value)),
        (Some(value), None) => format!("- {key} [default: {}]", render_value(value)),
        (None, Some(help)) => format!("- {key} {help}"),
        (None, None) => format!("- {key}"),
    }
}

/// Renders a default for display: strings unquoted, everything else as
/// compact JSON, with angle brackets stripped.
pub fn render_value(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    rendered.replace(['<', '>'], "")
}
