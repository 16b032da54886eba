//! Parameter specification types.
//!
//! A type declares its parameters as an ordered table of [`SchemaEntry`]
//! values. An entry is either a bare default value or a full
//! [`ParamSpec`] carrying help text and CLI hints. The types are designed for
//! serialization with [`serde`] so schema tables can be written in YAML or
//! JSON documents.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Value type hint for a parameter.
///
/// Hints are only consumed by the CLI-binding layer; extraction never
/// coerces values.
///
/// # Examples
///
/// ```
/// use param_schema_core::ValueType;
/// use serde_json::json;
///
/// assert_eq!(ValueType::default(), ValueType::Any);
/// assert_eq!(ValueType::infer(&json!(3)), ValueType::Integer);
/// assert_eq!(ValueType::infer(&json!([0.5, 1.5])), ValueType::Float);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Boolean value.
    Bool,
    /// String value.
    String,
    /// Whole number.
    Integer,
    /// Floating point number.
    Float,
    /// File path.
    File,
    /// Directory path.
    Directory,
    /// URL.
    Url,
    /// One of specific choices (e.g., `optimizer: adam|sgd`).
    Choice(Vec<String>),
    /// Unknown/any type (the default).
    #[default]
    Any,
}

impl ValueType {
    /// Infers a value type from a default value.
    ///
    /// Lists report the type of their first element; mappings, nulls and
    /// empty lists report [`ValueType::Any`].
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Float,
            Value::String(_) => Self::String,
            Value::Array(items) => items.first().map(Self::infer).unwrap_or_default(),
            Value::Null | Value::Object(_) => Self::Any,
        }
    }
}

/// Arity hint for a parameter on the command line.
///
/// Serialized the way argument parsers spell it: a count, or one of `?`,
/// `*`, `+`.
///
/// # Examples
///
/// ```
/// use param_schema_core::Nargs;
///
/// let nargs: Nargs = serde_json::from_str("\"+\"").unwrap();
/// assert_eq!(nargs, Nargs::OneOrMore);
/// assert_eq!(serde_json::from_str::<Nargs>("2").unwrap(), Nargs::Exact(2));
/// assert!(nargs.is_multiple());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NargsRepr", into = "NargsRepr")]
pub enum Nargs {
    /// Exactly this many values.
    Exact(usize),
    /// Zero or one value (`?`).
    Optional,
    /// Any number of values (`*`).
    ZeroOrMore,
    /// At least one value (`+`).
    OneOrMore,
}

impl Nargs {
    /// Returns `true` if the parameter collects a list of values.
    pub fn is_multiple(&self) -> bool {
        match self {
            Self::Exact(n) => *n > 1,
            Self::Optional => false,
            Self::ZeroOrMore | Self::OneOrMore => true,
        }
    }
}

impl fmt::Display for Nargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Optional => f.write_str("?"),
            Self::ZeroOrMore => f.write_str("*"),
            Self::OneOrMore => f.write_str("+"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum NargsRepr {
    Count(usize),
    Symbol(String),
}

impl TryFrom<NargsRepr> for Nargs {
    type Error = String;

    fn try_from(repr: NargsRepr) -> Result<Self, Self::Error> {
        match repr {
            NargsRepr::Count(n) => Ok(Self::Exact(n)),
            NargsRepr::Symbol(s) => match s.as_str() {
                "?" => Ok(Self::Optional),
                "*" => Ok(Self::ZeroOrMore),
                "+" => Ok(Self::OneOrMore),
                other => other
                    .parse()
                    .map(Self::Exact)
                    .map_err(|_| format!("invalid nargs: {other}")),
            },
        }
    }
}

impl From<Nargs> for NargsRepr {
    fn from(nargs: Nargs) -> Self {
        match nargs {
            Nargs::Exact(n) => Self::Count(n),
            other => Self::Symbol(other.to_string()),
        }
    }
}

/// Full specification of a declared parameter.
///
/// A spec without a `value` is **required**. A spec with `help` is
/// **documented** and is exposed on the CLI surface and in generated docs.
///
/// Use [`ParamSpec::new`] for a defaulted parameter or
/// [`ParamSpec::required`] for one without a default, then chain builder
/// methods.
///
/// # Examples
///
/// ```
/// use param_schema_core::{ParamSpec, ValueType};
///
/// let lr = ParamSpec::new(0.01)
///     .with_help("learning rate")
///     .with_short("l");
/// assert!(lr.is_documented());
/// assert!(!lr.is_required());
///
/// let epochs = ParamSpec::required()
///     .with_help("number of epochs")
///     .with_type(ValueType::Integer);
/// assert!(epochs.is_required());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Default value. `None` marks the parameter required; `Some(Null)` is a
    /// present default of "absent".
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Value type hint.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    /// Arity hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nargs: Option<Nargs>,
    /// Single-character short flag, without the dash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    /// Additional long flag spellings, without dashes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt: Vec<String>,
    /// Visible long flag name replacing the key (and any negation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Prefix for the negated flag of a parameter defaulting to `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invert_meaning: Option<String>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ParamSpec {
    /// Creates a spec with a default value.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Creates a spec without a default (a required parameter).
    pub fn required() -> Self {
        Self::default()
    }

    /// Adds help text, making the parameter documented.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Sets the value type hint.
    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Sets the arity hint.
    pub fn with_nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    /// Sets the short flag (without dash).
    pub fn with_short(mut self, short: &str) -> Self {
        self.short = Some(short.to_string());
        self
    }

    /// Adds an alternate long flag spelling (without dashes).
    pub fn with_alt(mut self, alt: &str) -> Self {
        self.alt.push(alt.to_string());
        self
    }

    /// Sets an explicit visible flag name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the negation prefix used for boolean parameters defaulting to
    /// `true`.
    pub fn with_invert_meaning(mut self, prefix: &str) -> Self {
        self.invert_meaning = Some(prefix.to_string());
        self
    }

    /// Returns `true` if no default value is declared.
    pub fn is_required(&self) -> bool {
        self.value.is_none()
    }

    /// Returns `true` if help text is declared.
    pub fn is_documented(&self) -> bool {
        self.help.is_some()
    }
}

/// A single entry in a type's schema table.
///
/// Any mapping is read as a [`ParamSpec`] (unknown keys are ignored, a
/// mapping without `value` is required); every other value is a bare
/// default.
///
/// # Examples
///
/// ```
/// use param_schema_core::SchemaEntry;
/// use serde_json::json;
///
/// let raw: SchemaEntry = serde_json::from_value(json!(42)).unwrap();
/// assert_eq!(raw.default_value(), Some(&json!(42)));
///
/// let spec: SchemaEntry = serde_json::from_value(json!({"help": "input path"})).unwrap();
/// assert!(spec.is_required());
/// assert!(spec.is_documented());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaEntry {
    /// Bare default value with no help text.
    Default(Value),
    /// Full parameter specification.
    Spec(ParamSpec),
}

impl SchemaEntry {
    /// Returns the declared default, unwrapping `{value: X}` into `X`.
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Self::Default(value) => Some(value),
            Self::Spec(spec) => spec.value.as_ref(),
        }
    }

    /// Returns the specification if this entry is one.
    pub fn spec(&self) -> Option<&ParamSpec> {
        match self {
            Self::Default(_) => None,
            Self::Spec(spec) => Some(spec),
        }
    }

    /// Returns `true` for a specification without a default.
    pub fn is_required(&self) -> bool {
        self.spec().is_some_and(ParamSpec::is_required)
    }

    /// Returns `true` for a specification with help text.
    pub fn is_documented(&self) -> bool {
        self.spec().is_some_and(ParamSpec::is_documented)
    }
}

impl<'de> Deserialize<'de> for SchemaEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        match raw {
            Value::Object(_) => serde_json::from_value(raw)
                .map(Self::Spec)
                .map_err(serde::de::Error::custom),
            other => Ok(Self::Default(other)),
        }
    }
}

impl From<ParamSpec> for SchemaEntry {
    fn from(spec: ParamSpec) -> Self {
        Self::Spec(spec)
    }
}

/// Ordered mapping from parameter key to entry, as declared on one type.
pub type TypeSchema = IndexMap<String, SchemaEntry>;
