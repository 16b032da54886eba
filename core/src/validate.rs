//! Type definition validation.
//!
//! Catches structural problems in a [`TypeDef`] before they reach a CLI
//! binding: empty names, malformed flag spellings, and documented parameters
//! that would project onto the same flag.
//!
//! # Examples
//!
//! ```
//! use param_schema_core::*;
//!
//! let def = TypeDef::new("Trainer")
//!     .with_param("lr", ParamSpec::new(0.01).with_help("learning rate").with_short("l"));
//! assert!(validate_type(&def).is_empty());
//!
//! // Invalid: short flag longer than one character
//! let bad = TypeDef::new("Trainer")
//!     .with_param("lr", ParamSpec::new(0.01).with_help("learning rate").with_short("lr"));
//! assert!(!validate_type(&bad).is_empty());
//! ```

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use crate::{FlagDecl, TypeDef, define_arguments};

/// Flag spellings reserved by the generated help.
const RESERVED_LONG: &str = "help";
const RESERVED_SHORT: &str = "h";

/// Type definition validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Type name is empty or whitespace-only.
    #[error("type name cannot be empty")]
    EmptyTypeName,
    /// A parameter key is empty or whitespace-only.
    #[error("parameter key cannot be empty in type: {0}")]
    EmptyKey(String),
    /// Short flag is not a single character other than `-`.
    #[error("invalid short flag for parameter {key}: {short}")]
    InvalidShortFlag { key: String, short: String },
    /// A long flag spelling is empty or starts with a dash.
    #[error("invalid long flag for parameter {key}: {name}")]
    InvalidLongFlag { key: String, name: String },
    /// Two documented parameters project onto the same flag spelling.
    #[error("duplicate flag: {0}")]
    DuplicateFlag(String),
    /// `invert_meaning` declared on a parameter that does not default to
    /// `true`.
    #[error("invert_meaning has no effect on parameter {0}: default is not true")]
    UnusedInvertMeaning(String),
}

/// Validates a type definition together with its parents.
///
/// Own-table checks run for every type in the lineage; flag collisions are
/// checked on the merged projection. Returns at the first problem found.
pub fn validate_type(def: &TypeDef) -> Vec<ValidationError> {
    let mut errors = validate_tables(def);
    if !errors.is_empty() {
        return errors;
    }
    errors.extend(validate_flags(&define_arguments(def)));
    errors
}

fn validate_tables(def: &TypeDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for parent in def.parents() {
        errors.extend(validate_tables(parent));
        if !errors.is_empty() {
            return errors;
        }
    }

    if def.name().trim().is_empty() {
        errors.push(ValidationError::EmptyTypeName);
        return errors;
    }

    for (key, entry) in def.schema() {
        if key.trim().is_empty() {
            errors.push(ValidationError::EmptyKey(def.name().to_string()));
            return errors;
        }
        let Some(spec) = entry.spec() else {
            continue;
        };
        if spec.invert_meaning.is_some() && spec.value != Some(Value::Bool(true)) {
            errors.push(ValidationError::UnusedInvertMeaning(key.clone()));
            return errors;
        }
        if !spec.is_documented() {
            continue;
        }
        if let Some(short) = &spec.short {
            if short.chars().count() != 1 || short == "-" {
                errors.push(ValidationError::InvalidShortFlag {
                    key: key.clone(),
                    short: short.clone(),
                });
                return errors;
            }
        }
    }

    errors
}

fn validate_flags(flags: &[FlagDecl]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(format!("--{RESERVED_LONG}"));
    seen.insert(format!("-{RESERVED_SHORT}"));

    for flag in flags {
        for name in std::iter::once(&flag.long).chain(&flag.aliases) {
            if name.trim().is_empty() || name.starts_with('-') {
                errors.push(ValidationError::InvalidLongFlag {
                    key: flag.dest.clone(),
                    name: name.clone(),
                });
                return errors;
            }
        }
        for name in flag.names() {
            if !seen.insert(name.clone()) {
                errors.push(ValidationError::DuplicateFlag(name));
                return errors;
            }
        }
    }

    errors
}
