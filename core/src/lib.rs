//! Hierarchical parameter schemas and keyword-argument resolution.
//!
//! Types declare a table of named parameters (defaults, help text, CLI
//! hints) and a list of parent types. This crate merges those tables along
//! the parent graph and uses the result to:
//!
//! - pull recognized keys out of a [`KeywordBag`] ([`compile_arguments`]),
//!   leaving unrelated keywords in a leftover bag;
//! - project documented parameters onto command-line flag declarations
//!   ([`define_arguments`]), optionally bound to `clap` ([`build_command`]);
//! - render parameter documentation lines ([`defaults_info`]).
//!
//! It also provides [`counter`], an odometer-order enumeration of integer
//! coordinates inside a box.
//!
//! Validation ([`validate_type`]) catches empty names, malformed flag
//! spellings and flag collisions before they reach a parser.
//!
//! # Example
//!
//! ```
//! use param_schema_core::*;
//! use serde_json::json;
//!
//! let model = TypeDef::new("Model")
//!     .with_default("seed", 42)
//!     .with_param("lr", ParamSpec::new(0.01).with_help("learning rate").with_short("l"))
//!     .into_shared();
//! let trainer = TypeDef::new("Trainer")
//!     .with_parent(model)
//!     .with_param("epochs", ParamSpec::required().with_help("number of epochs"));
//!
//! let mut bag: KeywordBag = [("epochs", json!(5)), ("device", json!("cpu"))].into_iter().collect();
//! let options = CompileOptions::default().transitive();
//! let (resolved, leftover) = compile_arguments(&trainer, &mut bag, options);
//!
//! assert_eq!(resolved.get("epochs"), Some(&json!(5)));
//! assert_eq!(resolved.get("lr"), Some(&json!(0.01)));
//! assert_eq!(leftover.keys().collect::<Vec<_>>(), vec!["device"]);
//!
//! let flags = define_arguments(&trainer);
//! assert_eq!(flags[0].names(), vec!["-l", "--lr"]);
//! assert!(flags[1].required);
//! assert!(validate_type(&trainer).is_empty());
//! ```

#[cfg(feature = "clap")]
mod bind;
mod compile;
mod counter;
mod docs;
mod extract;
mod merge;
mod project;
mod schema;
mod types;
mod validate;

#[cfg(feature = "clap")]
pub use bind::{bag_from_matches, build_command, to_arg};
pub use compile::{CompileOptions, CustomExtractor, ResolvedOptions, compile_arguments};
pub use counter::{Odometer, counter};
pub use docs::{defaults_info, parameters_section, render_value};
pub use extract::{KeywordBag, extract_key};
pub use merge::{MergedSchema, collect_parameters, merge_defaults};
pub use project::{FlagAction, FlagDecl, define_arguments, project_param};
pub use schema::TypeDef;
pub use serde_json::Value;
pub use types::*;
pub use validate::{ValidationError, validate_type};
