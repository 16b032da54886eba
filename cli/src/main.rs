use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use param_schema_core::{
    CompileOptions, FlagDecl, KeywordBag, ResolvedOptions, TypeDef, Value, bag_from_matches,
    build_command, compile_arguments, counter, define_arguments, parameters_section, render_value,
    validate_type,
};
use param_schema_registry::{DEFAULT_CONFIG_FILE, RegistryConfig, SchemaRegistry};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// CLI output format.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "param-schema")]
#[command(about = "Inspect hierarchical parameter schemas and resolve options")]
#[command(version)]
struct Cli {
    /// Schema document file or directory (overrides the configuration file).
    #[arg(long, global = true)]
    schemas: Option<PathBuf>,
    /// Registry configuration file (default: ./.param-schema.yml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List declared types.
    List(ListArgs),
    /// Validate every declared type.
    Validate,
    /// Show the command-line flags projected from a type.
    Flags(TypeArgs),
    /// Render the documented options of a type.
    Docs(DocsArgs),
    /// Resolve options for a type from key=value assignments.
    Resolve(ResolveArgs),
    /// Parse command-line style arguments against a type's flags.
    Parse(ParseArgs),
    /// Enumerate integer coordinates inside a box in odometer order.
    Count(CountArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Include types hidden by the configuration's exclude list.
    #[arg(long)]
    all: bool,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct TypeArgs {
    /// Type name.
    type_name: String,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct DocsArgs {
    /// Type name.
    type_name: String,
    /// Indentation applied to every rendered line.
    #[arg(long, default_value_t = 0)]
    indent: usize,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Type name.
    type_name: String,
    /// Keyword assignment `key=value`; values are read as JSON, falling back
    /// to a plain string.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    assignments: Vec<String>,
    /// Resolve parameters declared by ancestor types as well.
    #[arg(long)]
    transitive: bool,
    /// Bypass the type's custom extraction hook.
    #[arg(long)]
    override_static: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Type name.
    type_name: String,
    /// Resolve parameters declared by ancestor types as well.
    #[arg(long)]
    transitive: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Arguments parsed against the projected flags (after `--`).
    #[arg(last = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct CountArgs {
    /// Extent of each dimension.
    #[arg(required = true)]
    dims: Vec<usize>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

/// Result of resolving options for one type.
#[derive(Debug, Serialize)]
struct Resolution {
    resolved: ResolvedOptions,
    leftover: KeywordBag,
    missing: Vec<String>,
}

/// One row of `list` output.
#[derive(Debug, Serialize)]
struct TypeSummary {
    name: String,
    parents: Vec<String>,
    params: usize,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let source = SchemaSource {
        schemas: cli.schemas,
        config: cli.config,
    };
    let result = match cli.command {
        Command::List(args) => run_list(&source, args),
        Command::Validate => run_validate(&source),
        Command::Flags(args) => run_flags(&source, args),
        Command::Docs(args) => run_docs(&source, args),
        Command::Resolve(args) => run_resolve(&source, args),
        Command::Parse(args) => run_parse(&source, args),
        Command::Count(args) => run_count(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Installs the log subscriber on stderr so stdout stays machine-readable.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Where the registry comes from: `--schemas`, then `--config`, then the
/// default configuration file in the working directory.
struct SchemaSource {
    schemas: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl SchemaSource {
    fn open(&self) -> Result<(SchemaRegistry, Option<RegistryConfig>), String> {
        if let Some(path) = &self.schemas {
            debug!(path = %path.display(), "Loading schemas from path");
            let loaded = if path.is_dir() {
                SchemaRegistry::from_dir(path)
            } else {
                SchemaRegistry::from_file(path)
            };
            let registry = loaded.map_err(|err| {
                format!("Failed to load schemas from '{}': {err}", path.display())
            })?;
            return Ok((registry, None));
        }

        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if !config_path.exists() {
            return Err(format!(
                "No schema source: pass --schemas or --config, or create {DEFAULT_CONFIG_FILE}"
            ));
        }
        let config = RegistryConfig::load(&config_path)
            .map_err(|err| format!("Failed to read '{}': {err}", config_path.display()))?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let registry = config
            .open_registry(base_dir)
            .map_err(|err| format!("Failed to load schemas: {err}"))?;
        info!(config = %config_path.display(), types = registry.len(), "Opened registry");
        Ok((registry, Some(config)))
    }

    fn open_type(&self, name: &str) -> Result<Arc<TypeDef>, String> {
        let (registry, _) = self.open()?;
        registry
            .get(name)
            .cloned()
            .ok_or_else(|| format!("Unknown type '{name}'"))
    }
}

fn run_list(source: &SchemaSource, args: ListArgs) -> Result<(), String> {
    let (registry, config) = source.open()?;
    let summaries: Vec<TypeSummary> = registry
        .iter()
        .filter(|def| {
            args.all
                || !config
                    .as_ref()
                    .is_some_and(|config| config.is_excluded(def.name()))
        })
        .map(|def| TypeSummary {
            name: def.name().to_string(),
            parents: def.parents().iter().map(|p| p.name().to_string()).collect(),
            params: def.schema().len(),
        })
        .collect();

    match args.format {
        CliOutputFormat::Table => {
            for summary in &summaries {
                let parents = if summary.parents.is_empty() {
                    "-".to_string()
                } else {
                    summary.parents.join(",")
                };
                println!("{}\t{}\t{}", summary.name, parents, summary.params);
            }
            Ok(())
        }
        format => print_structured(&summaries, format),
    }
}

fn run_validate(source: &SchemaSource) -> Result<(), String> {
    let (registry, _) = source.open()?;
    let issues = registry.validate();
    if issues.is_empty() {
        println!("Validated {} type(s)", registry.len());
        return Ok(());
    }
    for (type_name, issue) in &issues {
        eprintln!("{type_name}: {issue}");
    }
    Err(format!("{} validation issue(s)", issues.len()))
}

fn run_flags(source: &SchemaSource, args: TypeArgs) -> Result<(), String> {
    let def = source.open_type(&args.type_name)?;
    let flags = define_arguments(&def);
    match args.format {
        CliOutputFormat::Table => {
            for flag in &flags {
                println!("{}", flag_row(flag));
            }
            Ok(())
        }
        format => print_structured(&flags, format),
    }
}

fn run_docs(source: &SchemaSource, args: DocsArgs) -> Result<(), String> {
    let def = source.open_type(&args.type_name)?;
    if let Some(section) = parameters_section(&def, args.indent) {
        print!("{section}");
    }
    Ok(())
}

fn run_resolve(source: &SchemaSource, args: ResolveArgs) -> Result<(), String> {
    let def = source.open_type(&args.type_name)?;
    let mut bag = parse_assignments(&args.assignments)?;
    let options = CompileOptions {
        transitive: args.transitive,
        override_static: args.override_static,
        ..CompileOptions::default()
    };
    let (resolved, leftover) = compile_arguments(&def, &mut bag, options);
    print_resolution(resolution(resolved, leftover), args.format)
}

fn run_parse(source: &SchemaSource, args: ParseArgs) -> Result<(), String> {
    let def = source.open_type(&args.type_name)?;
    let issues = validate_type(&def);
    if !issues.is_empty() {
        let issues: Vec<String> = issues.iter().map(ToString::to_string).collect();
        return Err(format!(
            "Type '{}' cannot be parsed: {}",
            def.name(),
            issues.join("; ")
        ));
    }
    let flags = define_arguments(&def);
    let command = build_command(def.name().to_string(), &flags);
    let matches = match command
        .try_get_matches_from(std::iter::once(def.name().to_string()).chain(args.args))
    {
        Ok(matches) => matches,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string().trim_end().to_string()),
    };

    let mut bag = bag_from_matches(&flags, &matches);
    debug!(keys = bag.len(), "Parsed arguments");
    let options = CompileOptions {
        transitive: args.transitive,
        ..CompileOptions::default()
    };
    let (resolved, leftover) = compile_arguments(&def, &mut bag, options);
    print_resolution(resolution(resolved, leftover), args.format)
}

fn run_count(args: CountArgs) -> Result<(), String> {
    let coords = counter(&args.dims);
    match args.format {
        CliOutputFormat::Table => {
            let mut out = std::io::stdout().lock();
            for coord in coords {
                let line: Vec<String> = coord.iter().map(usize::to_string).collect();
                writeln!(out, "{}", line.join(" ")).map_err(|e| e.to_string())?;
            }
            Ok(())
        }
        format => print_structured(&coords.collect::<Vec<_>>(), format),
    }
}

fn resolution(resolved: ResolvedOptions, leftover: KeywordBag) -> Resolution {
    let missing = resolved.missing().into_iter().map(str::to_string).collect();
    Resolution {
        resolved,
        leftover,
        missing,
    }
}

fn print_resolution(resolution: Resolution, format: CliOutputFormat) -> Result<(), String> {
    match format {
        CliOutputFormat::Table => {
            for (key, value) in resolution.resolved.iter() {
                let marker = if value.is_null() { " (missing)" } else { "" };
                println!("{key} = {}{marker}", render_value(value));
            }
            for (key, value) in resolution.leftover.iter() {
                println!("{key} = {} (unused)", render_value(value));
            }
            Ok(())
        }
        format => print_structured(&resolution, format),
    }
}

fn print_structured<T: Serialize + ?Sized>(
    value: &T,
    format: CliOutputFormat,
) -> Result<(), String> {
    let rendered = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string())?,
        CliOutputFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string())?,
        CliOutputFormat::Table => return Err("Table output is not supported here".to_string()),
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn flag_row(flag: &FlagDecl) -> String {
    let default = match &flag.default {
        Some(value) => format!("[default: {}]", render_value(value)),
        None if flag.required => "[required]".to_string(),
        None => String::new(),
    };
    let mut columns = vec![flag.names().join(", ")];
    if !default.is_empty() {
        columns.push(default);
    }
    if !flag.help.is_empty() {
        columns.push(flag.help.clone());
    }
    columns.join("  ")
}

/// Parses `key=value` assignments into a keyword bag.
fn parse_assignments(raw: &[String]) -> Result<KeywordBag, String> {
    let mut bag = KeywordBag::new();
    for assignment in raw {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("Invalid assignment '{assignment}': expected KEY=VALUE"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Invalid assignment '{assignment}': empty key"));
        }
        bag.insert(key, parse_value(value));
    }
    Ok(bag)
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use param_schema_core::{FlagAction, ParamSpec};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_assignments_reads_json_then_strings() {
        let bag = parse_assignments(&[
            "lr=0.5".to_string(),
            "name=run-1".to_string(),
            "layers=[1,2]".to_string(),
            "flag=true".to_string(),
        ])
        .unwrap();
        assert_eq!(bag.get("lr"), Some(&json!(0.5)));
        assert_eq!(bag.get("name"), Some(&json!("run-1")));
        assert_eq!(bag.get("layers"), Some(&json!([1, 2])));
        assert_eq!(bag.get("flag"), Some(&json!(true)));
    }

    #[test]
    fn test_parse_assignments_rejects_missing_equals() {
        assert!(parse_assignments(&["lr".to_string()]).is_err());
        assert!(parse_assignments(&["=1".to_string()]).is_err());
    }

    #[test]
    fn test_flag_row_formats_default_and_help() {
        let def = TypeDef::new("T")
            .with_param("lr", ParamSpec::new(0.1).with_help("learning rate").with_short("l"));
        let flags = define_arguments(&def);
        assert_eq!(flags[0].action, FlagAction::Store);
        assert_eq!(flag_row(&flags[0]), "-l, --lr  [default: 0.1]  learning rate");
    }

    #[test]
    fn test_resolution_lists_missing_keys() {
        let def = TypeDef::new("T").with_param("epochs", ParamSpec::required().with_help("n"));
        let mut bag = KeywordBag::new();
        let (resolved, leftover) = compile_arguments(&def, &mut bag, CompileOptions::default());
        let resolution = resolution(resolved, leftover);
        assert_eq!(resolution.missing, vec!["epochs"]);
        assert_eq!(
            serde_json::to_value(&resolution).unwrap(),
            json!({"resolved": {"epochs": null}, "leftover": {}, "missing": ["epochs"]})
        );
    }
}
