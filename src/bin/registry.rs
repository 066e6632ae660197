//! Schema Registry CLI
//!
//! Loads the core schema plus any configured schema files and answers
//! resolution and hierarchy queries against them.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use directory_schema::loader::load_configured;
use directory_schema::{DirectorySchema, LoadReport, SchemaConfig, SchemaError, SchemaObjectType, SchemaRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-registry")]
#[command(about = "Query a hierarchical LDAP schema registry")]
struct Cli {
    /// Configuration file (must exist when given)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Schema file or directory to load (repeatable)
    #[arg(short, long, global = true)]
    schema: Vec<PathBuf>,

    /// Do not load the embedded core schema
    #[arg(long, global = true)]
    no_core: bool,

    /// Registry to query
    #[arg(short, long, value_enum, default_value = "object-class", global = true)]
    kind: Kind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    ObjectClass,
    AttributeType,
}

impl From<Kind> for SchemaObjectType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::ObjectClass => SchemaObjectType::ObjectClass,
            Kind::AttributeType => SchemaObjectType::AttributeType,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show registry sizes and the load fingerprint
    Stats,

    /// Resolve a name or OID to its canonical OID
    Resolve { name: String },

    /// Show a definition
    Show {
        name: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List everything inheriting from a definition
    Descendants { name: String },

    /// Fuzzy search over names and OIDs
    Search {
        query: String,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Report superiors that are referenced but not registered
    Check {
        /// Fail when any superior is still pending
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match SchemaConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let err = anyhow::Error::new(e).context("failed to load configuration");
            eprintln!("{}", failure_line(&err));
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    if let Err(e) = run(cli, config) {
        eprintln!("{}", failure_line(&e));
        std::process::exit(1);
    }
}

/// Single status line for a failed run, with the whole context chain
fn failure_line(err: &anyhow::Error) -> String {
    format!("❌ {:#}", err)
}

fn load(cli: &Cli, mut config: SchemaConfig) -> anyhow::Result<(DirectorySchema, LoadReport)> {
    if cli.no_core {
        config.loader.include_core = false;
    }
    config.loader.paths = config.loader_paths();
    config.loader.paths.extend(cli.schema.iter().cloned());

    let mut schema = DirectorySchema::with_policy(config.registry.forward_references);
    let report = load_configured(&mut schema, &config.loader).context("Failed to load schemas")?;
    Ok((schema, report))
}

/// Attach the closest names to a not-found error
fn did_you_mean(registry: &SchemaRegistry, name: &str, error: SchemaError) -> anyhow::Error {
    if !error.is_not_found() {
        return error.into();
    }
    let suggestions: Vec<String> = registry
        .search(name, 3)
        .into_iter()
        .map(|r| r.name)
        .collect();
    if suggestions.is_empty() {
        error.into()
    } else {
        anyhow::Error::new(error).context(format!("Did you mean: {}?", suggestions.join(", ")))
    }
}

fn run(cli: Cli, config: SchemaConfig) -> anyhow::Result<()> {
    let (schema, report) = load(&cli, config)?;
    let kind = SchemaObjectType::from(cli.kind);
    let registry = schema.registry(kind);

    match cli.command {
        Commands::Stats => {
            println!("📚 Directory schema");
            println!("  Files loaded:     {}", report.files);
            if !report.schemas.is_empty() {
                println!("  Schemas:          {}", report.schemas.join(", "));
            }
            println!("  Object classes:   {}", schema.object_classes().size());
            println!("  Attribute types:  {}", schema.attribute_types().size());
            println!("  Fingerprint:      {}", report.fingerprint);
            println!("  Loaded at:        {}", report.loaded_at.to_rfc3339());
        }

        Commands::Resolve { name } => {
            let oid = registry.resolve(&name).map_err(|e| did_you_mean(registry, &name, e))?;
            println!("{}", oid);
        }

        Commands::Show { name, json } => {
            let object = registry.lookup(&name).map_err(|e| did_you_mean(registry, &name, e))?;
            if json {
                println!("{}", serde_json::to_string_pretty(object.as_ref())?);
            } else {
                println!("{}", object);
                let count = registry.descendants(object.oid.as_str())?.count();
                println!("  {} descendant(s)", count);
            }
        }

        Commands::Descendants { name } => {
            let mut descendants: Vec<_> = registry
                .descendants(&name)
                .map_err(|e| did_you_mean(registry, &name, e))?
                .collect();
            descendants.sort_by(|a, b| a.oid.cmp(&b.oid));

            println!("🔍 {} descendant(s) of {}", descendants.len(), name);
            for object in descendants {
                println!("  {} {}", object.oid, object.name());
            }
        }

        Commands::Search { query, limit } => {
            let results = registry.search(&query, limit);
            if results.is_empty() {
                println!("No {} matches '{}'", kind, query);
            }
            for result in results {
                println!("  {:>4}  {:<40} {}", result.score, result.name, result.oid);
            }
        }

        Commands::Check { strict } => {
            let mut pending_total = 0;
            for kind in [SchemaObjectType::ObjectClass, SchemaObjectType::AttributeType] {
                let registry = schema.registry(kind);
                if !registry.verify_index() {
                    bail!("descendant index for {} is inconsistent", kind.section_name());
                }
                for (superior, waiting) in registry.pending_superiors() {
                    pending_total += 1;
                    println!("⚠️  {} {} is not registered, named by: {}", kind, superior, waiting.join(", "));
                }
            }

            if pending_total == 0 {
                println!("✅ All superiors are registered ({} definitions)", schema.size());
            } else if strict {
                bail!("{} superior(s) are referenced but not registered", pending_total);
            } else {
                println!("{} pending superior(s)", pending_total);
            }
        }
    }

    Ok(())
}
