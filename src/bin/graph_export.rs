use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use directory_schema::loader::load_configured;
use directory_schema::{DirectorySchema, HierarchyGraph, SchemaConfig, SchemaObjectType};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-graph-export")]
#[command(about = "Export the object class or attribute type hierarchy to DOT/SVG format")]
struct Cli {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Schema file or directory to load (repeatable)
    #[arg(short, long)]
    schema: Vec<PathBuf>,

    /// Do not load the embedded core schema
    #[arg(long)]
    no_core: bool,

    /// Export attribute types instead of object classes
    #[arg(long)]
    attribute_types: bool,

    /// Output file (defaults to hierarchy.dot or hierarchy.svg)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: dot or svg
    #[arg(short, long, default_value = "dot")]
    format: String,
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

fn run(cli: Cli, mut config: SchemaConfig) -> anyhow::Result<()> {
    if cli.no_core {
        config.loader.include_core = false;
    }
    config.loader.paths = config.loader_paths();
    config.loader.paths.extend(cli.schema);

    let mut schema = DirectorySchema::with_policy(config.registry.forward_references);
    load_configured(&mut schema, &config.loader).context("Failed to load schemas")?;

    let kind = if cli.attribute_types {
        SchemaObjectType::AttributeType
    } else {
        SchemaObjectType::ObjectClass
    };
    let graph = HierarchyGraph::from_registry(schema.registry(kind));
    println!(
        "Hierarchy loaded: {} {} definitions, {} edges",
        graph.node_count(),
        kind,
        graph.edge_count()
    );

    let dot_content = graph.to_dot();

    match cli.format.as_str() {
        "dot" => {
            let output_path = cli.output.unwrap_or_else(|| PathBuf::from("hierarchy.dot"));
            std::fs::write(&output_path, &dot_content)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            println!("✅ Exported DOT to: {:?}", output_path);
        }
        "svg" => {
            let output_path = cli.output.unwrap_or_else(|| PathBuf::from("hierarchy.svg"));

            // Write DOT to a temp file, then let graphviz render it
            let temp_dot = output_path.with_extension("temp.dot");
            std::fs::write(&temp_dot, &dot_content)?;

            let output = std::process::Command::new("dot")
                .arg("-Tsvg")
                .arg(&temp_dot)
                .arg("-o")
                .arg(&output_path)
                .output()
                .context("Failed to run graphviz `dot`")?;

            let _ = std::fs::remove_file(&temp_dot);

            if !output.status.success() {
                anyhow::bail!(
                    "GraphViz conversion failed:\n{}",
                    String::from_utf8_lossy(&output.stderr)
                );
            }
            println!("✅ Exported SVG to: {:?}", output_path);
        }
        other => anyhow::bail!("Invalid format '{}'. Use 'dot' or 'svg'", other),
    }

    Ok(())
}
