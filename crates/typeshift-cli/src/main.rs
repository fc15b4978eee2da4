use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use typeshift_core::config::{self, CONFIG_FILE_NAME, OutputFormat, TypeshiftConfig};
use typeshift_core::export;
use typeshift_core::import::{Dialect, ImportDispatcher, Imported};
use typeshift_core::model::Specification;
use typeshift_core::naming::{DigestNaming, NamingService};
use typeshift_core::resolve::FileFetcher;

#[derive(Parser)]
#[command(name = "typeshift", about = "API and schema dialect converter", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a document and print the internal specification
    Import {
        #[command(flatten)]
        source: Source,

        /// Output format
        #[arg(long)]
        format: Option<Format>,
    },

    /// Import a document and export it as TypeAPI
    Export {
        #[command(flatten)]
        source: Source,

        /// Output format
        #[arg(long)]
        format: Option<Format>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize the types and operations of a document
    Inspect {
        #[command(flatten)]
        source: Source,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: Format,
    },

    /// Import a document and report dropped entries and dangling references
    Validate {
        #[command(flatten)]
        source: Source,
    },

    /// Print the synthesized-name hash of a text
    Hash {
        /// Text to hash
        text: String,
    },

    /// Initialize a new typeshift configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct Source {
    /// Path to the input document (defaults to `input` from the config)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Dialect tag, e.g. `openapi-yaml` (guessed from the file name when omitted)
    #[arg(short, long)]
    dialect: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Yaml,
    Json,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Format::Json,
            OutputFormat::Yaml => Format::Yaml,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Import { source, format } => cmd_import(source, format).await,

        Commands::Export {
            source,
            format,
            output,
        } => cmd_export(source, format, output).await,

        Commands::Inspect { source, format } => cmd_inspect(source, format).await,

        Commands::Validate { source } => cmd_validate(source).await,

        Commands::Hash { text } => cmd_hash(&text),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "typeshift", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<TypeshiftConfig> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    let config = config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))?;
    Ok(config.unwrap_or_default())
}

/// Pick the dialect: explicit tag, then config, then a guess from the file name.
fn resolve_dialect(source: &Source, path: &Path, cfg: &TypeshiftConfig) -> Result<String> {
    if let Some(tag) = &source.dialect {
        return Ok(tag.clone());
    }
    cfg.dialect
        .or_else(|| Dialect::from_path(path))
        .map(|dialect| dialect.as_str().to_string())
        .with_context(|| {
            format!(
                "cannot guess the dialect of {}, pass --dialect",
                path.display()
            )
        })
}

async fn load_spec(source: &Source, cfg: &TypeshiftConfig) -> Result<Imported> {
    let path = source
        .input
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.input));
    let content =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let tag = resolve_dialect(source, &path, cfg)?;

    log::info!("importing {} as {tag}", path.display());
    let dispatcher = ImportDispatcher::with_sources(Arc::new(FileFetcher), None, cfg.import_options());
    let imported = dispatcher
        .import(&tag, &content)
        .await
        .with_context(|| format!("failed to import {}", path.display()))?;

    for diagnostic in &imported.diagnostics {
        eprintln!("  dropped {}: {}", diagnostic.entry, diagnostic.error);
    }
    Ok(imported)
}

fn render(value: &serde_json::Value, format: Format) -> Result<String> {
    Ok(match format {
        Format::Yaml => serde_yaml_ng::to_string(value)?,
        Format::Json => serde_json::to_string_pretty(value)? + "\n",
    })
}

async fn cmd_import(source: Source, format: Option<Format>) -> Result<()> {
    let cfg = try_load_config()?;
    let imported = load_spec(&source, &cfg).await?;
    let format = format.unwrap_or_else(|| cfg.format.into());

    let value = serde_json::to_value(&imported.spec)?;
    print!("{}", render(&value, format)?);
    Ok(())
}

async fn cmd_export(source: Source, format: Option<Format>, output: Option<PathBuf>) -> Result<()> {
    let cfg = try_load_config()?;
    let imported = load_spec(&source, &cfg).await?;
    let format = format.unwrap_or_else(|| cfg.format.into());

    let document = export::export(&imported.spec)?;
    let rendered = render(&document, format)?;

    match output.or_else(|| cfg.output.as_ref().map(PathBuf::from)) {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Exported {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

async fn cmd_inspect(source: Source, format: Format) -> Result<()> {
    let cfg = try_load_config()?;
    let imported = load_spec(&source, &cfg).await?;

    let summary = build_inspect_summary(&imported.spec);
    print!("{}", render(&summary, format)?);
    Ok(())
}

fn build_inspect_summary(spec: &Specification) -> serde_json::Value {
    let types: Vec<serde_json::Value> = spec
        .types
        .iter()
        .map(|ty| {
            serde_json::json!({
                "name": ty.name,
                "kind": ty.kind.as_str(),
                "parent": ty.parent,
                "properties": ty.properties.len(),
            })
        })
        .collect();

    let operations: Vec<serde_json::Value> = spec
        .operations
        .iter()
        .map(|op| {
            serde_json::json!({
                "name": op.name,
                "method": op.http_method.as_str(),
                "path": op.http_path,
                "arguments": op.arguments.len(),
                "return": op.return_type,
                "throws": op.throws.iter().map(|t| t.code).collect::<Vec<_>>(),
                "tags": op.tags,
            })
        })
        .collect();

    serde_json::json!({
        "baseUrl": spec.base_url,
        "root": spec.root_type().map(|ty| &ty.name),
        "imports": spec.imports.iter().map(|i| &i.alias).collect::<Vec<_>>(),
        "types": types,
        "operations": operations,
    })
}

async fn cmd_validate(source: Source) -> Result<()> {
    let cfg = try_load_config()?;
    let imported = load_spec(&source, &cfg).await?;
    let spec = &imported.spec;

    eprintln!("  Types: {}", spec.types.len());
    eprintln!("  Operations: {}", spec.operations.len());
    eprintln!("  Includes: {}", spec.imports.len());
    eprintln!("  Dropped entries: {}", imported.diagnostics.len());

    let unresolved = spec.unresolved_references();
    for reference in &unresolved {
        eprintln!("  unresolved {reference}");
    }

    // Also validate that it exports successfully
    export::export(spec)?;

    if !unresolved.is_empty() {
        anyhow::bail!("{} unresolved reference(s)", unresolved.len());
    }
    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_hash(text: &str) -> Result<()> {
    let cfg = try_load_config()?;
    let naming = DigestNaming::new(cfg.naming.hash_length);
    println!("{}", naming.hash(text));
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
