use crate::discovery::{DiscoverOptions, Discovery};
use crate::mutation::MutationType;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// OpenRPC document tool - Post-process persisted OpenRPC documents
#[derive(Parser, Debug)]
#[command(name = "openrpc-discover")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to an OpenRPC document (JSON or YAML)
    #[arg(value_name = "DOCUMENT")]
    pub document: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Schema mutation to apply; may be repeated and runs in the given order
    #[arg(short = 'm', long = "mutation", value_enum)]
    pub mutations: Vec<MutationType>,

    /// Discovery options file; its schemaMutations are used when no --mutation is given
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.document.exists() {
        anyhow::bail!("Document does not exist: {}", args.document.display());
    }

    if !args.document.is_file() {
        anyhow::bail!("Document is not a file: {}", args.document.display());
    }

    if let Some(ref options) = args.options {
        if !options.is_file() {
            anyhow::bail!("Options file does not exist: {}", options.display());
        }
    }

    info!("Document: {}", args.document.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    if !args.mutations.is_empty() {
        info!("Mutations: {:?}", args.mutations);
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    // Step 1: Load options
    let options = match &args.options {
        Some(path) => DiscoverOptions::from_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => DiscoverOptions::default(),
    };
    let mutations = if args.mutations.is_empty() {
        options.schema_mutations.clone()
    } else {
        args.mutations.clone()
    };

    // Step 2: Install the persisted document
    info!("Loading document...");
    let mut discovery = Discovery::detached(options);
    let document = discovery
        .install_file(&args.document)
        .with_context(|| format!("Failed to load document {}", args.document.display()))?;
    info!(
        "Loaded {} with {} methods",
        document.info.title,
        document.methods.len()
    );

    // Step 3: Apply schema mutations
    debug!("Applying mutations: {:?}", mutations);
    discovery
        .apply_mutations(&mutations)
        .context("Failed to apply schema mutations")?;

    let document = discovery
        .into_document()
        .context("No document was installed")?;

    // Step 4: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    // Step 5: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenRPC document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Summary:");
    info!("  - Methods: {}", document.methods.len());
    info!("  - Mutations applied: {}", mutations.len());

    Ok(())
}
