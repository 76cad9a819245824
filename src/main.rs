//! OpenRPC document tool - Command-line post-processing of OpenRPC documents.
//!
//! Loads a persisted OpenRPC document, applies schema mutations and writes the result
//! as YAML or JSON.
//!
//! # Usage
//!
//! ```bash
//! openrpc-discover [OPTIONS] <DOCUMENT>
//! ```
//!
//! # Examples
//!
//! Inline all references and drop the definitions:
//! ```bash
//! openrpc-discover openrpc.json -m expand -m remove-definitions -o openrpc.yaml
//! ```
//!
//! Convert to JSON with verbose logging:
//! ```bash
//! openrpc-discover openrpc.yaml -f json -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openrpc_discover::cli;

fn main() -> Result<()> {
    // Parse once up front so the log level is known before the logger starts
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("openrpc-discover starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("Done");

    Ok(())
}
