//! Contract Extractor - Command-line tool for extracting service contracts.
//!
//! This binary reads a project of annotated interface declarations, builds
//! the resource model, validates it, and writes the resulting contract
//! document as YAML or JSON.
//!
//! # Usage
//!
//! ```bash
//! contract-from-source [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Extract a YAML contract:
//! ```bash
//! contract-from-source ./my-service -o contract.yaml
//! ```
//!
//! Extract JSON with a relaxed reference-integrity rule:
//! ```bash
//! contract-from-source ./my-service -f json --disable-rule jaxb.xmlidref.references.xmlid
//! ```

use anyhow::Result;
use clap::Parser;
use contract_from_source::cli;
use log::info;

fn main() -> Result<()> {
    // Args are parsed before logger setup so the verbose flag can pick the
    // log level, then validated once the logger is live.
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Contract extractor starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;
    cli::run(args)?;

    info!("Contract extraction completed successfully");

    Ok(())
}
