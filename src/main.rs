//! goapidoc - Command-line tool for generating OpenAPI documentation from
//! Go source code.
//!
//! The binary scans a Go project, parses the structured comments on handler
//! functions, resolves the Go types they mention, and emits an OpenAPI 2.0
//! document.
//!
//! # Usage
//!
//! ```bash
//! goapidoc [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! goapidoc ./my-go-project -o openapi.yaml
//! ```
//!
//! Generate JSON documentation:
//! ```bash
//! goapidoc ./my-go-project -f json -o openapi.json
//! ```
//!
//! Locate dependency packages through the Go toolchain:
//! ```bash
//! goapidoc ./my-go-project --go-list
//! ```

use anyhow::Result;
use clap::Parser;
use goapidoc::cli;
use log::info;

fn main() -> Result<()> {
    // Parse args twice: once to get the verbose flag, then again with
    // validation after the logger is up.
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("goapidoc starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
