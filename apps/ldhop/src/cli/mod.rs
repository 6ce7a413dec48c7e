//! # ldhop CLI Module
//!
//! This module implements the CLI interface for ldhop.
//!
//! ## Available Commands
//!
//! - `run` - Traverse documents from a local mirror until the query settles
//! - `missing` - Show the documents a query needs before anything is fetched
//! - `check` - Validate a query configuration

mod commands;

use clap::{Parser, Subcommand};
use ldhop_core::LdhopError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// ldhop - follow hop queries through linked data
///
/// Fetches only the documents a query needs, discovering them as
/// variables get bound.
#[derive(Parser, Debug)]
#[command(name = "ldhop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query against a directory mirror of linked-data documents
    Run {
        /// Path to the query configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Mirror root: documents live at <root>/<host>/<path>.ttl
        #[arg(short, long)]
        root: PathBuf,

        /// Extra starting binding, as var=iri (repeatable)
        #[arg(short, long)]
        start: Vec<String>,

        /// Stop after this many fetches
        #[arg(short, long)]
        max_fetches: Option<usize>,
    },

    /// Show the documents needed before any fetch
    Missing {
        /// Path to the query configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Extra starting binding, as var=iri (repeatable)
        #[arg(short, long)]
        start: Vec<String>,
    },

    /// Validate a query configuration and list its steps
    Check {
        /// Path to the query configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), LdhopError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Run {
            config,
            root,
            start,
            max_fetches,
        } => cmd_run(&config, &root, &start, max_fetches, json_mode, cli.verbose),
        Commands::Missing { config, start } => cmd_missing(&config, &start, json_mode),
        Commands::Check { config } => cmd_check(&config, json_mode),
    }
}
