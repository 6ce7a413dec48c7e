//! # ldhop - Linked-Data Hop Queries
//!
//! The main binary for the ldhop traversal engine.
//!
//! This application provides:
//! - CLI interface for running hop queries
//! - A directory mirror fetcher for linked-data documents
//! - Query configuration in TOML
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/ldhop (THE BINARY)                    │
//! │                                                                 │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌───────────────┐  │
//! │  │   CLI       │    │ DirectoryFetcher │    │ Turtle parser │  │
//! │  │  (clap)     │    │   (filesystem)   │    │   (sophia)    │  │
//! │  └──────┬──────┘    └────────┬─────────┘    └───────┬───────┘  │
//! │         │                    │                      │          │
//! │         └────────────────────┼──────────────────────┘          │
//! │                              ▼                                 │
//! │                      ┌───────────────┐                         │
//! │                      │  ldhop-core   │                         │
//! │                      │ (THE ENGINE)  │                         │
//! │                      └───────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Which documents does the query need first?
//! ldhop missing -c queries/foaf.toml
//!
//! # Traverse a local mirror
//! ldhop run -c queries/community.toml -r ./mirror --json-mode
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // LDHOP_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LDHOP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "ldhop=debug,ldhop_core=debug"
    } else {
        "ldhop=info,ldhop_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // logs go to stderr so stdout stays parseable
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the ldhop startup banner.
fn print_banner() {
    eprintln!(
        r#"
  ldhop v{}
  follow links, fetch only what the query needs
"#,
        env!("CARGO_PKG_VERSION")
    );
}
