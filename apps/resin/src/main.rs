//! # Resin - Normalized Store CLI
//!
//! The main binary for the Resin normalized resource store.
//!
//! ## Usage
//!
//! ```bash
//! # Inspect a snapshot
//! resin --state library.json show books
//!
//! # Read with a filter, relations expanded
//! resin --state library.json --schemas schemas.toml get books --ids 1,5
//!
//! # Apply a write and save the new snapshot
//! resin --state library.json update books.resources.24 '{"name":"dune"}' --output library.json
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing — RESIN_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("RESIN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "resin=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = resin::cli::Cli::parse();

    if let Err(e) = resin::cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
