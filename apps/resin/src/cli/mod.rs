//! # Resin CLI Module
//!
//! This module implements the CLI interface for Resin.
//!
//! ## Available Commands
//!
//! - `show` - Print the snapshot, or one type's bucket
//! - `get` - Read a type's resources, filtered and relation-expanded
//! - `update` - Apply an update to the snapshot
//! - `delete` - Apply deletions to the snapshot

pub mod commands;

use clap::{Parser, Subcommand};
use resin_core::ResinError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Resin - Normalized Resource Store
///
/// An in-process, schema-aware store of typed records and named lists.
/// One invocation loads a snapshot, runs one operation, and prints or
/// writes the result.
#[derive(Parser, Debug)]
#[command(name = "resin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the state snapshot (JSON)
    #[arg(short, long, global = true, default_value = "state.json")]
    pub state: PathBuf,

    /// Path to the schema configuration (TOML)
    #[arg(short = 'S', long, global = true)]
    pub schemas: Option<PathBuf>,

    /// Fail if the operation emits any diagnostic
    #[arg(long, global = true)]
    pub strict: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the snapshot, or one type's bucket
    Show {
        /// Resource type to print; the whole snapshot when omitted
        resource_type: Option<String>,
    },

    /// Read a type's resources
    Get {
        /// Resource type to read
        resource_type: String,

        /// Comma-separated identifier filter
        #[arg(long, conflicts_with = "matches")]
        ids: Option<String>,

        /// Partial-object filter (JSON)
        #[arg(long)]
        matches: Option<String>,

        /// Skip relation expansion
        #[arg(long)]
        raw: bool,

        /// Key the output by identifier instead of returning a sequence
        #[arg(long)]
        by_id: bool,
    },

    /// Apply an update to the snapshot
    Update {
        /// Target path: 'type', 'type.resources[.id]', or 'type.lists[.name]'
        target: String,

        /// Changes payload (JSON)
        changes: String,

        /// Write the new snapshot here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply deletions to the snapshot
    Delete {
        /// Target path: 'type', 'type.resources[.id]', or 'type.lists[.name]'
        target: String,

        /// Changes payload (JSON); omit when the path names one resource
        #[arg(default_value = "null")]
        changes: String,

        /// Write the new snapshot here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Execute a parsed command line.
pub fn execute(cli: Cli) -> Result<(), ResinError> {
    match cli.command {
        Commands::Show { resource_type } => cmd_show(
            &cli.state,
            cli.schemas.as_deref(),
            resource_type.as_deref(),
            cli.strict,
        ),
        Commands::Get {
            resource_type,
            ids,
            matches,
            raw,
            by_id,
        } => cmd_get(
            &cli.state,
            cli.schemas.as_deref(),
            &resource_type,
            &GetArgs {
                ids,
                matches,
                raw,
                by_id,
            },
            cli.strict,
        ),
        Commands::Update {
            target,
            changes,
            output,
        } => cmd_update(
            &cli.state,
            cli.schemas.as_deref(),
            &target,
            &changes,
            output.as_deref(),
            cli.strict,
        ),
        Commands::Delete {
            target,
            changes,
            output,
        } => cmd_delete(
            &cli.state,
            cli.schemas.as_deref(),
            &target,
            &changes,
            output.as_deref(),
            cli.strict,
        ),
    }
}
