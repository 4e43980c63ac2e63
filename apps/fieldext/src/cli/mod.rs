//! # fieldext CLI Module
//!
//! This module implements the CLI interface for fieldext.
//!
//! ## Available Commands
//!
//! - `models` - List schema models and their computed fields
//! - `resolve` - Show resolved base-field needs of computed fields
//! - `plan` - Compute the engine-side selection and omission of a query
//! - `apply` - Evaluate computed fields on records returned by the engine

mod commands;

use clap::{Parser, Subcommand};
use fieldext_core::FieldExtError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// fieldext - layered computed-field planner
///
/// Loads extension declarations from a manifest and shows what the query
/// engine must fetch to serve computed fields.
#[derive(Parser, Debug)]
#[command(name = "fieldext")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the extension manifest
    #[arg(short, long, global = true, default_value = "fieldext.toml")]
    pub manifest: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List models and their computed fields
    Models,

    /// Show resolved needs of computed fields
    Resolve {
        /// Only show this model (schema name or model key)
        #[arg(short = 'M', long)]
        model: Option<String>,
    },

    /// Compute the engine-side selection and omission for a query
    Plan {
        /// Model to query (schema name or model key)
        #[arg(short = 'M', long)]
        model: String,

        /// Caller selection: comma-separated names or a JSON object
        #[arg(short, long)]
        select: Option<String>,

        /// Caller omission: comma-separated names or a JSON object
        #[arg(short, long)]
        omit: Option<String>,
    },

    /// Evaluate computed fields on engine records (text listing, or JSON with --json-mode)
    Apply {
        /// Model the records belong to (schema name or model key)
        #[arg(short = 'M', long)]
        model: String,

        /// JSON file holding one record or an array of records
        #[arg(short, long)]
        records: PathBuf,

        /// Caller selection: comma-separated names or a JSON object
        #[arg(short, long)]
        select: Option<String>,

        /// Caller omission: comma-separated names or a JSON object
        #[arg(short, long)]
        omit: Option<String>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), FieldExtError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Models) | None => cmd_models(&cli.manifest, json_mode),
        Some(Commands::Resolve { model }) => cmd_resolve(&cli.manifest, json_mode, model.as_deref()),
        Some(Commands::Plan {
            model,
            select,
            omit,
        }) => cmd_plan(
            &cli.manifest,
            json_mode,
            &model,
            select.as_deref(),
            omit.as_deref(),
        ),
        Some(Commands::Apply {
            model,
            records,
            select,
            omit,
        }) => cmd_apply(
            &cli.manifest,
            json_mode,
            &model,
            &records,
            select.as_deref(),
            omit.as_deref(),
        ),
    }
}
