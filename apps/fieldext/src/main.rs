//! # fieldext - Computed-Field Planner
//!
//! The main binary for layered computed-field extensions.
//!
//! ## Usage
//!
//! ```bash
//! # List models and their computed fields
//! fieldext -m fieldext.toml models
//!
//! # Show resolved needs
//! fieldext resolve -M User
//!
//! # Engine-side selection/omission for a query
//! fieldext plan -M User --select id,nameAndTitle --omit password
//!
//! # Evaluate computed fields on engine output
//! fieldext apply -M User --records rows.json --select id,nameAndTitle
//! ```

use clap::Parser;
use fieldext::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing — FIELDEXT_LOG_FORMAT=json enables machine-parseable output.
    // Logs go to stderr so stdout stays clean for reports.
    let log_format = std::env::var("FIELDEXT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "fieldext=debug"
    } else {
        "fieldext=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

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

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the fieldext banner.
fn print_banner() {
    println!(
        r#"
  fieldext v{}
  layered computed fields • dependency closure • engine-side planning
"#,
        env!("CARGO_PKG_VERSION")
    );
}
