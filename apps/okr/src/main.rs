//! # OKR Server
//!
//! The main binary for the OKR progress and status engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for workspace operations
//! - Configuration from `okr.toml` and the environment
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  apps/okr (THE BINARY)               │
//! │                                                      │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────┐  │
//! │  │   CLI       │    │   HTTP API  │    │  Config  │  │
//! │  │  (clap)     │    │   (axum)    │    │  (toml)  │  │
//! │  └──────┬──────┘    └──────┬──────┘    └────┬─────┘  │
//! │         └──────────────────┼────────────────┘        │
//! │                            ▼                         │
//! │                    ┌───────────────┐                 │
//! │                    │   okr-core    │                 │
//! │                    │  (THE LOGIC)  │                 │
//! │                    └───────────────┘                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! okr server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! okr seed
//! okr status
//! okr progress -s 10 -t 0 -c 4
//! okr export -o backup.okrs
//! ```

use clap::Parser;
use okr::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // OKR_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("OKR_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "okr=info,okr_core=info,tower_http=debug".into());

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

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
   ██████╗ ██╗  ██╗██████╗
  ██╔═══██╗██║ ██╔╝██╔══██╗
  ██║   ██║█████╔╝ ██████╔╝
  ██║   ██║██╔═██╗ ██╔══██╗
  ╚██████╔╝██║  ██╗██║  ██║
   ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝

  OKR Server v{}

  Measured • Owned • Honest
"#,
        env!("CARGO_PKG_VERSION")
    );
}
