//! # OKR CLI Module
//!
//! This module implements the CLI interface for the OKR server.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `seed` - Create default cadences and the current quarter
//! - `status` - Show the dashboard summary
//! - `objectives` - List objectives with derived progress
//! - `progress` - Calculate a key-result percentage
//! - `statuses` - Show the status taxonomy
//! - `export` - Export the workspace to a file
//! - `import` - Import the workspace from a file

mod commands;

use crate::config::{Backend, Config};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use okr_core::OkrError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// OKR - objectives and key results, tracked deterministically.
///
/// Progress is derived from key-result metrics; status is whatever the
/// owner says it is.
#[derive(Parser, Debug)]
#[command(name = "okr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the config file (default: ./okr.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend (overrides the config file)
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// `OKRS` header + postcard payload
    #[default]
    Binary,
    /// Pretty-printed JSON snapshot
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Initialize a new empty database
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Create the default cadences and the current quarter (idempotent)
    Seed {
        /// Date to seed for (default: today, UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Show the dashboard summary
    Status {
        /// Date to evaluate overdue objectives against (default: today, UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// List objectives with their key results and derived progress
    Objectives,

    /// Calculate the progress of a key-result metric
    Progress {
        /// Starting value
        #[arg(short, long, allow_negative_numbers = true)]
        start: f64,

        /// Target value
        #[arg(short, long, allow_negative_numbers = true)]
        target: f64,

        /// Current value
        #[arg(short, long, allow_negative_numbers = true)]
        current: f64,
    },

    /// Show the status taxonomy
    Statuses {
        /// Comma-separated allow-list, e.g. "In Progress,At Risk"
        #[arg(short, long)]
        allow: Option<String>,
    },

    /// Export the workspace
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format
        #[arg(short = 't', long, value_enum, default_value_t = ExportFormat::Binary)]
        format: ExportFormat,
    },

    /// Import a workspace export, replacing all records
    Import {
        /// Input file path (binary or JSON export)
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// CONFIG RESOLUTION
// =============================================================================

impl Cli {
    /// Resolve the effective config: file, then environment, then flags.
    pub fn resolve_config(&self) -> Result<Config, OkrError> {
        let mut config = Config::load(self.config.as_deref())?;
        config.apply_process_env();
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Apply global CLI flags over `config`.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(database) = &self.database {
            config.storage.database = database.clone();
        }
        if let Some(backend) = self.backend {
            config.storage.backend = backend;
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), OkrError> {
    let mut config = cli.resolve_config()?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_server(&config).await
        }
        Some(Commands::Init { force }) => cmd_init(&config.storage, json_mode, force),
        Some(Commands::Seed { today }) => {
            cmd_seed(&config.storage, json_mode, resolve_today(today))
        }
        Some(Commands::Status { today }) => {
            cmd_status(&config.storage, json_mode, resolve_today(today))
        }
        Some(Commands::Objectives) => cmd_objectives(&config.storage, json_mode),
        Some(Commands::Progress {
            start,
            target,
            current,
        }) => cmd_progress(json_mode, start, target, current),
        Some(Commands::Statuses { allow }) => cmd_statuses(json_mode, allow),
        Some(Commands::Export { output, format }) => {
            cmd_export(&config.storage, json_mode, &output, format)
        }
        Some(Commands::Import { input }) => cmd_import(&config.storage, json_mode, &input),
        None => {
            // No subcommand - show the dashboard by default
            cmd_status(&config.storage, json_mode, resolve_today(None))
        }
    }
}

fn resolve_today(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| chrono::Utc::now().date_naive())
}

// =============================================================================
// TESTS
// =============================================================================
