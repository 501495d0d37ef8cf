//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::ExportFormat;
use crate::api::{self, AppState, ProgressRequest, StatusesQuery};
use crate::config::{Backend, Config, StorageConfig};
use chrono::NaiveDate;
use okr_core::{
    OkrError, Workspace, WorkspaceSnapshot, primitives::MAGIC_BYTES, selectable_statuses,
    snapshot_from_bytes, snapshot_to_bytes,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for import and the file backend (64 MB).
const MAX_IMPORT_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), OkrError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| OkrError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(OkrError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path, rejecting directories and dangling links.
fn validate_file_path(path: &Path) -> Result<PathBuf, OkrError> {
    let canonical = path.canonicalize().map_err(|e| {
        OkrError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(OkrError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against its canonical parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, OkrError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        OkrError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(OkrError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| OkrError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_json<T: Serialize>(value: &T) -> Result<(), OkrError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| OkrError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// WORKSPACE LOADING
// =============================================================================

/// Open the workspace described by `storage`.
///
/// The redb backend opens (or creates) the database. The file backend loads
/// the snapshot into memory, starting empty when the file does not exist.
pub fn open_workspace(storage: &StorageConfig) -> Result<Workspace, OkrError> {
    match storage.backend {
        Backend::Redb => {
            tracing::debug!(path = %storage.database.display(), "Opening redb database");
            Workspace::with_redb(&storage.database)
        }
        Backend::File => {
            if !storage.database.exists() {
                tracing::info!(
                    path = %storage.database.display(),
                    "No snapshot file, starting with an empty workspace"
                );
                return Ok(Workspace::new());
            }
            let snapshot = read_snapshot_file(&storage.database)?;
            Workspace::from_snapshot(snapshot)
        }
    }
}

/// Persist the workspace. A no-op for redb, which commits on every mutation.
pub fn save_workspace(workspace: &Workspace, storage: &StorageConfig) -> Result<(), OkrError> {
    match storage.backend {
        Backend::Redb => Ok(()),
        Backend::File => {
            let bytes = snapshot_to_bytes(&workspace.export_snapshot()?)?;
            std::fs::write(&storage.database, bytes)
                .map_err(|e| OkrError::IoError(format!("Write snapshot: {}", e)))?;
            tracing::debug!(path = %storage.database.display(), "Snapshot written");
            Ok(())
        }
    }
}

/// Read a binary (`OKRS`) or JSON export.
fn read_snapshot_file(path: &Path) -> Result<WorkspaceSnapshot, OkrError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_IMPORT_FILE_SIZE)?;
    let bytes =
        std::fs::read(&path).map_err(|e| OkrError::IoError(format!("Read file: {}", e)))?;
    decode_snapshot(&bytes)
}

/// Decode export bytes, picking the format from the leading magic.
pub fn decode_snapshot(bytes: &[u8]) -> Result<WorkspaceSnapshot, OkrError> {
    if bytes.starts_with(MAGIC_BYTES) {
        return snapshot_from_bytes(bytes);
    }
    let snapshot: WorkspaceSnapshot = serde_json::from_slice(bytes)
        .map_err(|e| OkrError::SerializationError(format!("Invalid JSON export: {}", e)))?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Encode a snapshot in the requested export format.
pub fn encode_snapshot(
    snapshot: &WorkspaceSnapshot,
    format: ExportFormat,
) -> Result<Vec<u8>, OkrError> {
    match format {
        ExportFormat::Binary => snapshot_to_bytes(snapshot),
        ExportFormat::Json => serde_json::to_vec_pretty(snapshot)
            .map_err(|e| OkrError::SerializationError(e.to_string())),
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &Config) -> Result<(), OkrError> {
    let storage = &config.storage;
    let workspace = open_workspace(storage)?;
    let state = AppState::new(workspace);

    println!("OKR Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Backend:  {}", storage.backend);
    println!("  Database: {}", storage.database.display());
    println!();
    println!("Endpoints:");
    println!("  GET      /objectives      - Objectives with derived progress");
    println!("  GET      /dashboard       - Summary statistics");
    println!("  GET      /statuses        - Status taxonomy");
    println!("  POST     /progress/key-result - Progress calculator");
    println!("  GET      /health          - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    api::run_server(&addr, state.clone(), &config.security).await?;

    let workspace = state.workspace.read().await;
    save_workspace(&workspace, storage)
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new empty database.
pub fn cmd_init(storage: &StorageConfig, json_mode: bool, force: bool) -> Result<(), OkrError> {
    let path = &storage.database;

    if path.exists() {
        if !force {
            return Err(OkrError::validation(format!(
                "Database '{}' already exists. Use --force to replace it.",
                path.display()
            )));
        }
        std::fs::remove_file(path)
            .map_err(|e| OkrError::IoError(format!("Remove existing database: {}", e)))?;
        tracing::info!(path = %path.display(), "Removed existing database");
    }

    let workspace = match storage.backend {
        Backend::Redb => Workspace::with_redb(path)?,
        Backend::File => Workspace::new(),
    };
    save_workspace(&workspace, storage)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "database": path.to_string_lossy(),
            "backend": storage.backend.to_string(),
            "initialized": true
        }));
    }

    println!("Initialized empty workspace");
    println!("  Database: {}", path.display());
    println!("  Backend:  {}", storage.backend);
    Ok(())
}

// =============================================================================
// SEED COMMAND
// =============================================================================

/// Create the default cadences and the current quarter.
pub fn cmd_seed(
    storage: &StorageConfig,
    json_mode: bool,
    today: NaiveDate,
) -> Result<(), OkrError> {
    let mut workspace = open_workspace(storage)?;
    let report = workspace.seed_defaults(today)?;
    save_workspace(&workspace, storage)?;

    if json_mode {
        return print_json(&report);
    }

    println!("Seeded workspace for {}", today);
    println!("  Cadences created:   {}", report.cadences_created);
    println!("  Timeframes created: {}", report.timeframes_created);
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show the dashboard summary.
pub fn cmd_status(
    storage: &StorageConfig,
    json_mode: bool,
    today: NaiveDate,
) -> Result<(), OkrError> {
    let workspace = open_workspace(storage)?;
    let summary = workspace.dashboard(today)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "database": storage.database.to_string_lossy(),
            "backend": storage.backend.to_string(),
            "today": today,
            "summary": summary
        }));
    }

    println!("OKR Dashboard");
    println!("=============");
    println!("Database: {}", storage.database.display());
    println!("Backend:  {}", storage.backend);
    match (&summary.current_timeframe, summary.time_remaining) {
        (Some(t), Some(left)) => println!(
            "Cycle:    {} ({} to {}, {} remaining)",
            t.name, t.start_date, t.end_date, left
        ),
        (Some(t), None) => println!("Cycle:    {} ({} to {})", t.name, t.start_date, t.end_date),
        (None, _) => println!("Cycle:    none covering {}", today),
    }
    println!();
    println!(
        "Objectives:   {} ({} completed, {} company-wide)",
        summary.total_objectives, summary.completed_objectives, summary.company_objectives
    );
    println!("At risk:      {}", summary.at_risk_objectives);
    println!("Overdue:      {}", summary.overdue_objectives);
    println!("Completion:   {}", summary.completion_rate);
    println!("Avg progress: {}", summary.average_progress);
    println!(
        "Key results:  {} ({} completed, {})",
        summary.total_key_results,
        summary.completed_key_results,
        summary.key_result_completion_rate
    );

    if !summary.teams.is_empty() {
        println!();
        println!("Teams:");
        for team in &summary.teams {
            println!(
                "  {:<24} {:>3} objectives  {:>3} completed  {} avg",
                team.name, team.objective_count, team.completed_objectives, team.average_progress
            );
        }
    }

    Ok(())
}

// =============================================================================
// OBJECTIVES COMMAND
// =============================================================================

/// List objectives with their key results and derived progress.
pub fn cmd_objectives(storage: &StorageConfig, json_mode: bool) -> Result<(), OkrError> {
    let workspace = open_workspace(storage)?;
    let views = workspace.objective_views()?;

    if json_mode {
        return print_json(&views);
    }

    if views.is_empty() {
        println!("No objectives.");
        return Ok(());
    }

    for view in &views {
        println!(
            "#{:<4} {:>3}%  [{}] {}",
            view.objective.id.value(),
            view.progress_display,
            view.status.label,
            view.objective.title
        );
        for kr in &view.key_results {
            let unit = kr.key_result.unit.as_deref().unwrap_or("");
            println!(
                "        {:>3}%  {} ({} / {}{})",
                kr.progress_display,
                kr.key_result.title,
                kr.key_result.current_value,
                kr.key_result.target_value,
                unit
            );
        }
    }

    Ok(())
}

// =============================================================================
// PROGRESS COMMAND
// =============================================================================

/// Calculate the progress of a key-result metric.
pub fn cmd_progress(
    json_mode: bool,
    start: f64,
    target: f64,
    current: f64,
) -> Result<(), OkrError> {
    let request = ProgressRequest {
        start_value: start,
        target_value: target,
        current_value: current,
    };
    let response = request.evaluate();

    if json_mode {
        return print_json(&response);
    }

    match response.progress {
        Some(progress) => println!("{}", progress),
        None => println!("undefined (start equals target or a value is not finite)"),
    }
    Ok(())
}

// =============================================================================
// STATUSES COMMAND
// =============================================================================

/// Show the status taxonomy, optionally restricted to an allow-list.
pub fn cmd_statuses(json_mode: bool, allow: Option<String>) -> Result<(), OkrError> {
    let allow = StatusesQuery { allow }.allow_list()?;
    let options = selectable_statuses(allow.as_deref());

    if json_mode {
        return print_json(&options);
    }

    println!("{:<12} {:<10} {:<16} Description", "Status", "Tone", "Icon");
    for option in &options {
        let display = &option.display;
        println!(
            "{:<12} {:<10} {:<16} {}",
            option.value,
            format!("{:?}", display.tone).to_lowercase(),
            display.icon,
            display.description
        );
    }
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT COMMANDS
// =============================================================================

/// Export the workspace.
pub fn cmd_export(
    storage: &StorageConfig,
    json_mode: bool,
    output: &Path,
    format: ExportFormat,
) -> Result<(), OkrError> {
    let output = validate_output_path(output)?;
    let workspace = open_workspace(storage)?;
    let snapshot = workspace.export_snapshot()?;
    let bytes = encode_snapshot(&snapshot, format)?;

    std::fs::write(&output, &bytes)
        .map_err(|e| OkrError::IoError(format!("Write export: {}", e)))?;

    if json_mode {
        return print_json(&serde_json::json!({
            "output": output.to_string_lossy(),
            "format": format!("{:?}", format).to_lowercase(),
            "records": snapshot.record_count(),
            "bytes": bytes.len()
        }));
    }

    println!(
        "Exported {} records ({} bytes) to {}",
        snapshot.record_count(),
        bytes.len(),
        output.display()
    );
    Ok(())
}

/// Import an export, replacing every record in the workspace.
pub fn cmd_import(storage: &StorageConfig, json_mode: bool, input: &Path) -> Result<(), OkrError> {
    let snapshot = read_snapshot_file(input)?;
    let records = snapshot.record_count();

    let mut workspace = open_workspace(storage)?;
    workspace.import_snapshot(snapshot)?;
    save_workspace(&workspace, storage)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "input": input.to_string_lossy(),
            "records": records,
            "database": storage.database.to_string_lossy()
        }));
    }

    println!(
        "Imported {} records into {}",
        records,
        storage.database.display()
    );
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
