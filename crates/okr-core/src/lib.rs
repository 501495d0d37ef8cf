//! # okr-core
//!
//! The deterministic OKR engine - THE LOGIC.
//!
//! This crate computes and stores everything the OKR surfaces display:
//! key-result progress, objective roll-ups, status badges and dashboard
//! figures, over typed records held in memory or in a redb database.
//!
//! ## Architectural Constraints
//!
//! - Progress and status computation are pure functions: no I/O, no clock,
//!   no shared state
//! - Every progress value is inside `[0, 100]`; every status label renders
//! - Status is never derived from progress
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregate;
pub mod dashboard;
pub mod formats;
pub mod model;
pub mod primitives;
pub mod progress;
pub mod status;
pub mod store;
pub mod types;
pub mod workspace;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CadenceId, CheckInId, KeyResultId, ObjectiveId, OkrError, TeamId, TimeframeId, UserId,
};

// =============================================================================
// RE-EXPORTS: Progress & Status
// =============================================================================

pub use aggregate::{objective_progress, resolve_objective_progress};
pub use progress::{Percent, key_result_progress, key_result_progress_or_zero, progress_delta};
pub use status::{
    Status, StatusDisplay, StatusLabel, StatusOption, Tone, selectable_statuses, status_display,
};

// =============================================================================
// RE-EXPORTS: Records & Workspace
// =============================================================================

pub use dashboard::{
    DashboardSummary, TeamPerformance, completion_rate, time_elapsed, time_remaining,
};
pub use model::{
    Cadence, CheckIn, Confidence, KeyResult, KeyResultPatch, NewCadence, NewCheckIn,
    NewKeyResult, NewObjective, NewTeam, NewTimeframe, Objective, ObjectivePatch, Preferences,
    PreferencesPatch, Team, Theme, Timeframe,
};
pub use store::{MemoryStore, OkrStore, Record, RedbStore, WriteBatch};
pub use workspace::{KeyResultView, ObjectiveView, SeedReport, StorageBackend, Workspace};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, WorkspaceSnapshot, snapshot_from_bytes, snapshot_to_bytes};
