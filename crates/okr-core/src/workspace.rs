//! # Workspace Module
//!
//! The OKR workspace: typed CRUD over a storage backend plus derived views.
//!
//! ## Storage Backends
//!
//! - `InMemory`: `MemoryStore` (fast, volatile unless exported)
//! - `Persistent`: `RedbStore` (disk-backed, ACID)
//!
//! ## Integrity
//!
//! - A key result requires an existing objective; a timeframe requires an
//!   existing cadence
//! - Deleting an objective removes its key results and their check-ins;
//!   deleting a cadence removes its timeframes
//! - Deleting a team or timeframe detaches the objectives referring to it
//! - Multi-record changes commit as a single batch

use crate::aggregate::resolve_objective_progress;
use crate::dashboard::DashboardSummary;
use crate::formats::WorkspaceSnapshot;
use crate::model::{
    Cadence, CheckIn, KeyResult, KeyResultPatch, NewCadence, NewCheckIn, NewKeyResult,
    NewObjective, NewTeam, NewTimeframe, Objective, ObjectivePatch, Preferences,
    PreferencesPatch, Team, Timeframe,
};
use crate::primitives::MAX_KEY_RESULTS_PER_OBJECTIVE;
use crate::progress::{Percent, progress_delta};
use crate::status::StatusDisplay;
use crate::store::{
    MemoryStore, OkrStore, PREFERENCES_KEY, Record, RedbStore, TABLES, WriteBatch,
};
use crate::types::{
    CadenceId, CheckInId, KeyResultId, ObjectiveId, OkrError, TeamId, TimeframeId,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn now() -> DateTime<Utc> {
    Utc::now()
}

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Workspace.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory records (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed records using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl OkrStore for StorageBackend {
    fn read(&self, table: &'static str, key: u64) -> Result<Option<Vec<u8>>, OkrError> {
        match self {
            StorageBackend::InMemory(store) => store.read(table, key),
            StorageBackend::Persistent(store) => store.read(table, key),
        }
    }

    fn scan(&self, table: &'static str) -> Result<Vec<(u64, Vec<u8>)>, OkrError> {
        match self {
            StorageBackend::InMemory(store) => store.scan(table),
            StorageBackend::Persistent(store) => store.scan(table),
        }
    }

    fn next_id(&mut self, table: &'static str) -> Result<u64, OkrError> {
        match self {
            StorageBackend::InMemory(store) => store.next_id(table),
            StorageBackend::Persistent(store) => store.next_id(table),
        }
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), OkrError> {
        match self {
            StorageBackend::InMemory(store) => store.commit(batch),
            StorageBackend::Persistent(store) => store.commit(batch),
        }
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// A key result with its computed progress and status display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResultView {
    pub key_result: KeyResult,
    /// Progress from the metric values (0 for a degenerate range).
    pub progress: Percent,
    /// Whole-percent value for display.
    pub progress_display: u8,
    pub status: StatusDisplay,
}

impl From<KeyResult> for KeyResultView {
    fn from(key_result: KeyResult) -> Self {
        let progress = key_result.effective_progress();
        let status = key_result.status.display();
        Self {
            key_result,
            progress,
            progress_display: progress.rounded(),
            status,
        }
    }
}

/// An objective with its key results and resolved progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveView {
    pub objective: Objective,
    /// Derived from key results when there are any, stored value otherwise.
    pub progress: Percent,
    pub progress_display: u8,
    pub status: StatusDisplay,
    pub key_results: Vec<KeyResultView>,
}

impl ObjectiveView {
    #[must_use]
    pub fn build(objective: Objective, key_results: Vec<KeyResult>) -> Self {
        let progress = resolve_objective_progress(objective.progress, &key_results);
        let status = objective.status.display();
        Self {
            objective,
            progress,
            progress_display: progress.rounded(),
            status,
            key_results: key_results.into_iter().map(KeyResultView::from).collect(),
        }
    }
}

/// What `seed_defaults` created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub cadences_created: usize,
    pub timeframes_created: usize,
}

/// Default cadences: name, description, color.
const DEFAULT_CADENCES: [(&str, &str, &str); 3] = [
    ("Quarterly", "Three-month planning cycle", "#3b82f6"),
    ("Annual", "Company-wide yearly goals", "#8b5cf6"),
    ("Monthly", "Short monthly sprints", "#10b981"),
];

/// Name, first and last day of the calendar quarter containing `day`.
fn quarter_of(day: NaiveDate) -> Result<(String, NaiveDate, NaiveDate), OkrError> {
    let quarter = day.month0() / 3;
    let start_month = quarter * 3 + 1;
    let start = NaiveDate::from_ymd_opt(day.year(), start_month, 1);
    let next_start = if quarter == 3 {
        NaiveDate::from_ymd_opt(day.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(day.year(), start_month + 3, 1)
    };
    match (start, next_start.and_then(|d| d.pred_opt())) {
        (Some(start), Some(end)) => Ok((format!("Q{} {}", quarter + 1, day.year()), start, end)),
        _ => Err(OkrError::validation(format!(
            "no calendar quarter for {}",
            day
        ))),
    }
}

// =============================================================================
// WORKSPACE
// =============================================================================

/// An OKR workspace over one storage backend.
#[derive(Debug, Default)]
pub struct Workspace {
    backend: StorageBackend,
}

impl Workspace {
    /// Create an empty in-memory workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workspace with persistent redb storage.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, OkrError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Create an in-memory workspace holding a snapshot.
    pub fn from_snapshot(snapshot: WorkspaceSnapshot) -> Result<Self, OkrError> {
        let mut workspace = Self::new();
        workspace.import_snapshot(snapshot)?;
        Ok(workspace)
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    fn require<R: Record>(&self, id: u64) -> Result<(), OkrError> {
        if self.backend.contains::<R>(id)? {
            Ok(())
        } else {
            Err(OkrError::InvalidReference { kind: R::KIND, id })
        }
    }

    fn check_objective_refs(
        &self,
        team_id: Option<TeamId>,
        cycle_id: Option<TimeframeId>,
    ) -> Result<(), OkrError> {
        if let Some(team) = team_id {
            self.require::<Team>(team.value())?;
        }
        if let Some(cycle) = cycle_id {
            self.require::<Timeframe>(cycle.value())?;
        }
        Ok(())
    }

    // =========================================================================
    // OBJECTIVES
    // =========================================================================

    pub fn create_objective(&mut self, request: NewObjective) -> Result<Objective, OkrError> {
        request.validate()?;
        self.check_objective_refs(request.team_id, request.cycle_id)?;
        let objective = self
            .backend
            .insert(|id| request.into_record(ObjectiveId(id), now()))?;
        tracing::info!(objective_id = %objective.id, "Created objective");
        Ok(objective)
    }

    pub fn objective(&self, id: ObjectiveId) -> Result<Objective, OkrError> {
        self.backend.fetch(id.value())
    }

    /// All objectives in id order.
    pub fn objectives(&self) -> Result<Vec<Objective>, OkrError> {
        self.backend.list()
    }

    pub fn update_objective(
        &mut self,
        id: ObjectiveId,
        patch: ObjectivePatch,
    ) -> Result<Objective, OkrError> {
        patch.validate()?;
        self.check_objective_refs(patch.team_id, patch.cycle_id)?;
        let mut objective = self.objective(id)?;
        patch.apply(&mut objective, now())?;
        self.backend.put(&objective)?;
        Ok(objective)
    }

    /// Delete an objective with its key results and their check-ins.
    pub fn delete_objective(&mut self, id: ObjectiveId) -> Result<(), OkrError> {
        self.objective(id)?;
        let key_results = self.key_results_of(id)?;
        let check_ins: Vec<CheckIn> = self.backend.list()?;

        let mut batch = WriteBatch::new();
        for kr in &key_results {
            for check_in in check_ins.iter().filter(|c| c.key_result_id == kr.id) {
                batch.remove::<CheckIn>(check_in.id.value());
            }
            batch.remove::<KeyResult>(kr.id.value());
        }
        batch.remove::<Objective>(id.value());
        self.backend.commit(batch)?;

        tracing::info!(
            objective_id = %id,
            key_results = key_results.len(),
            "Deleted objective"
        );
        Ok(())
    }

    /// An objective with its key results and derived progress.
    pub fn objective_view(&self, id: ObjectiveId) -> Result<ObjectiveView, OkrError> {
        let objective = self.objective(id)?;
        let key_results = self.key_results_of(id)?;
        Ok(ObjectiveView::build(objective, key_results))
    }

    /// Views of every objective, in id order.
    pub fn objective_views(&self) -> Result<Vec<ObjectiveView>, OkrError> {
        let key_results: Vec<KeyResult> = self.backend.list()?;
        Ok(self
            .objectives()?
            .into_iter()
            .map(|o| {
                let owned = key_results
                    .iter()
                    .filter(|kr| kr.objective_id == o.id)
                    .cloned()
                    .collect();
                ObjectiveView::build(o, owned)
            })
            .collect())
    }

    // =========================================================================
    // KEY RESULTS
    // =========================================================================

    fn key_results_of(&self, objective_id: ObjectiveId) -> Result<Vec<KeyResult>, OkrError> {
        let all: Vec<KeyResult> = self.backend.list()?;
        Ok(all
            .into_iter()
            .filter(|kr| kr.objective_id == objective_id)
            .collect())
    }

    /// Add a key result to an existing objective.
    pub fn create_key_result(
        &mut self,
        objective_id: ObjectiveId,
        request: NewKeyResult,
    ) -> Result<KeyResult, OkrError> {
        request.validate()?;
        self.objective(objective_id)?;
        let existing = self.key_results_of(objective_id)?.len();
        if existing >= MAX_KEY_RESULTS_PER_OBJECTIVE {
            return Err(OkrError::validation(format!(
                "objective {} already has the maximum of {} key results",
                objective_id, MAX_KEY_RESULTS_PER_OBJECTIVE
            )));
        }
        let key_result = self
            .backend
            .insert(|id| request.into_record(KeyResultId(id), objective_id, now()))?;
        tracing::info!(
            key_result_id = %key_result.id,
            objective_id = %objective_id,
            "Created key result"
        );
        Ok(key_result)
    }

    pub fn key_result(&self, id: KeyResultId) -> Result<KeyResult, OkrError> {
        self.backend.fetch(id.value())
    }

    /// Key results of an objective, in id order.
    pub fn key_results(&self, objective_id: ObjectiveId) -> Result<Vec<KeyResult>, OkrError> {
        self.objective(objective_id)?;
        self.key_results_of(objective_id)
    }

    pub fn update_key_result(
        &mut self,
        id: KeyResultId,
        patch: KeyResultPatch,
    ) -> Result<KeyResult, OkrError> {
        patch.validate()?;
        let mut key_result = self.key_result(id)?;
        patch.apply(&mut key_result, now())?;
        self.backend.put(&key_result)?;
        Ok(key_result)
    }

    /// Delete a key result with its check-ins.
    pub fn delete_key_result(&mut self, id: KeyResultId) -> Result<(), OkrError> {
        self.key_result(id)?;
        let mut batch = WriteBatch::new();
        for check_in in self.check_ins(id)? {
            batch.remove::<CheckIn>(check_in.id.value());
        }
        batch.remove::<KeyResult>(id.value());
        self.backend.commit(batch)
    }

    // =========================================================================
    // CHECK-INS
    // =========================================================================

    /// Record a new current value for a key result.
    ///
    /// Updates the key result's value, stored progress and completion flag
    /// in the same commit as the check-in.
    pub fn record_check_in(
        &mut self,
        key_result_id: KeyResultId,
        request: NewCheckIn,
    ) -> Result<CheckIn, OkrError> {
        request.validate()?;
        let mut key_result = self.key_result(key_result_id)?;
        let previous_value = key_result.current_value;
        let previous_progress = key_result.effective_progress();

        let at = now();
        key_result.current_value = request.new_value;
        key_result.refresh_progress();
        key_result.updated_at = at;

        let check_in = CheckIn {
            id: CheckInId(self.backend.next_id(CheckIn::TABLE)?),
            key_result_id,
            previous_value,
            new_value: request.new_value,
            previous_progress,
            new_progress: key_result.progress,
            improvement: progress_delta(previous_progress, key_result.progress),
            note: request.note.unwrap_or_default(),
            confidence: request.confidence.unwrap_or_default(),
            created_at: at,
        };

        let mut batch = WriteBatch::new();
        batch.put(&check_in)?.put(&key_result)?;
        self.backend.commit(batch)?;

        tracing::info!(
            key_result_id = %key_result_id,
            progress = key_result.progress.value(),
            "Recorded check-in"
        );
        Ok(check_in)
    }

    /// Check-ins of a key result, oldest first.
    pub fn check_ins(&self, key_result_id: KeyResultId) -> Result<Vec<CheckIn>, OkrError> {
        let all: Vec<CheckIn> = self.backend.list()?;
        Ok(all
            .into_iter()
            .filter(|c| c.key_result_id == key_result_id)
            .collect())
    }

    // =========================================================================
    // CADENCES & TIMEFRAMES
    // =========================================================================

    pub fn create_cadence(&mut self, request: NewCadence) -> Result<Cadence, OkrError> {
        request.validate()?;
        self.backend
            .insert(|id| request.into_record(CadenceId(id)))
    }

    pub fn cadences(&self) -> Result<Vec<Cadence>, OkrError> {
        self.backend.list()
    }

    /// Delete a cadence with its timeframes.
    pub fn delete_cadence(&mut self, id: CadenceId) -> Result<(), OkrError> {
        self.backend.fetch::<Cadence>(id.value())?;
        let doomed: Vec<TimeframeId> = self
            .timeframes()?
            .into_iter()
            .filter(|t| t.cadence_id == id)
            .map(|t| t.id)
            .collect();

        let mut batch = WriteBatch::new();
        for objective in self.objectives()? {
            if objective.cycle_id.is_some_and(|c| doomed.contains(&c)) {
                batch.put(&Objective {
                    cycle_id: None,
                    ..objective
                })?;
            }
        }
        for timeframe in &doomed {
            batch.remove::<Timeframe>(timeframe.value());
        }
        batch.remove::<Cadence>(id.value());
        self.backend.commit(batch)
    }

    pub fn create_timeframe(&mut self, request: NewTimeframe) -> Result<Timeframe, OkrError> {
        request.validate()?;
        self.require::<Cadence>(request.cadence_id.value())?;
        self.backend
            .insert(|id| request.into_record(TimeframeId(id)))
    }

    pub fn timeframes(&self) -> Result<Vec<Timeframe>, OkrError> {
        self.backend.list()
    }

    /// The timeframe covering `today`, preferring active ones.
    pub fn current_timeframe(&self, today: NaiveDate) -> Result<Option<Timeframe>, OkrError> {
        let covering: Vec<Timeframe> = self
            .timeframes()?
            .into_iter()
            .filter(|t| t.contains(today))
            .collect();
        Ok(covering
            .iter()
            .find(|t| t.is_active)
            .or_else(|| covering.first())
            .cloned())
    }

    /// Delete a timeframe, detaching objectives planned in it.
    pub fn delete_timeframe(&mut self, id: TimeframeId) -> Result<(), OkrError> {
        self.backend.fetch::<Timeframe>(id.value())?;
        let mut batch = WriteBatch::new();
        for objective in self.objectives()? {
            if objective.cycle_id == Some(id) {
                batch.put(&Objective {
                    cycle_id: None,
                    ..objective
                })?;
            }
        }
        batch.remove::<Timeframe>(id.value());
        self.backend.commit(batch)
    }

    // =========================================================================
    // TEAMS
    // =========================================================================

    pub fn create_team(&mut self, request: NewTeam) -> Result<Team, OkrError> {
        request.validate()?;
        self.backend.insert(|id| request.into_record(TeamId(id)))
    }

    pub fn teams(&self) -> Result<Vec<Team>, OkrError> {
        self.backend.list()
    }

    /// Delete a team, detaching its objectives.
    pub fn delete_team(&mut self, id: TeamId) -> Result<(), OkrError> {
        self.backend.fetch::<Team>(id.value())?;
        let mut batch = WriteBatch::new();
        for objective in self.objectives()? {
            if objective.team_id == Some(id) {
                batch.put(&Objective {
                    team_id: None,
                    ..objective
                })?;
            }
        }
        batch.remove::<Team>(id.value());
        self.backend.commit(batch)
    }

    // =========================================================================
    // PREFERENCES
    // =========================================================================

    /// The preferences, created with defaults on first read.
    pub fn preferences(&mut self) -> Result<Preferences, OkrError> {
        if let Some(preferences) = self.backend.get::<Preferences>(PREFERENCES_KEY)? {
            return Ok(preferences);
        }
        let preferences = Preferences::default();
        self.backend.put(&preferences)?;
        Ok(preferences)
    }

    pub fn update_preferences(
        &mut self,
        patch: PreferencesPatch,
    ) -> Result<Preferences, OkrError> {
        let mut preferences = self.preferences()?;
        patch.apply(&mut preferences);
        self.backend.put(&preferences)?;
        Ok(preferences)
    }

    // =========================================================================
    // DASHBOARD
    // =========================================================================

    pub fn dashboard(&self, today: NaiveDate) -> Result<DashboardSummary, OkrError> {
        let objectives = self.objectives()?;
        let key_results: Vec<KeyResult> = self.backend.list()?;
        let teams = self.teams()?;
        let summary = DashboardSummary::build(&objectives, &key_results, &teams, today);
        Ok(match self.current_timeframe(today)? {
            Some(timeframe) => summary.with_timeframe(timeframe, today),
            None => summary,
        })
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Every record of the workspace.
    pub fn export_snapshot(&self) -> Result<WorkspaceSnapshot, OkrError> {
        Ok(WorkspaceSnapshot {
            objectives: self.backend.list()?,
            key_results: self.backend.list()?,
            cadences: self.backend.list()?,
            timeframes: self.backend.list()?,
            teams: self.backend.list()?,
            check_ins: self.backend.list()?,
            preferences: self
                .backend
                .get(PREFERENCES_KEY)?
                .unwrap_or_default(),
        })
    }

    /// Replace all records with the snapshot, in one commit.
    pub fn import_snapshot(&mut self, snapshot: WorkspaceSnapshot) -> Result<(), OkrError> {
        snapshot.validate()?;

        let mut batch = WriteBatch::new();
        for table in TABLES {
            batch.clear(table);
        }
        for record in &snapshot.objectives {
            batch.put(record)?;
        }
        for record in &snapshot.key_results {
            batch.put(record)?;
        }
        for record in &snapshot.cadences {
            batch.put(record)?;
        }
        for record in &snapshot.timeframes {
            batch.put(record)?;
        }
        for record in &snapshot.teams {
            batch.put(record)?;
        }
        for record in &snapshot.check_ins {
            batch.put(record)?;
        }
        batch.put(&snapshot.preferences)?;
        self.backend.commit(batch)?;

        tracing::info!(records = snapshot.record_count(), "Imported snapshot");
        Ok(())
    }

    // =========================================================================
    // SEEDING
    // =========================================================================

    /// Create the default cadences and a timeframe for the current quarter.
    ///
    /// Idempotent: cadences are matched by name (case-insensitive) and the
    /// quarter timeframe is only created when no Quarterly timeframe covers
    /// `today`.
    pub fn seed_defaults(&mut self, today: NaiveDate) -> Result<SeedReport, OkrError> {
        let mut report = SeedReport::default();
        let mut quarterly = None;

        for (name, description, color) in DEFAULT_CADENCES {
            let existing = self
                .cadences()?
                .into_iter()
                .find(|c| c.name.eq_ignore_ascii_case(name));
            let cadence = match existing {
                Some(cadence) => cadence,
                None => {
                    report.cadences_created += 1;
                    self.create_cadence(NewCadence {
                        name: name.to_string(),
                        description: Some(description.to_string()),
                        color: color.to_string(),
                    })?
                }
            };
            if name == "Quarterly" {
                quarterly = Some(cadence.id);
            }
        }

        if let Some(cadence_id) = quarterly {
            let covered = self
                .timeframes()?
                .iter()
                .any(|t| t.cadence_id == cadence_id && t.contains(today));
            if !covered {
                let (name, start_date, end_date) = quarter_of(today)?;
                self.create_timeframe(NewTimeframe {
                    cadence_id,
                    name,
                    start_date,
                    end_date,
                    is_active: true,
                })?;
                report.timeframes_created += 1;
            }
        }

        tracing::info!(
            cadences = report.cadences_created,
            timeframes = report.timeframes_created,
            "Seeded defaults"
        );
        Ok(report)
    }
}

// =============================================================================
// TESTS
// =============================================================================
