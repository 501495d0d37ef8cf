//! # Records
//!
//! Typed OKR records and the request types that create or modify them.
//!
//! Required and optional fields are explicit. Missing numeric fields
//! deserialize to 0 and every request is validated once, at the boundary,
//! through its `validate()` method; render code never re-checks.

use crate::primitives::{MAX_DESCRIPTION_LENGTH, MAX_STATUS_LENGTH, MAX_TITLE_LENGTH};
use crate::progress::{Percent, key_result_progress, key_result_progress_or_zero};
use crate::status::Status;
use crate::types::{
    CadenceId, CheckInId, KeyResultId, ObjectiveId, OkrError, TeamId, TimeframeId, UserId,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// SHARED VALIDATION
// =============================================================================

fn validate_title(field: &str, value: &str) -> Result<(), OkrError> {
    if value.trim().is_empty() {
        return Err(OkrError::validation(format!("{} must not be empty", field)));
    }
    if value.len() > MAX_TITLE_LENGTH {
        return Err(OkrError::validation(format!(
            "{} length {} exceeds maximum {} bytes",
            field,
            value.len(),
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn validate_text(field: &str, value: Option<&str>) -> Result<(), OkrError> {
    match value {
        Some(text) if text.len() > MAX_DESCRIPTION_LENGTH => {
            Err(OkrError::validation(format!(
                "{} length {} exceeds maximum {} bytes",
                field,
                text.len(),
                MAX_DESCRIPTION_LENGTH
            )))
        }
        _ => Ok(()),
    }
}

fn validate_status(status: Option<&Status>) -> Result<(), OkrError> {
    match status {
        Some(Status::Custom(text)) if text.is_empty() => {
            Err(OkrError::validation("status must not be empty"))
        }
        Some(Status::Custom(text)) if text.len() > MAX_STATUS_LENGTH => {
            Err(OkrError::validation(format!(
                "status length {} exceeds maximum {} bytes",
                text.len(),
                MAX_STATUS_LENGTH
            )))
        }
        _ => Ok(()),
    }
}

fn validate_period(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), OkrError> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(OkrError::validation(format!(
            "end date {} is before start date {}",
            end, start
        )));
    }
    Ok(())
}

fn validate_finite(field: &str, value: f64) -> Result<(), OkrError> {
    if !value.is_finite() {
        return Err(OkrError::validation(format!("{} must be a finite number", field)));
    }
    Ok(())
}

fn validate_range(start: f64, target: f64) -> Result<(), OkrError> {
    if start == target {
        return Err(OkrError::validation(
            "target value must differ from start value",
        ));
    }
    Ok(())
}

/// Colors are `#rgb` or `#rrggbb` hex strings.
fn validate_color(color: &str) -> Result<(), OkrError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    let valid = matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(OkrError::validation(format!(
            "color '{}' is not a #rgb or #rrggbb hex value",
            color
        )));
    }
    Ok(())
}

// =============================================================================
// OBJECTIVE
// =============================================================================

/// A top-level qualitative goal owning zero or more key results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Stored progress. Used only while the objective has no key results.
    #[serde(default)]
    pub progress: Percent,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    /// The timeframe (planning cycle) this objective belongs to.
    #[serde(default)]
    pub cycle_id: Option<TimeframeId>,
    #[serde(default)]
    pub is_company_objective: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create an objective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewObjective {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub cycle_id: Option<TimeframeId>,
    #[serde(default)]
    pub is_company_objective: bool,
}

impl NewObjective {
    /// Minimal request with just a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), OkrError> {
        validate_title("title", &self.title)?;
        validate_text("description", self.description.as_deref())?;
        validate_status(self.status.as_ref())?;
        if let Some(progress) = self.progress {
            validate_finite("progress", progress)?;
        }
        validate_period(self.start_date, self.end_date)
    }

    /// Build the record. The caller supplies the allocated id and clock.
    #[must_use]
    pub fn into_record(self, id: ObjectiveId, now: DateTime<Utc>) -> Objective {
        Objective {
            id,
            title: self.title.trim().to_string(),
            description: self.description.unwrap_or_default(),
            progress: Percent::new(self.progress.unwrap_or(0.0)),
            status: self.status.unwrap_or_default(),
            start_date: self.start_date,
            end_date: self.end_date,
            owner_id: self.owner_id,
            team_id: self.team_id,
            cycle_id: self.cycle_id,
            is_company_objective: self.is_company_objective,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of an objective. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectivePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub cycle_id: Option<TimeframeId>,
    #[serde(default)]
    pub is_company_objective: Option<bool>,
}

impl ObjectivePatch {
    pub fn validate(&self) -> Result<(), OkrError> {
        if let Some(title) = &self.title {
            validate_title("title", title)?;
        }
        validate_text("description", self.description.as_deref())?;
        validate_status(self.status.as_ref())?;
        if let Some(progress) = self.progress {
            validate_finite("progress", progress)?;
        }
        Ok(())
    }

    /// Apply to a record, validating the resulting period.
    pub fn apply(self, objective: &mut Objective, now: DateTime<Utc>) -> Result<(), OkrError> {
        validate_period(
            self.start_date.or(objective.start_date),
            self.end_date.or(objective.end_date),
        )?;

        if let Some(title) = self.title {
            objective.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            objective.description = description;
        }
        if let Some(progress) = self.progress {
            objective.progress = Percent::new(progress);
        }
        if let Some(status) = self.status {
            objective.status = status;
        }
        if let Some(start_date) = self.start_date {
            objective.start_date = Some(start_date);
        }
        if let Some(end_date) = self.end_date {
            objective.end_date = Some(end_date);
        }
        if let Some(owner_id) = self.owner_id {
            objective.owner_id = Some(owner_id);
        }
        if let Some(team_id) = self.team_id {
            objective.team_id = Some(team_id);
        }
        if let Some(cycle_id) = self.cycle_id {
            objective.cycle_id = Some(cycle_id);
        }
        if let Some(is_company) = self.is_company_objective {
            objective.is_company_objective = is_company;
        }
        objective.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// KEY RESULT
// =============================================================================

/// A quantitative metric measuring progress toward an objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: KeyResultId,
    pub objective_id: ObjectiveId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_value: f64,
    #[serde(default)]
    pub target_value: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    /// Last computed progress, kept in sync on every write.
    #[serde(default)]
    pub progress: Percent,
    #[serde(default)]
    pub status: Status,
    /// Latched: set once progress reaches 100 %, never cleared by a later
    /// value change. Can be cleared by a patch only below 100 %.
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KeyResult {
    /// Progress from the metric values; `None` for a degenerate range.
    #[must_use]
    pub fn computed_progress(&self) -> Option<Percent> {
        key_result_progress(self.start_value, self.target_value, self.current_value)
    }

    /// Progress from the metric values, 0 % (with a warning) when the
    /// range is degenerate.
    #[must_use]
    pub fn effective_progress(&self) -> Percent {
        key_result_progress_or_zero(self.start_value, self.target_value, self.current_value)
    }

    /// Recompute the stored progress and completion flag after a value change.
    pub fn refresh_progress(&mut self) {
        self.progress = self.effective_progress();
        if self.progress.is_complete() {
            self.is_completed = true;
        }
    }
}

/// Request to create a key result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewKeyResult {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_value: f64,
    pub target_value: f64,
    /// Defaults to `start_value`.
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
}

impl NewKeyResult {
    /// Metric from `start` to `target` with no progress yet.
    pub fn metric(title: impl Into<String>, start_value: f64, target_value: f64) -> Self {
        Self {
            title: title.into(),
            start_value,
            target_value,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), OkrError> {
        validate_title("title", &self.title)?;
        validate_text("description", self.description.as_deref())?;
        validate_status(self.status.as_ref())?;
        validate_finite("start_value", self.start_value)?;
        validate_finite("target_value", self.target_value)?;
        if let Some(current) = self.current_value {
            validate_finite("current_value", current)?;
        }
        validate_range(self.start_value, self.target_value)
    }

    #[must_use]
    pub fn into_record(
        self,
        id: KeyResultId,
        objective_id: ObjectiveId,
        now: DateTime<Utc>,
    ) -> KeyResult {
        let mut record = KeyResult {
            id,
            objective_id,
            title: self.title.trim().to_string(),
            description: self.description.unwrap_or_default(),
            start_value: self.start_value,
            target_value: self.target_value,
            current_value: self.current_value.unwrap_or(self.start_value),
            unit: self.unit,
            progress: Percent::ZERO,
            status: self.status.unwrap_or_default(),
            is_completed: false,
            created_at: now,
            updated_at: now,
        };
        record.refresh_progress();
        record
    }
}

/// Partial update of a key result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyResultPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_value: Option<f64>,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

impl KeyResultPatch {
    pub fn validate(&self) -> Result<(), OkrError> {
        if let Some(title) = &self.title {
            validate_title("title", title)?;
        }
        validate_text("description", self.description.as_deref())?;
        validate_status(self.status.as_ref())?;
        for (field, value) in [
            ("start_value", self.start_value),
            ("target_value", self.target_value),
            ("current_value", self.current_value),
        ] {
            if let Some(value) = value {
                validate_finite(field, value)?;
            }
        }
        Ok(())
    }

    /// Apply to a record, rejecting a patch that would empty the range.
    pub fn apply(self, key_result: &mut KeyResult, now: DateTime<Utc>) -> Result<(), OkrError> {
        let start = self.start_value.unwrap_or(key_result.start_value);
        let target = self.target_value.unwrap_or(key_result.target_value);
        if self.start_value.is_some() || self.target_value.is_some() {
            validate_range(start, target)?;
        }
        let current = self.current_value.unwrap_or(key_result.current_value);
        if self.is_completed == Some(false)
            && key_result_progress(start, target, current).is_some_and(Percent::is_complete)
        {
            return Err(OkrError::validation(
                "is_completed cannot be cleared while progress is 100%",
            ));
        }

        if let Some(title) = self.title {
            key_result.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            key_result.description = description;
        }
        key_result.start_value = start;
        key_result.target_value = target;
        key_result.current_value = current;
        if let Some(unit) = self.unit {
            key_result.unit = Some(unit);
        }
        if let Some(status) = self.status {
            key_result.status = status;
        }
        if let Some(done) = self.is_completed {
            key_result.is_completed = done;
        }
        key_result.refresh_progress();
        key_result.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// CHECK-IN
// =============================================================================

/// How confident the reporter is that the key result will land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

/// A recorded update of a key result's current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: CheckInId,
    pub key_result_id: KeyResultId,
    pub previous_value: f64,
    pub new_value: f64,
    pub previous_progress: Percent,
    pub new_progress: Percent,
    /// `new_progress - previous_progress`, in percentage points.
    #[serde(default)]
    pub improvement: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub confidence: Confidence,
    pub created_at: DateTime<Utc>,
}

/// Request to record a check-in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCheckIn {
    pub new_value: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

impl NewCheckIn {
    pub fn validate(&self) -> Result<(), OkrError> {
        validate_finite("new_value", self.new_value)?;
        validate_text("note", self.note.as_deref())
    }
}

// =============================================================================
// CADENCE / TIMEFRAME
// =============================================================================

/// A named planning rhythm (quarterly, annual, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cadence {
    pub id: CadenceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub color: String,
}

/// Request to create a cadence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCadence {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
}

impl NewCadence {
    pub fn validate(&self) -> Result<(), OkrError> {
        validate_title("name", &self.name)?;
        validate_text("description", self.description.as_deref())?;
        validate_color(&self.color)
    }

    #[must_use]
    pub fn into_record(self, id: CadenceId) -> Cadence {
        Cadence {
            id,
            name: self.name.trim().to_string(),
            description: self.description.unwrap_or_default(),
            color: self.color.to_ascii_lowercase(),
        }
    }
}

/// A concrete dated period under a cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    pub id: TimeframeId,
    pub cadence_id: CadenceId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_active: bool,
}

impl Timeframe {
    /// Check if `day` falls inside the period (inclusive).
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

/// Request to create a timeframe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimeframe {
    pub cadence_id: CadenceId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_active: bool,
}

impl NewTimeframe {
    pub fn validate(&self) -> Result<(), OkrError> {
        validate_title("name", &self.name)?;
        validate_period(Some(self.start_date), Some(self.end_date))
    }

    #[must_use]
    pub fn into_record(self, id: TimeframeId) -> Timeframe {
        Timeframe {
            id,
            cadence_id: self.cadence_id,
            name: self.name.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active,
        }
    }
}

// =============================================================================
// TEAM
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to a neutral slate.
    #[serde(default)]
    pub color: Option<String>,
}

impl NewTeam {
    pub fn validate(&self) -> Result<(), OkrError> {
        validate_title("name", &self.name)?;
        validate_text("description", self.description.as_deref())?;
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn into_record(self, id: TeamId) -> Team {
        Team {
            id,
            name: self.name.trim().to_string(),
            description: self.description.unwrap_or_default(),
            color: self
                .color
                .map(|c| c.to_ascii_lowercase())
                .unwrap_or_else(|| "#64748b".to_string()),
        }
    }
}

// =============================================================================
// UI PREFERENCES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Client shell state (theme, sidebar) persisted as a single record.
///
/// Created with defaults on first read and never torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_sidebar_expanded")]
    pub sidebar_expanded: bool,
}

fn default_sidebar_expanded() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            sidebar_expanded: default_sidebar_expanded(),
        }
    }
}

/// Partial update of the preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub sidebar_expanded: Option<bool>,
}

impl PreferencesPatch {
    pub fn apply(self, preferences: &mut Preferences) {
        if let Some(theme) = self.theme {
            preferences.theme = theme;
        }
        if let Some(expanded) = self.sidebar_expanded {
            preferences.sidebar_expanded = expanded;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
