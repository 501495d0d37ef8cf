//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! CRUD handlers pass straight through to the [`okr_core::Workspace`]. The only
//! logic here is picking the lock and shaping the response.

use super::{
    AppState,
    types::{
        ApiResult, DeletedResponse, HealthResponse, ProgressRequest, ProgressResponse,
        StatusesQuery, TodayQuery, created, ok,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use okr_core::{
    Cadence, CadenceId, CheckIn, DashboardSummary, KeyResult, KeyResultId, KeyResultPatch,
    KeyResultView, NewCadence, NewCheckIn, NewKeyResult, NewObjective, NewTeam, NewTimeframe,
    Objective, ObjectiveId, ObjectivePatch, ObjectiveView, Preferences, PreferencesPatch,
    SeedReport, StatusDisplay, StatusOption, Team, TeamId, Timeframe, TimeframeId,
    selectable_statuses, status_display,
};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS TAXONOMY HANDLERS
// =============================================================================

/// Picker options, optionally restricted with `?allow=`.
pub async fn statuses_handler(Query(query): Query<StatusesQuery>) -> ApiResult<Vec<StatusOption>> {
    let allow = query.allow_list()?;
    ok(selectable_statuses(allow.as_deref()))
}

/// Display metadata for any label.
pub async fn status_display_handler(Path(label): Path<String>) -> ApiResult<StatusDisplay> {
    ok(status_display(&label))
}

// =============================================================================
// OBJECTIVE HANDLERS
// =============================================================================

pub async fn list_objectives_handler(
    State(state): State<AppState>,
) -> ApiResult<Vec<ObjectiveView>> {
    let workspace = state.workspace.read().await;
    ok(workspace.objective_views()?)
}

pub async fn create_objective_handler(
    State(state): State<AppState>,
    Json(request): Json<NewObjective>,
) -> ApiResult<Objective> {
    let mut workspace = state.workspace.write().await;
    created(workspace.create_objective(request)?)
}

pub async fn get_objective_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<ObjectiveView> {
    let workspace = state.workspace.read().await;
    ok(workspace.objective_view(ObjectiveId(id))?)
}

pub async fn update_objective_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<ObjectivePatch>,
) -> ApiResult<Objective> {
    let mut workspace = state.workspace.write().await;
    ok(workspace.update_objective(ObjectiveId(id), patch)?)
}

/// Delete an objective with its key results and check-ins.
pub async fn delete_objective_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<DeletedResponse> {
    let mut workspace = state.workspace.write().await;
    workspace.delete_objective(ObjectiveId(id))?;
    ok(DeletedResponse { deleted: id })
}

// =============================================================================
// KEY RESULT HANDLERS
// =============================================================================

pub async fn list_key_results_handler(
    State(state): State<AppState>,
    Path(objective_id): Path<u64>,
) -> ApiResult<Vec<KeyResultView>> {
    let workspace = state.workspace.read().await;
    let key_results = workspace.key_results(ObjectiveId(objective_id))?;
    ok(key_results.into_iter().map(KeyResultView::from).collect())
}

pub async fn create_key_result_handler(
    State(state): State<AppState>,
    Path(objective_id): Path<u64>,
    Json(request): Json<NewKeyResult>,
) -> ApiResult<KeyResult> {
    let mut workspace = state.workspace.write().await;
    created(workspace.create_key_result(ObjectiveId(objective_id), request)?)
}

pub async fn update_key_result_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<KeyResultPatch>,
) -> ApiResult<KeyResult> {
    let mut workspace = state.workspace.write().await;
    ok(workspace.update_key_result(KeyResultId(id), patch)?)
}

pub async fn delete_key_result_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<DeletedResponse> {
    let mut workspace = state.workspace.write().await;
    workspace.delete_key_result(KeyResultId(id))?;
    ok(DeletedResponse { deleted: id })
}

// =============================================================================
// CHECK-IN HANDLERS
// =============================================================================

pub async fn list_check_ins_handler(
    State(state): State<AppState>,
    Path(key_result_id): Path<u64>,
) -> ApiResult<Vec<CheckIn>> {
    let workspace = state.workspace.read().await;
    let id = KeyResultId(key_result_id);
    workspace.key_result(id)?;
    ok(workspace.check_ins(id)?)
}

/// Record a check-in; the key result's value and progress follow.
pub async fn create_check_in_handler(
    State(state): State<AppState>,
    Path(key_result_id): Path<u64>,
    Json(request): Json<NewCheckIn>,
) -> ApiResult<CheckIn> {
    let mut workspace = state.workspace.write().await;
    created(workspace.record_check_in(KeyResultId(key_result_id), request)?)
}

// =============================================================================
// CADENCE & TIMEFRAME HANDLERS
// =============================================================================

pub async fn list_cadences_handler(State(state): State<AppState>) -> ApiResult<Vec<Cadence>> {
    let workspace = state.workspace.read().await;
    ok(workspace.cadences()?)
}

pub async fn create_cadence_handler(
    State(state): State<AppState>,
    Json(request): Json<NewCadence>,
) -> ApiResult<Cadence> {
    let mut workspace = state.workspace.write().await;
    created(workspace.create_cadence(request)?)
}

pub async fn delete_cadence_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<DeletedResponse> {
    let mut workspace = state.workspace.write().await;
    workspace.delete_cadence(CadenceId(id))?;
    ok(DeletedResponse { deleted: id })
}

pub async fn list_timeframes_handler(State(state): State<AppState>) -> ApiResult<Vec<Timeframe>> {
    let workspace = state.workspace.read().await;
    ok(workspace.timeframes()?)
}

pub async fn create_timeframe_handler(
    State(state): State<AppState>,
    Json(request): Json<NewTimeframe>,
) -> ApiResult<Timeframe> {
    let mut workspace = state.workspace.write().await;
    created(workspace.create_timeframe(request)?)
}

pub async fn delete_timeframe_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<DeletedResponse> {
    let mut workspace = state.workspace.write().await;
    workspace.delete_timeframe(TimeframeId(id))?;
    ok(DeletedResponse { deleted: id })
}

// =============================================================================
// TEAM HANDLERS
// =============================================================================

pub async fn list_teams_handler(State(state): State<AppState>) -> ApiResult<Vec<Team>> {
    let workspace = state.workspace.read().await;
    ok(workspace.teams()?)
}

pub async fn create_team_handler(
    State(state): State<AppState>,
    Json(request): Json<NewTeam>,
) -> ApiResult<Team> {
    let mut workspace = state.workspace.write().await;
    created(workspace.create_team(request)?)
}

pub async fn delete_team_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<DeletedResponse> {
    let mut workspace = state.workspace.write().await;
    workspace.delete_team(TeamId(id))?;
    ok(DeletedResponse { deleted: id })
}

// =============================================================================
// DASHBOARD HANDLER
// =============================================================================

pub async fn dashboard_handler(
    State(state): State<AppState>,
    Query(query): Query<TodayQuery>,
) -> ApiResult<DashboardSummary> {
    let workspace = state.workspace.read().await;
    ok(workspace.dashboard(query.resolve())?)
}

// =============================================================================
// PREFERENCES HANDLERS
// =============================================================================

/// Preferences are created with defaults on first read, hence the write lock.
pub async fn get_preferences_handler(State(state): State<AppState>) -> ApiResult<Preferences> {
    let mut workspace = state.workspace.write().await;
    ok(workspace.preferences()?)
}

pub async fn update_preferences_handler(
    State(state): State<AppState>,
    Json(patch): Json<PreferencesPatch>,
) -> ApiResult<Preferences> {
    let mut workspace = state.workspace.write().await;
    ok(workspace.update_preferences(patch)?)
}

// =============================================================================
// CALCULATOR & SEED HANDLERS
// =============================================================================

/// Progress of an arbitrary metric tuple. Nothing is stored.
pub async fn progress_handler(Json(request): Json<ProgressRequest>) -> ApiResult<ProgressResponse> {
    ok(request.evaluate())
}

/// Create default cadences and the current quarter. Idempotent.
pub async fn seed_handler(
    State(state): State<AppState>,
    Query(query): Query<TodayQuery>,
) -> ApiResult<SeedReport> {
    let mut workspace = state.workspace.write().await;
    ok(workspace.seed_defaults(query.resolve())?)
}
