//! # Dashboard Aggregator
//!
//! Summary figures shown on dashboard cards: completion rates, average
//! progress, at-risk counts, time elapsed in a period and per-team
//! performance.
//!
//! All figures are computed from records passed in; nothing here touches
//! storage. Objective progress always goes through
//! [`resolve_objective_progress`], so the dashboard agrees with the
//! objective detail views.

use crate::aggregate::{objective_progress, resolve_objective_progress};
use crate::model::{KeyResult, Objective, Team, Timeframe};
use crate::primitives::PROGRESS_MAX;
use crate::progress::Percent;
use crate::status::StatusLabel;
use crate::types::{ObjectiveId, TeamId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// RATES
// =============================================================================

/// Share of `completed` in `total`. 0 % when `total` is 0.
#[must_use]
pub fn completion_rate(completed: usize, total: usize) -> Percent {
    if total == 0 {
        return Percent::ZERO;
    }
    Percent::new(completed as f64 / total as f64 * PROGRESS_MAX)
}

/// Share of the period `[start, end]` that has passed on `today`.
///
/// 0 % before the period starts. A period of zero or negative length is
/// 100 % elapsed once started.
#[must_use]
pub fn time_elapsed(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Percent {
    if today < start {
        return Percent::ZERO;
    }
    let total = (end - start).num_days();
    if total <= 0 {
        return Percent::FULL;
    }
    let elapsed = (today - start).num_days();
    Percent::new(elapsed as f64 / total as f64 * PROGRESS_MAX)
}

/// Complement of [`time_elapsed`].
#[must_use]
pub fn time_remaining(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Percent {
    Percent::new(PROGRESS_MAX - time_elapsed(start, end, today).value())
}

fn is_closed(objective: &Objective) -> bool {
    objective.status.is(StatusLabel::Completed) || objective.status.is(StatusLabel::Cancelled)
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Aggregate figures for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPerformance {
    pub team_id: TeamId,
    pub name: String,
    pub color: String,
    pub objective_count: usize,
    pub completed_objectives: usize,
    /// Mean resolved progress of the team's objectives (0 without any).
    pub average_progress: Percent,
}

/// Everything the dashboard cards display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_objectives: usize,
    /// Objectives with status `Completed`.
    pub completed_objectives: usize,
    /// Objectives with status `At Risk` or `Behind`.
    pub at_risk_objectives: usize,
    /// Objectives past their end date that are neither completed nor cancelled.
    pub overdue_objectives: usize,
    pub company_objectives: usize,
    pub completion_rate: Percent,
    pub average_progress: Percent,
    pub total_key_results: usize,
    pub completed_key_results: usize,
    pub key_result_completion_rate: Percent,
    pub teams: Vec<TeamPerformance>,
    /// The timeframe covering the evaluation day, if any.
    pub current_timeframe: Option<Timeframe>,
    pub time_elapsed: Option<Percent>,
    pub time_remaining: Option<Percent>,
}

impl DashboardSummary {
    /// Build the summary for `today`.
    ///
    /// Key results whose objective is not in `objectives` are counted in
    /// the key-result totals but do not affect objective progress.
    #[must_use]
    pub fn build(
        objectives: &[Objective],
        key_results: &[KeyResult],
        teams: &[Team],
        today: NaiveDate,
    ) -> Self {
        let mut by_objective: BTreeMap<ObjectiveId, Vec<KeyResult>> = BTreeMap::new();
        for kr in key_results {
            by_objective
                .entry(kr.objective_id)
                .or_default()
                .push(kr.clone());
        }

        let resolved: Vec<(&Objective, Percent)> = objectives
            .iter()
            .map(|o| {
                let krs = by_objective.get(&o.id).map(Vec::as_slice).unwrap_or(&[]);
                (o, resolve_objective_progress(o.progress, krs))
            })
            .collect();

        let completed_objectives = objectives
            .iter()
            .filter(|o| o.status.is(StatusLabel::Completed))
            .count();
        let at_risk_objectives = objectives
            .iter()
            .filter(|o| o.status.is(StatusLabel::AtRisk) || o.status.is(StatusLabel::Behind))
            .count();
        let overdue_objectives = objectives
            .iter()
            .filter(|o| !is_closed(o) && o.end_date.is_some_and(|end| end < today))
            .count();
        let company_objectives = objectives.iter().filter(|o| o.is_company_objective).count();

        let all_progress: Vec<Percent> = resolved.iter().map(|(_, p)| *p).collect();
        let average_progress = objective_progress(&all_progress).unwrap_or(Percent::ZERO);

        let completed_key_results = key_results.iter().filter(|kr| kr.is_completed).count();

        let teams = teams
            .iter()
            .map(|team| {
                let owned: Vec<&(&Objective, Percent)> = resolved
                    .iter()
                    .filter(|(o, _)| o.team_id == Some(team.id))
                    .collect();
                let progress: Vec<Percent> = owned.iter().map(|(_, p)| *p).collect();
                TeamPerformance {
                    team_id: team.id,
                    name: team.name.clone(),
                    color: team.color.clone(),
                    objective_count: owned.len(),
                    completed_objectives: owned
                        .iter()
                        .filter(|(o, _)| o.status.is(StatusLabel::Completed))
                        .count(),
                    average_progress: objective_progress(&progress).unwrap_or(Percent::ZERO),
                }
            })
            .collect();

        Self {
            total_objectives: objectives.len(),
            completed_objectives,
            at_risk_objectives,
            overdue_objectives,
            company_objectives,
            completion_rate: completion_rate(completed_objectives, objectives.len()),
            average_progress,
            total_key_results: key_results.len(),
            completed_key_results,
            key_result_completion_rate: completion_rate(completed_key_results, key_results.len()),
            teams,
            current_timeframe: None,
            time_elapsed: None,
            time_remaining: None,
        }
    }

    /// Attach the period covering `today` and how much of it is left.
    #[must_use]
    pub fn with_timeframe(mut self, timeframe: Timeframe, today: NaiveDate) -> Self {
        self.time_elapsed = Some(time_elapsed(timeframe.start_date, timeframe.end_date, today));
        self.time_remaining = Some(time_remaining(
            timeframe.start_date,
            timeframe.end_date,
            today,
        ));
        self.current_timeframe = Some(timeframe);
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
