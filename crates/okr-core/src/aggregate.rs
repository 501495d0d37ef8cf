//! # Aggregation Rule
//!
//! Rolls key-result progress up into objective progress.
//!
//! Every key result is weighted equally. An objective with key results
//! always reports the derived mean; an objective without key results keeps
//! whatever progress value was stored on it.

use crate::model::KeyResult;
use crate::progress::Percent;

/// Arithmetic mean of key-result percentages.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn objective_progress(key_results: &[Percent]) -> Option<Percent> {
    if key_results.is_empty() {
        return None;
    }
    let sum: f64 = key_results.iter().map(|p| p.value()).sum();
    Some(Percent::new(sum / key_results.len() as f64))
}

/// The authoritative objective progress.
///
/// Derived from `key_results` when there are any, otherwise `stored`.
#[must_use]
pub fn resolve_objective_progress(stored: Percent, key_results: &[KeyResult]) -> Percent {
    let percents: Vec<Percent> = key_results.iter().map(KeyResult::effective_progress).collect();
    objective_progress(&percents).unwrap_or(stored)
}
