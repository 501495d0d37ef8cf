//! # Progress Calculator
//!
//! Maps raw key-result metric tuples to a 0-100 progress percentage.
//!
//! - Linear between `start` and `target`, clamped to `[0, 100]`
//! - Direction-agnostic: works for decreasing metrics (`target < start`)
//! - Pure: no I/O, no shared state; identical inputs give bit-identical output
//!
//! A degenerate range (`target == start`) has no defined progress. The
//! checked function returns `None`; the `_or_zero` variant reports 0 and
//! emits a data-quality warning instead of failing.

use crate::primitives::{PROGRESS_MAX, PROGRESS_MIN};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// PERCENT
// =============================================================================

/// A progress percentage, always within `[0, 100]`.
///
/// Construction clamps; NaN becomes 0. The stored value is not rounded,
/// use [`Percent::rounded`] for presentation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Percent(f64);

impl Percent {
    /// 0 %.
    pub const ZERO: Percent = Percent(PROGRESS_MIN);

    /// 100 %.
    pub const FULL: Percent = Percent(PROGRESS_MAX);

    /// Create a percentage, clamping into `[0, 100]`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(PROGRESS_MIN, PROGRESS_MAX))
    }

    /// Get the raw (unrounded) value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Nearest whole percent, for display.
    #[must_use]
    pub fn rounded(self) -> u8 {
        self.0.round() as u8
    }

    /// Check if the target has been reached.
    #[must_use]
    pub fn is_complete(self) -> bool {
        self.0 >= PROGRESS_MAX
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Percent::new)
    }
}

impl From<f64> for Percent {
    fn from(value: f64) -> Self {
        Percent::new(value)
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.rounded())
    }
}

// =============================================================================
// KEY RESULT PROGRESS
// =============================================================================

/// Progress of a key result from its start, target and current values.
///
/// `clamp(0, 100, (current - start) / (target - start) * 100)`
///
/// Returns `None` when `target == start` or any input is not finite.
#[must_use]
pub fn key_result_progress(start: f64, target: f64, current: f64) -> Option<Percent> {
    if !(start.is_finite() && target.is_finite() && current.is_finite()) {
        return None;
    }
    if target == start {
        return None;
    }
    let range = target - start;
    let ratio = if range.is_finite() {
        (current - start) / range
    } else {
        // Range wider than f64::MAX; halving keeps both terms finite.
        (current / 2.0 - start / 2.0) / (target / 2.0 - start / 2.0)
    };
    Some(Percent::new(ratio * PROGRESS_MAX))
}

/// Like [`key_result_progress`] but reports 0 % for degenerate input and
/// logs a data-quality warning.
#[must_use]
pub fn key_result_progress_or_zero(start: f64, target: f64, current: f64) -> Percent {
    key_result_progress(start, target, current).unwrap_or_else(|| {
        tracing::warn!(
            event = "degenerate_key_result_range",
            start,
            target,
            current,
            "Key result range is empty or non-finite; reporting 0% progress"
        );
        Percent::ZERO
    })
}

/// Signed change between two progress values, in percentage points.
///
/// Used for "improvement" figures on check-ins and dashboards.
#[must_use]
pub fn progress_delta(previous: Percent, current: Percent) -> f64 {
    current.value() - previous.value()
}

// =============================================================================
// TESTS
// =============================================================================
