//! # Engine Constants
//!
//! Hardcoded limits and format constants for the OKR engine.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Input limits are enforced once, at the boundary (`validate()` on the
//! request types), never at render time.

/// Lower bound of every progress percentage.
pub const PROGRESS_MIN: f64 = 0.0;

/// Upper bound of every progress percentage. Over-achievement is not
/// reported above this value.
pub const PROGRESS_MAX: f64 = 100.0;

/// Magic bytes for the snapshot binary format header.
///
/// - File Header = Magic Bytes ("OKRS") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"OKRS";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for titles and names.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Maximum length for descriptions, notes and other free text.
pub const MAX_DESCRIPTION_LENGTH: usize = 8192;

/// Maximum length of a free-text status label.
pub const MAX_STATUS_LENGTH: usize = 64;

/// Maximum number of key results attached to a single objective.
pub const MAX_KEY_RESULTS_PER_OBJECTIVE: usize = 50;

/// Maximum number of records accepted in a single snapshot import.
pub const MAX_SNAPSHOT_RECORDS: usize = 100_000;
