//! # Core Type Definitions
//!
//! This module contains the identifier and error types shared by every
//! other module of the engine:
//! - Record identifiers (`ObjectiveId`, `KeyResultId`, `CadenceId`, ...)
//! - Error types (`OkrError`)
//!
//! ## Identifier Guarantees
//!
//! All identifiers:
//! - Are opaque `u64` newtypes allocated by the store (never reused)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Serialize transparently as plain numbers

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// RECORD IDENTIFIERS
// =============================================================================

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw identifier value.
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of an objective (top-level qualitative goal).
    ObjectiveId
);
record_id!(
    /// Identifier of a key result (quantitative metric owned by an objective).
    KeyResultId
);
record_id!(
    /// Identifier of a cadence (named planning rhythm).
    CadenceId
);
record_id!(
    /// Identifier of a timeframe (dated instance of a cadence).
    TimeframeId
);
record_id!(
    /// Identifier of a team.
    TeamId
);
record_id!(
    /// Identifier of a person owning objectives. Owned by the external
    /// identity provider; the engine only stores the reference.
    UserId
);
record_id!(
    /// Identifier of a key-result check-in.
    CheckInId
);

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the OKR engine.
///
/// - No silent failures
/// - Use `Result<T, OkrError>` for fallible operations
/// - Progress and status computation never fail; only storage and
///   boundary validation produce errors
#[derive(Debug, Error)]
pub enum OkrError {
    /// The requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind ("objective", "key result", ...).
        kind: &'static str,
        /// Raw identifier that was looked up.
        id: u64,
    },

    /// Input failed boundary validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A record refers to another record that does not exist.
    #[error("Invalid reference: {kind} {id} does not exist")]
    InvalidReference {
        /// Kind of the missing referenced record.
        kind: &'static str,
        /// Raw identifier of the missing record.
        id: u64,
    },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage engine error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl OkrError {
    /// Shorthand for a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Check if this error means the target record is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================
