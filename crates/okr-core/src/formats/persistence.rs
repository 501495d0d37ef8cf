//! # Persistence Format
//!
//! Binary serialization for workspace snapshots.
//!
//! File I/O operations are in the app layer.
//!
//! Format: Header (5 bytes) + postcard-serialized snapshot.
//! - 4 bytes: Magic ("OKRS")
//! - 1 byte: Version
//!
//! ## Limits
//!
//! - Maximum payload size (`MAX_PERSISTENCE_PAYLOAD_SIZE`) checked before
//!   any decoding
//! - Header validated before the payload is parsed
//! - Record count and references validated after decoding

use crate::model::{Cadence, CheckIn, KeyResult, Objective, Preferences, Team, Timeframe};
use crate::primitives::{self, MAX_SNAPSHOT_RECORDS};
use crate::types::OkrError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum allowed payload size for the persistence format.
///
/// Validated BEFORE attempting deserialization.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 64 * 1024 * 1024; // 64 MB

/// Header length in bytes.
const HEADER_SIZE: usize = 5;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Every record of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub key_results: Vec<KeyResult>,
    #[serde(default)]
    pub cadences: Vec<Cadence>,
    #[serde(default)]
    pub timeframes: Vec<Timeframe>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub check_ins: Vec<CheckIn>,
    #[serde(default)]
    pub preferences: Preferences,
}

impl WorkspaceSnapshot {
    /// Number of records, preferences excluded.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.objectives.len()
            + self.key_results.len()
            + self.cadences.len()
            + self.timeframes.len()
            + self.teams.len()
            + self.check_ins.len()
    }

    /// Check size limits and that every reference resolves.
    pub fn validate(&self) -> Result<(), OkrError> {
        let count = self.record_count();
        if count > MAX_SNAPSHOT_RECORDS {
            return Err(OkrError::validation(format!(
                "snapshot holds {} records, maximum is {}",
                count, MAX_SNAPSHOT_RECORDS
            )));
        }

        let objectives: BTreeSet<_> = self.objectives.iter().map(|o| o.id).collect();
        let key_results: BTreeSet<_> = self.key_results.iter().map(|k| k.id).collect();
        let cadences: BTreeSet<_> = self.cadences.iter().map(|c| c.id).collect();
        let timeframes: BTreeSet<_> = self.timeframes.iter().map(|t| t.id).collect();
        let teams: BTreeSet<_> = self.teams.iter().map(|t| t.id).collect();
        let check_ins: BTreeSet<_> = self.check_ins.iter().map(|c| c.id).collect();

        if objectives.len() != self.objectives.len()
            || key_results.len() != self.key_results.len()
            || cadences.len() != self.cadences.len()
            || timeframes.len() != self.timeframes.len()
            || teams.len() != self.teams.len()
            || check_ins.len() != self.check_ins.len()
        {
            return Err(OkrError::validation("snapshot contains duplicate ids"));
        }

        for kr in &self.key_results {
            if !objectives.contains(&kr.objective_id) {
                return Err(OkrError::InvalidReference {
                    kind: "objective",
                    id: kr.objective_id.value(),
                });
            }
        }
        for tf in &self.timeframes {
            if !cadences.contains(&tf.cadence_id) {
                return Err(OkrError::InvalidReference {
                    kind: "cadence",
                    id: tf.cadence_id.value(),
                });
            }
        }
        for check_in in &self.check_ins {
            if !key_results.contains(&check_in.key_result_id) {
                return Err(OkrError::InvalidReference {
                    kind: "key result",
                    id: check_in.key_result_id.value(),
                });
            }
        }
        for objective in &self.objectives {
            if let Some(team) = objective.team_id
                && !teams.contains(&team)
            {
                return Err(OkrError::InvalidReference {
                    kind: "team",
                    id: team.value(),
                });
            }
            if let Some(cycle) = objective.cycle_id
                && !timeframes.contains(&cycle)
            {
                return Err(OkrError::InvalidReference {
                    kind: "timeframe",
                    id: cycle.value(),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all snapshot data.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), OkrError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(OkrError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(OkrError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OkrError> {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Err(OkrError::SerializationError(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
pub fn snapshot_to_bytes(snapshot: &WorkspaceSnapshot) -> Result<Vec<u8>, OkrError> {
    let header = PersistenceHeader::new();
    let payload =
        postcard::to_stdvec(snapshot).map_err(|e| OkrError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize and validate a snapshot from bytes.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<WorkspaceSnapshot, OkrError> {
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(OkrError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let snapshot: WorkspaceSnapshot =
        postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
            OkrError::SerializationError(format!("Failed to deserialize snapshot: {}", e))
        })?;
    snapshot.validate()?;
    Ok(snapshot)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CheckIn, Confidence, NewCadence, NewKeyResult, NewObjective, NewTimeframe, Theme,
    };
    use crate::progress::Percent;
    use crate::types::{CadenceId, CheckInId, KeyResultId, ObjectiveId, TimeframeId};
    use chrono::{DateTime, NaiveDate, Utc};

    fn sample() -> WorkspaceSnapshot {
        let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("timestamp");
        let cadence = NewCadence {
            name: "Quarterly".into(),
            description: None,
            color: "#3b82f6".into(),
        }
        .into_record(CadenceId(1));
        let timeframe = NewTimeframe {
            cadence_id: CadenceId(1),
            name: "Q1 2025".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).expect("date"),
            is_active: true,
        }
        .into_record(TimeframeId(1));
        let objective = NewObjective {
            cycle_id: Some(TimeframeId(1)),
            ..NewObjective::titled("Grow")
        }
        .into_record(ObjectiveId(1), now);
        let kr = NewKeyResult::metric("Signups", 0.0, 100.0).into_record(
            KeyResultId(1),
            ObjectiveId(1),
            now,
        );
        WorkspaceSnapshot {
            objectives: vec![objective],
            key_results: vec![kr],
            cadences: vec![cadence],
            timeframes: vec![timeframe],
            teams: Vec::new(),
            check_ins: Vec::new(),
            preferences: Preferences {
                theme: Theme::Dark,
                sidebar_expanded: false,
            },
        }
    }

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let bytes = header.to_bytes();
        let restored = PersistenceHeader::from_bytes(&bytes).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let bytes1 = snapshot_to_bytes(&sample()).expect("first serialize");
        let restored = snapshot_from_bytes(&bytes1).expect("deserialize");
        assert_eq!(restored, sample());
        let bytes2 = snapshot_to_bytes(&restored).expect("second serialize");
        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(snapshot_from_bytes(&bytes).is_err());
    }

    #[test]
    fn short_data_rejected() {
        assert!(snapshot_from_bytes(b"OKR").is_err());
    }

    #[test]
    fn dangling_key_result_rejected() {
        let mut snapshot = sample();
        snapshot.key_results[0].objective_id = ObjectiveId(99);
        let err = snapshot.validate().expect_err("dangling");
        assert!(matches!(
            err,
            OkrError::InvalidReference {
                kind: "objective",
                id: 99
            }
        ));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut snapshot = sample();
        let copy = snapshot.objectives[0].clone();
        snapshot.objectives.push(copy);
        assert!(matches!(snapshot.validate(), Err(OkrError::Validation(_))));
    }

    #[test]
    fn duplicate_check_in_ids_rejected() {
        let mut snapshot = sample();
        let check_in = CheckIn {
            id: CheckInId(1),
            key_result_id: KeyResultId(1),
            previous_value: 0.0,
            new_value: 40.0,
            previous_progress: Percent::ZERO,
            new_progress: Percent::new(40.0),
            improvement: 40.0,
            note: String::new(),
            confidence: Confidence::High,
            created_at: snapshot.key_results[0].created_at,
        };
        snapshot.check_ins = vec![check_in.clone()];
        assert!(snapshot.validate().is_ok());

        snapshot.check_ins.push(CheckIn {
            new_value: 55.0,
            ..check_in
        });
        assert!(matches!(snapshot.validate(), Err(OkrError::Validation(_))));
    }
}
