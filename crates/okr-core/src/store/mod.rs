//! # Record Storage
//!
//! Keyed record storage shared by the in-memory and redb backends.
//!
//! Every record lives in a named table under a `u64` id and is stored as
//! postcard bytes. Backends only implement four raw operations; typed
//! access (`get`, `list`, `put`, `remove`, `insert`) is provided on top.
//!
//! Writes go through a [`WriteBatch`] so that multi-record changes (cascade
//! deletes, snapshot imports) commit atomically.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::model::{Cadence, CheckIn, KeyResult, Objective, Preferences, Team, Timeframe};
use crate::types::OkrError;
use serde::Serialize;
use serde::de::DeserializeOwned;

// =============================================================================
// TABLES
// =============================================================================

pub const OBJECTIVES: &str = "objectives";
pub const KEY_RESULTS: &str = "key_results";
pub const CADENCES: &str = "cadences";
pub const TIMEFRAMES: &str = "timeframes";
pub const TEAMS: &str = "teams";
pub const CHECK_INS: &str = "check_ins";
pub const PREFERENCES: &str = "preferences";

/// Every record table, in snapshot order.
pub const TABLES: [&str; 7] = [
    OBJECTIVES,
    KEY_RESULTS,
    CADENCES,
    TIMEFRAMES,
    TEAMS,
    CHECK_INS,
    PREFERENCES,
];

/// Fixed key of the single preferences record.
pub const PREFERENCES_KEY: u64 = 1;

// =============================================================================
// RECORD TRAIT
// =============================================================================

/// A storable entity.
pub trait Record: Serialize + DeserializeOwned {
    /// Human name used in error messages.
    const KIND: &'static str;
    /// Backing table name.
    const TABLE: &'static str;

    /// Storage key.
    fn key(&self) -> u64;

    /// Error for a missing record of this kind.
    fn not_found(id: u64) -> OkrError {
        OkrError::NotFound {
            kind: Self::KIND,
            id,
        }
    }
}

macro_rules! impl_record {
    ($ty:ty, $kind:literal, $table:expr) => {
        impl Record for $ty {
            const KIND: &'static str = $kind;
            const TABLE: &'static str = $table;

            fn key(&self) -> u64 {
                self.id.value()
            }
        }
    };
}

impl_record!(Objective, "objective", OBJECTIVES);
impl_record!(KeyResult, "key result", KEY_RESULTS);
impl_record!(Cadence, "cadence", CADENCES);
impl_record!(Timeframe, "timeframe", TIMEFRAMES);
impl_record!(Team, "team", TEAMS);
impl_record!(CheckIn, "check-in", CHECK_INS);

impl Record for Preferences {
    const KIND: &'static str = "preferences";
    const TABLE: &'static str = PREFERENCES;

    fn key(&self) -> u64 {
        PREFERENCES_KEY
    }
}

/// Encode a record as postcard bytes.
pub fn encode<R: Record>(record: &R) -> Result<Vec<u8>, OkrError> {
    postcard::to_stdvec(record).map_err(|e| OkrError::SerializationError(e.to_string()))
}

/// Decode postcard bytes into a record.
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R, OkrError> {
    postcard::from_bytes(bytes).map_err(|e| {
        OkrError::SerializationError(format!("Failed to decode {}: {}", R::KIND, e))
    })
}

// =============================================================================
// WRITE BATCH
// =============================================================================

/// A single raw write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put {
        table: &'static str,
        key: u64,
        bytes: Vec<u8>,
    },
    Remove {
        table: &'static str,
        key: u64,
    },
    /// Remove every record of a table.
    Clear { table: &'static str },
}

/// Ordered writes committed in one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an upsert of `record`.
    pub fn put<R: Record>(&mut self, record: &R) -> Result<&mut Self, OkrError> {
        self.ops.push(WriteOp::Put {
            table: R::TABLE,
            key: record.key(),
            bytes: encode(record)?,
        });
        Ok(self)
    }

    /// Queue removal of the record `key` of type `R`.
    pub fn remove<R: Record>(&mut self, key: u64) -> &mut Self {
        self.ops.push(WriteOp::Remove {
            table: R::TABLE,
            key,
        });
        self
    }

    /// Queue removal of every record in `table`.
    pub fn clear(&mut self, table: &'static str) -> &mut Self {
        self.ops.push(WriteOp::Clear { table });
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Consume the batch, yielding its operations in order.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Storage backend for OKR records.
///
/// Ids handed out by [`OkrStore::next_id`] are never reused within a table,
/// and commits raise the table counter past every key they write.
pub trait OkrStore {
    /// Raw bytes of one record.
    fn read(&self, table: &'static str, key: u64) -> Result<Option<Vec<u8>>, OkrError>;

    /// Raw bytes of every record in a table, in key order.
    fn scan(&self, table: &'static str) -> Result<Vec<(u64, Vec<u8>)>, OkrError>;

    /// Allocate the next id for a table.
    fn next_id(&mut self, table: &'static str) -> Result<u64, OkrError>;

    /// Apply a batch atomically.
    fn commit(&mut self, batch: WriteBatch) -> Result<(), OkrError>;

    /// Look up a record by id.
    fn get<R: Record>(&self, id: u64) -> Result<Option<R>, OkrError> {
        self.read(R::TABLE, id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Look up a record, failing with `NotFound`.
    fn fetch<R: Record>(&self, id: u64) -> Result<R, OkrError> {
        self.get(id)?.ok_or_else(|| R::not_found(id))
    }

    /// Check if a record exists.
    fn contains<R: Record>(&self, id: u64) -> Result<bool, OkrError> {
        Ok(self.read(R::TABLE, id)?.is_some())
    }

    /// All records of a type, in id order.
    fn list<R: Record>(&self) -> Result<Vec<R>, OkrError> {
        self.scan(R::TABLE)?
            .iter()
            .map(|(_, bytes)| decode(bytes))
            .collect()
    }

    /// Upsert a record.
    fn put<R: Record>(&mut self, record: &R) -> Result<(), OkrError> {
        let mut batch = WriteBatch::new();
        batch.put(record)?;
        self.commit(batch)
    }

    /// Remove a record. Returns `false` if it did not exist.
    fn remove<R: Record>(&mut self, id: u64) -> Result<bool, OkrError> {
        if !self.contains::<R>(id)? {
            return Ok(false);
        }
        let mut batch = WriteBatch::new();
        batch.remove::<R>(id);
        self.commit(batch)?;
        Ok(true)
    }

    /// Allocate an id, build the record with it and store it.
    fn insert<R: Record>(&mut self, build: impl FnOnce(u64) -> R) -> Result<R, OkrError> {
        let id = self.next_id(R::TABLE)?;
        let record = build(id);
        self.put(&record)?;
        Ok(record)
    }
}

// =============================================================================
// TESTS
// =============================================================================
