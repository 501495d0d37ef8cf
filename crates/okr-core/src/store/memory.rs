//! In-memory record store.
//!
//! `BTreeMap`-backed so that listing order is deterministic. Volatile
//! unless exported as a snapshot.

use super::{OkrStore, WriteBatch, WriteOp};
use crate::types::OkrError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<&'static str, BTreeMap<u64, Vec<u8>>>,
    counters: BTreeMap<&'static str, u64>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_counter(&mut self, table: &'static str, key: u64) {
        let counter = self.counters.entry(table).or_insert(1);
        *counter = (*counter).max(key.saturating_add(1));
    }
}

impl OkrStore for MemoryStore {
    fn read(&self, table: &'static str, key: u64) -> Result<Option<Vec<u8>>, OkrError> {
        Ok(self
            .tables
            .get(table)
            .and_then(|rows| rows.get(&key))
            .cloned())
    }

    fn scan(&self, table: &'static str) -> Result<Vec<(u64, Vec<u8>)>, OkrError> {
        Ok(self
            .tables
            .get(table)
            .map(|rows| rows.iter().map(|(k, v)| (*k, v.clone())).collect())
            .unwrap_or_default())
    }

    fn next_id(&mut self, table: &'static str) -> Result<u64, OkrError> {
        let counter = self.counters.entry(table).or_insert(1);
        let id = *counter;
        *counter = id
            .checked_add(1)
            .ok_or_else(|| OkrError::IoError(format!("{} id space exhausted", table)))?;
        Ok(id)
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), OkrError> {
        for op in batch.into_ops() {
            match op {
                WriteOp::Put { table, key, bytes } => {
                    self.tables.entry(table).or_default().insert(key, bytes);
                    self.bump_counter(table, key);
                }
                WriteOp::Remove { table, key } => {
                    if let Some(rows) = self.tables.get_mut(table) {
                        rows.remove(&key);
                    }
                }
                WriteOp::Clear { table } => {
                    self.tables.remove(table);
                }
            }
        }
        Ok(())
    }
}
