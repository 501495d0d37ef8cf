//! # redb-backed Record Storage
//!
//! A disk-backed record store using the redb embedded database.
//!
//! - One redb table per record kind: `u64` id -> postcard bytes
//! - Id counters in a `metadata` table, written in the same transaction
//!   as the records they cover
//! - Every [`WriteBatch`] is a single ACID write transaction

use super::{OkrStore, TABLES, WriteBatch, WriteOp};
use crate::types::OkrError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;

/// Table for id counters: table name -> next id
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

fn record_table(table: &str) -> TableDefinition<'_, u64, &'static [u8]> {
    TableDefinition::new(table)
}

fn io_err(e: impl std::fmt::Display) -> OkrError {
    OkrError::IoError(e.to_string())
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// In-memory copy of the id counters.
    counters: BTreeMap<&'static str, u64>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OkrError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            for table in TABLES {
                let _ = write_txn.open_table(record_table(table)).map_err(io_err)?;
            }
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        // Load counters
        let counters = {
            let read_txn = db.begin_read().map_err(io_err)?;
            let table = read_txn.open_table(METADATA).map_err(io_err)?;
            let mut counters = BTreeMap::new();
            for name in TABLES {
                if let Some(value) = table.get(name).map_err(io_err)? {
                    counters.insert(name, value.value());
                }
            }
            counters
        };

        tracing::debug!(counters = ?counters, "Opened redb store");
        Ok(Self { db, counters })
    }

    fn counter(&self, table: &'static str) -> u64 {
        self.counters.get(table).copied().unwrap_or(1)
    }
}

impl OkrStore for RedbStore {
    fn read(&self, table: &'static str, key: u64) -> Result<Option<Vec<u8>>, OkrError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let records = read_txn.open_table(record_table(table)).map_err(io_err)?;
        Ok(records
            .get(key)
            .map_err(io_err)?
            .map(|data| data.value().to_vec()))
    }

    fn scan(&self, table: &'static str) -> Result<Vec<(u64, Vec<u8>)>, OkrError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let records = read_txn.open_table(record_table(table)).map_err(io_err)?;
        let mut rows = Vec::new();
        for entry in records.iter().map_err(io_err)? {
            let (key, value) = entry.map_err(io_err)?;
            rows.push((key.value(), value.value().to_vec()));
        }
        Ok(rows)
    }

    fn next_id(&mut self, table: &'static str) -> Result<u64, OkrError> {
        let id = self.counter(table);
        let next = id
            .checked_add(1)
            .ok_or_else(|| OkrError::IoError(format!("{} id space exhausted", table)))?;
        self.counters.insert(table, next);
        Ok(id)
    }

    fn commit(&mut self, batch: WriteBatch) -> Result<(), OkrError> {
        if batch.is_empty() {
            return Ok(());
        }
        tracing::trace!(ops = batch.len(), "Committing write batch");
        let mut counters = self.counters.clone();
        let write_txn = self.db.begin_write().map_err(io_err)?;

        for op in batch.into_ops() {
            match op {
                WriteOp::Put { table, key, bytes } => {
                    let mut records = write_txn.open_table(record_table(table)).map_err(io_err)?;
                    records.insert(key, bytes.as_slice()).map_err(io_err)?;
                    let counter = counters.entry(table).or_insert(1);
                    *counter = (*counter).max(key.saturating_add(1));
                }
                WriteOp::Remove { table, key } => {
                    let mut records = write_txn.open_table(record_table(table)).map_err(io_err)?;
                    records.remove(key).map_err(io_err)?;
                }
                WriteOp::Clear { table } => {
                    let mut records = write_txn.open_table(record_table(table)).map_err(io_err)?;
                    let keys = records
                        .iter()
                        .map_err(io_err)?
                        .map(|entry| entry.map(|(k, _)| k.value()))
                        .collect::<Result<Vec<u64>, _>>()
                        .map_err(io_err)?;
                    for key in keys {
                        records.remove(key).map_err(io_err)?;
                    }
                }
            }
        }

        {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            for (table, next) in &counters {
                meta.insert(*table, *next).map_err(io_err)?;
            }
        }

        write_txn.commit().map_err(io_err)?;
        self.counters = counters;
        Ok(())
    }
}
