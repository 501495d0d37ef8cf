//! # Formats
//!
//! Serialization formats for workspace data.

pub mod persistence;

pub use persistence::{
    MAX_PERSISTENCE_PAYLOAD_SIZE, PersistenceHeader, WorkspaceSnapshot, snapshot_from_bytes,
    snapshot_to_bytes,
};
