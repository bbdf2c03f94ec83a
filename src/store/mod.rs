//! Persistence gateway.
//!
//! Records are stored as flat attribute maps of text values (see [`codec`]).
//! Each entity type lives in its own table, addressed by a fixed name from
//! the configuration. Two backends implement [`RecordStore`]: Redis for real
//! deployments and an in-process map for local runs and tests.

pub mod codec;
pub mod memory;
pub mod redis_table;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

pub use codec::Record;
pub use memory::MemoryTable;
pub use redis_table::RedisTable;

/// Native attribute representation of a stored record.
pub type Item = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table '{table}' does not exist in the backing store; check that the store is running and the table has been created")]
    TableMissing { table: String },

    #[error("could not reach the backing store: {0}")]
    Connection(String),

    #[error("record {id} already exists")]
    Conflict { id: Uuid },

    #[error("record not found")]
    NotFound,

    #[error("stored record has an invalid '{field}' attribute: {reason}")]
    Corrupt { field: &'static str, reason: String },

    #[error("backing store request failed: {0}")]
    Backend(String),
}

/// Attribute-equality predicate evaluated against encoded items during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub attribute: &'static str,
    pub value: String,
}

impl ListFilter {
    pub fn eq(attribute: &'static str, value: impl Into<String>) -> Self {
        Self {
            attribute,
            value: value.into(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        item.get(self.attribute).map(String::as_str) == Some(self.value.as_str())
    }
}

/// Gateway contract for one table of `R` records.
///
/// Implementations share one connection handle and need no client-side
/// locking; every call is a single request/response.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Creates the table if it is not registered yet.
    async fn ensure_table(&self) -> Result<(), StoreError>;

    /// Upsert by id.
    async fn put(&self, record: &R) -> Result<(), StoreError>;

    /// Like [`put`](Self::put) but fails with [`StoreError::Conflict`] when the id is taken.
    async fn insert(&self, record: &R) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<R, StoreError>;

    /// Removing an absent id is not an error.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Unordered scan returning at most `limit` records that pass `filter`.
    async fn list(&self, filter: Option<&ListFilter>, limit: usize) -> Result<Vec<R>, StoreError>;
}
