use async_trait::async_trait;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Item, ListFilter, Record, RecordStore, StoreError};

/// Process-local table with the same contract as [`super::RedisTable`].
///
/// Items are kept encoded, so reads go through the same codec as the real
/// backend. A table starts unprovisioned; writes fail with
/// [`StoreError::TableMissing`] until [`RecordStore::ensure_table`] runs.
pub struct MemoryTable<R> {
    table: String,
    provisioned: AtomicBool,
    items: RwLock<HashMap<Uuid, Item>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> MemoryTable<R> {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            provisioned: AtomicBool::new(false),
            items: RwLock::new(HashMap::new()),
            _record: PhantomData,
        }
    }

    /// A table that is already provisioned.
    pub fn provisioned(table: impl Into<String>) -> Self {
        let store = Self::new(table);
        store.provisioned.store(true, Ordering::SeqCst);
        store
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn check_table(&self) -> Result<(), StoreError> {
        if self.provisioned.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::TableMissing {
                table: self.table.clone(),
            })
        }
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryTable<R> {
    async fn ensure_table(&self) -> Result<(), StoreError> {
        self.provisioned.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn put(&self, record: &R) -> Result<(), StoreError> {
        self.check_table()?;
        self.items.write().await.insert(record.id(), record.encode());
        Ok(())
    }

    async fn insert(&self, record: &R) -> Result<(), StoreError> {
        self.check_table()?;
        let mut items = self.items.write().await;
        if items.contains_key(&record.id()) {
            return Err(StoreError::Conflict { id: record.id() });
        }
        items.insert(record.id(), record.encode());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<R, StoreError> {
        self.check_table()?;
        let items = self.items.read().await;
        let item = items.get(&id).ok_or(StoreError::NotFound)?;
        R::decode(item)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.check_table()?;
        self.items.write().await.remove(&id);
        Ok(())
    }

    async fn list(&self, filter: Option<&ListFilter>, limit: usize) -> Result<Vec<R>, StoreError> {
        self.check_table()?;
        let items = self.items.read().await;
        items
            .values()
            .filter(|item| filter.map_or(true, |f| f.matches(item)))
            .take(limit)
            .map(R::decode)
            .collect()
    }
}
