use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;

use taskledger_model::{TaskId, TaskRecord};

use super::{PutOutcome, RecordStore, StopUpdate, StoreError};

/// In-memory record store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<TaskId, TaskRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all records.
    pub fn list_all(&self) -> Vec<TaskRecord> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.values().cloned().collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.get(task_id).cloned())
    }

    async fn create(&self, record: &TaskRecord) -> Result<PutOutcome, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.contains_key(&record.task_id) {
            return Ok(PutOutcome::AlreadyExists);
        }
        inner.insert(record.task_id.clone(), record.clone());
        Ok(PutOutcome::Created)
    }

    async fn update_stop(
        &self,
        task_id: &str,
        update: StopUpdate,
    ) -> Result<TaskRecord, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let record = inner
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        record.stop = update.into();
        Ok(record.clone())
    }
}
