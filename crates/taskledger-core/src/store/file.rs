use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::PathBuf,
};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use taskledger_model::{RecordItem, TaskId, TaskRecord};

use super::{PutOutcome, RecordStore, StopUpdate, StoreError};

/// Record store backed by a single JSON document of items keyed by task id.
///
/// Writes replace the document through a sibling temp file and a rename.
/// The lock only serialises writers inside this process.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

type Document = BTreeMap<TaskId, RecordItem>;

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Document, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Document::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, doc: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(doc)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), items = doc.len(), "record file saved");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn get(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError> {
        let mut doc = self.load().await?;
        match doc.remove(task_id) {
            Some(item) => Ok(Some(TaskRecord::try_from(item)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, record: &TaskRecord) -> Result<PutOutcome, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if doc.contains_key(&record.task_id) {
            return Ok(PutOutcome::AlreadyExists);
        }
        doc.insert(record.task_id.clone(), RecordItem::from(record));
        self.save(&doc).await?;
        Ok(PutOutcome::Created)
    }

    async fn update_stop(
        &self,
        task_id: &str,
        update: StopUpdate,
    ) -> Result<TaskRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let item = doc
            .get(task_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;

        let mut record = TaskRecord::try_from(item)?;
        record.stop = update.into();
        doc.insert(task_id.to_string(), RecordItem::from(&record));
        self.save(&doc).await?;
        Ok(record)
    }
}
