//! Durable key-value storage of task records.

use async_trait::async_trait;
use thiserror::Error;

use taskledger_model::{ModelError, StopState, TaskRecord, Timestamp};

mod file;
pub use file::FileStore;

mod memory;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("corrupt record: {0}")]
    Corrupt(#[from] ModelError),
}

/// Result of a create-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    /// A record with the same key already existed; nothing was written.
    AlreadyExists,
}

/// Fields written when a task is observed stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopUpdate {
    pub stopped_at: Timestamp,
    pub run_time_seconds: u64,
}

impl From<StopUpdate> for StopState {
    fn from(u: StopUpdate) -> Self {
        StopState::Stopped {
            at: u.stopped_at,
            run_time_seconds: u.run_time_seconds,
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn get(&self, task_id: &str) -> Result<Option<TaskRecord>, StoreError>;

    /// Write `record` only if no record with its key exists.
    async fn create(&self, record: &TaskRecord) -> Result<PutOutcome, StoreError>;

    /// Set the stop fields of an existing record and return the updated record.
    async fn update_stop(&self, task_id: &str, update: StopUpdate)
    -> Result<TaskRecord, StoreError>;
}
