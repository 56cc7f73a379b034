//! Task lifecycle reconciliation.
//!
//! Both entry points (state-change notifications and the backfill pass) feed
//! [`TaskObservation`]s into one [`UpsertEngine`], which decides whether to
//! create, update or skip the stored [`TaskRecord`].
//!
//! [`TaskObservation`]: taskledger_model::TaskObservation
//! [`TaskRecord`]: taskledger_model::TaskRecord

pub mod error;
pub use error::CoreError;

pub mod config;
pub use config::{ConfigError, StoreBackend, TrackerConfig};

pub mod platform;
pub use platform::{InstanceAttribute, InstanceDetail, PlatformApi, PlatformError, TaskDetail, TaskPage};

pub mod store;
pub use store::{FileStore, MemoryStore, PutOutcome, RecordStore, StopUpdate, StoreError};

pub mod resolver;
pub use resolver::{InstanceCache, InstanceResolver, MemoryInstanceCache};

mod upsert;
pub use upsert::{Decision, SkipReason, UpsertEngine};

mod handler;
pub use handler::EventHandler;

mod backfill;
pub use backfill::{BackfillDriver, BackfillReport};

#[cfg(test)]
mod testing;
