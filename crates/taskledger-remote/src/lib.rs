//! HTTP clients for the orchestration platform's query API and the key-value
//! record store, both spoken as JSON-over-POST with an `X-Amz-Target` operation header.
//!
//! Requests are not signed; point the endpoints at a local emulator or a signing proxy.

mod attr;

mod client;
pub use client::JsonClient;

mod error;
pub use error::RemoteError;

mod platform;
pub use platform::RemotePlatform;

mod store;
pub use store::RemoteStore;

use std::sync::Arc;

use taskledger_core::{FileStore, MemoryStore, RecordStore, StoreBackend, TrackerConfig};

/// Open the record store selected by `cfg.store`.
pub fn open_store(cfg: &TrackerConfig) -> Result<Arc<dyn RecordStore>, RemoteError> {
    Ok(match &cfg.store {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File(path) => Arc::new(FileStore::new(path)),
        StoreBackend::Remote => Arc::new(RemoteStore::from_config(cfg)?),
    })
}
