use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use taskledger_model::HostInfo;

/// Placement reference -> host lookup cache.
///
/// Entries never expire: a container instance keeps its host for the life of the process.
pub trait InstanceCache: Send + Sync {
    fn get(&self, instance_ref: &str) -> Option<HostInfo>;
    fn put(&self, instance_ref: String, info: HostInfo);
}

/// Process-local [`InstanceCache`].
#[derive(Default)]
pub struct MemoryInstanceCache {
    entries: RwLock<HashMap<String, HostInfo>>,
}

impl MemoryInstanceCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstanceCache for MemoryInstanceCache {
    fn get(&self, instance_ref: &str) -> Option<HostInfo> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(instance_ref).cloned()
    }

    fn put(&self, instance_ref: String, info: HostInfo) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(instance_ref, info);
    }
}
