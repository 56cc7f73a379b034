//! Resolution of a task's placement reference to host instance metadata.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use taskledger_model::{HostInfo, HostMetadata, LaunchMode};

use crate::platform::{PlatformApi, PlatformError};

mod cache;
pub use cache::{InstanceCache, MemoryInstanceCache};

const ATTR_INSTANCE_TYPE: &str = "instance-type";
const ATTR_OS_TYPE: &str = "os-type";

/// Resolves container instances to their hosts, caching successful lookups.
///
/// Resolution never fails: any lookup problem yields [`HostMetadata::Unresolved`].
#[derive(Clone)]
pub struct InstanceResolver {
    platform: Arc<dyn PlatformApi>,
    cache: Arc<dyn InstanceCache>,
}

impl InstanceResolver {
    pub fn new(platform: Arc<dyn PlatformApi>, cache: Arc<dyn InstanceCache>) -> Self {
        Self { platform, cache }
    }

    pub fn with_memory_cache(platform: Arc<dyn PlatformApi>) -> Self {
        Self::new(platform, Arc::new(MemoryInstanceCache::new()))
    }

    #[instrument(level = "debug", skip(self), fields(cluster = %cluster_id))]
    pub async fn resolve(
        &self,
        cluster_id: &str,
        instance_ref: Option<&str>,
        launch_mode: LaunchMode,
    ) -> HostMetadata {
        if launch_mode.is_serverless() {
            return HostMetadata::Unresolved;
        }
        let Some(instance_ref) = instance_ref else {
            debug!("hosted task without a container instance reference");
            return HostMetadata::Unresolved;
        };

        if let Some(info) = self.cache.get(instance_ref) {
            debug!(instance_ref, "host metadata cache hit");
            return HostMetadata::Resolved(info);
        }

        match self.lookup(cluster_id, instance_ref).await {
            Ok(info) => {
                self.cache.put(instance_ref.to_string(), info.clone());
                HostMetadata::Resolved(info)
            }
            Err(e) if e.is_expected() => {
                debug!(instance_ref, kind = e.kind(), "host lookup failed: {e}");
                HostMetadata::Unresolved
            }
            Err(e) => {
                warn!(instance_ref, kind = e.kind(), "unexpected host lookup failure: {e}");
                HostMetadata::Unresolved
            }
        }
    }

    async fn lookup(&self, cluster_id: &str, instance_ref: &str) -> Result<HostInfo, PlatformError> {
        let instances = self
            .platform
            .describe_container_instances(cluster_id, &[instance_ref.to_string()])
            .await?;
        let instance = instances
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::NotFound(instance_ref.to_string()))?;

        let instance_id = instance.ec2_instance_id.clone().ok_or_else(|| {
            PlatformError::Malformed(format!("{instance_ref}: missing ec2InstanceId"))
        })?;

        Ok(HostInfo {
            instance_id,
            instance_type: instance.attribute(ATTR_INSTANCE_TYPE).map(str::to_string),
            os_family: instance.attribute(ATTR_OS_TYPE).map(str::to_string),
        })
    }
}
