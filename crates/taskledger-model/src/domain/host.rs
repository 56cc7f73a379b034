use super::{DEFAULT_OS_FAMILY, INSTANCE_ID_UNKNOWN, INSTANCE_TYPE_UNKNOWN};

/// Host attributes of a resolved container instance.
///
/// Attributes the instance did not report are kept as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub instance_id: String,
    pub instance_type: Option<String>,
    pub os_family: Option<String>,
}

/// Result of resolving a task's placement to its underlying host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HostMetadata {
    Resolved(HostInfo),
    /// Serverless placement, missing placement reference, or a failed lookup.
    #[default]
    Unresolved,
}

impl HostMetadata {
    pub fn instance_id(&self) -> &str {
        match self {
            HostMetadata::Resolved(info) => &info.instance_id,
            HostMetadata::Unresolved => INSTANCE_ID_UNKNOWN,
        }
    }

    pub fn instance_type(&self) -> &str {
        match self {
            HostMetadata::Resolved(HostInfo {
                instance_type: Some(t),
                ..
            }) => t,
            _ => INSTANCE_TYPE_UNKNOWN,
        }
    }

    pub fn os_family(&self) -> &str {
        match self {
            HostMetadata::Resolved(HostInfo {
                os_family: Some(os),
                ..
            }) => os,
            _ => DEFAULT_OS_FAMILY,
        }
    }

    /// Stored triple in `(instanceType, osFamily, instanceId)` order.
    pub fn triple(&self) -> (&str, &str, &str) {
        (self.instance_type(), self.os_family(), self.instance_id())
    }

    /// Rebuild from stored strings, mapping placeholders back to absent values.
    pub fn from_stored(instance_id: &str, instance_type: &str, os_family: &str) -> Self {
        if instance_id == INSTANCE_ID_UNKNOWN {
            return HostMetadata::Unresolved;
        }
        HostMetadata::Resolved(HostInfo {
            instance_id: instance_id.to_string(),
            instance_type: (instance_type != INSTANCE_TYPE_UNKNOWN).then(|| instance_type.to_string()),
            os_family: Some(os_family.to_string()),
        })
    }
}
