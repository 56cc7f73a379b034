//! Read-only view of the orchestration platform's query API.

use async_trait::async_trait;
use thiserror::Error;

use taskledger_model::{LaunchMode, TaskObservation, Timestamp, event::STATUS_STOPPED};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl PlatformError {
    /// Failure kinds the caller anticipates (missing resources, permissions, slowness).
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            PlatformError::NotFound(_) | PlatformError::AccessDenied(_) | PlatformError::Timeout(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PlatformError::NotFound(_) => "not-found",
            PlatformError::AccessDenied(_) => "access-denied",
            PlatformError::Timeout(_) => "timeout",
            PlatformError::Transport(_) => "transport",
            PlatformError::Malformed(_) => "malformed",
        }
    }
}

/// One page of task identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPage {
    pub task_ids: Vec<String>,
    pub next_cursor: Option<String>,
}

/// Full description of a task as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub task_arn: String,
    pub cluster_arn: String,
    pub launch_type: LaunchMode,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub group: String,
    pub container_instance_arn: Option<String>,
    pub last_status: String,
    pub started_at: Option<Timestamp>,
    pub stopped_at: Option<Timestamp>,
}

impl TaskDetail {
    /// Observation for the discovery path.
    ///
    /// A stop is reported only once the task has reached `STOPPED`; a task
    /// that is merely stopping is still observed as running.
    pub fn into_observation(self, region: &str) -> TaskObservation {
        let stopped_at = if self.last_status == STATUS_STOPPED {
            self.stopped_at
        } else {
            None
        };
        TaskObservation {
            task_id: self.task_arn,
            region: region.to_string(),
            cluster_id: self.cluster_arn,
            launch_mode: self.launch_type,
            cpu: self.cpu,
            memory: self.memory,
            group: self.group,
            container_instance_ref: self.container_instance_arn,
            started_at: self.started_at,
            stopped_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceAttribute {
    pub name: String,
    pub value: Option<String>,
}

impl InstanceAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Description of a container instance (host).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDetail {
    pub container_instance_arn: String,
    pub ec2_instance_id: Option<String>,
    pub attributes: Vec<InstanceAttribute>,
}

impl InstanceDetail {
    /// Value of an attribute, matching either the bare key (`os-type`) or the
    /// platform-qualified one (`ecs.os-type`).
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == key || a.name.strip_prefix("ecs.") == Some(key))
            .and_then(|a| a.value.as_deref())
    }
}

#[async_trait]
pub trait PlatformApi: Send + Sync + 'static {
    async fn list_clusters(&self) -> Result<Vec<String>, PlatformError>;

    async fn list_tasks(
        &self,
        cluster: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<TaskPage, PlatformError>;

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_ids: &[String],
    ) -> Result<Vec<TaskDetail>, PlatformError>;

    async fn describe_container_instances(
        &self,
        cluster: &str,
        instance_refs: &[String],
    ) -> Result<Vec<InstanceDetail>, PlatformError>;
}
