//! Inbound task state-change notification.
//!
//! The payload is parsed into a strict schema first and validated second, so
//! a notification either becomes a [`TaskObservation`] or an [`EventError`].

use serde::Deserialize;

use crate::{EventError, LaunchMode, ModelError, TaskObservation, Timestamp};

pub const EVENT_SOURCE: &str = "aws.ecs";
pub const EVENT_DETAIL_TYPE: &str = "ECS Task State Change";
pub const STATUS_STOPPED: &str = "STOPPED";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskStateChangeEvent {
    pub source: String,
    pub detail_type: String,
    pub region: String,
    pub detail: TaskStateDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStateDetail {
    pub task_arn: String,
    pub cluster_arn: String,
    pub last_status: String,
    pub desired_status: String,
    pub launch_type: String,
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub memory: Option<String>,
    pub group: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub stopped_at: Option<String>,
    #[serde(default)]
    pub container_instance_arn: Option<String>,
}

impl TaskStateChangeEvent {
    pub fn from_json(raw: &str) -> Result<Self, EventError> {
        serde_json::from_str(raw).map_err(|e| EventError::Malformed(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, EventError> {
        serde_json::from_value(value).map_err(|e| EventError::Malformed(e.to_string()))
    }

    /// Check the envelope and that the task has settled into its desired status.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.source != EVENT_SOURCE {
            return Err(EventError::WrongSource(self.source.clone()));
        }
        if self.detail_type != EVENT_DETAIL_TYPE {
            return Err(EventError::WrongDetailType(self.detail_type.clone()));
        }
        if self.detail.last_status != self.detail.desired_status {
            return Err(EventError::Unsettled {
                last: self.detail.last_status.clone(),
                desired: self.detail.desired_status.clone(),
            });
        }
        Ok(())
    }

    pub fn is_stopped(&self) -> bool {
        self.detail.last_status == STATUS_STOPPED
    }

    /// Validate and convert into an observation.
    pub fn into_observation(self) -> Result<TaskObservation, EventError> {
        self.validate()?;
        let stopped = self.is_stopped();
        let d = self.detail;

        let launch_mode: LaunchMode = d.launch_type.parse()?;
        let started_at = d.started_at.as_deref().map(Timestamp::parse).transpose()?;
        let stopped_at = if stopped {
            let raw = d
                .stopped_at
                .as_deref()
                .ok_or(ModelError::MissingField("stoppedAt"))?;
            Some(Timestamp::parse(raw)?)
        } else {
            None
        };

        Ok(TaskObservation {
            task_id: d.task_arn,
            region: self.region,
            cluster_id: d.cluster_arn,
            launch_mode,
            cpu: d.cpu,
            memory: d.memory,
            group: d.group,
            container_instance_ref: d.container_instance_arn,
            started_at,
            stopped_at,
        })
    }
}
