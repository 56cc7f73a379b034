use serde::{Deserialize, Serialize};

use super::{
    HostMetadata, INSTANCE_ID_UNKNOWN, STILL_RUNNING, StopState, TaskId, TaskRecord, Timestamp,
};
use crate::ModelError;

/// Flat, string-typed form of a [`TaskRecord`] as held by the record store.
///
/// Placeholders (`STILL-RUNNING`, `INSTANCE_ID_UNKNOWN`, ...) only exist at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordItem {
    pub task_arn: TaskId,
    pub region: String,
    pub cluster_arn: String,
    pub launch_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    pub container_instance_arn: String,
    pub instance_id: String,
    pub instance_type: String,
    pub os_type: String,
    pub group: String,
    pub group_name: String,
    pub started_at: String,
    pub stopped_at: String,
    pub run_time: u64,
}

/// Name of the key attribute.
pub const KEY_ATTRIBUTE: &str = "taskArn";

impl From<&TaskRecord> for RecordItem {
    fn from(record: &TaskRecord) -> Self {
        let (instance_type, os_type, instance_id) = record.host.triple();
        let stopped_at = match &record.stop {
            StopState::Running => STILL_RUNNING.to_string(),
            StopState::Stopped { at, .. } => at.to_string(),
        };

        RecordItem {
            task_arn: record.task_id.clone(),
            region: record.region.clone(),
            cluster_arn: record.cluster_id.clone(),
            launch_type: record.launch_mode.as_str().to_string(),
            cpu: record.cpu.clone(),
            memory: record.memory.clone(),
            container_instance_arn: record
                .container_instance_ref
                .clone()
                .unwrap_or_else(|| INSTANCE_ID_UNKNOWN.to_string()),
            instance_id: instance_id.to_string(),
            instance_type: instance_type.to_string(),
            os_type: os_type.to_string(),
            group: record.group.clone(),
            group_name: record.group_name.clone(),
            started_at: record.started_at.to_string(),
            stopped_at,
            run_time: record.stop.run_time_seconds(),
        }
    }
}

impl TryFrom<RecordItem> for TaskRecord {
    type Error = ModelError;

    fn try_from(item: RecordItem) -> Result<Self, Self::Error> {
        let invalid = |e: ModelError| ModelError::InvalidItem(format!("{}: {e}", item.task_arn));

        let launch_mode = item.launch_type.parse().map_err(invalid)?;
        let started_at = Timestamp::parse(&item.started_at).map_err(invalid)?;
        let stop = if item.stopped_at == STILL_RUNNING {
            StopState::Running
        } else {
            StopState::Stopped {
                at: Timestamp::parse(&item.stopped_at).map_err(invalid)?,
                run_time_seconds: item.run_time,
            }
        };
        let host = HostMetadata::from_stored(&item.instance_id, &item.instance_type, &item.os_type);
        let container_instance_ref =
            (item.container_instance_arn != INSTANCE_ID_UNKNOWN).then_some(item.container_instance_arn);

        Ok(TaskRecord {
            task_id: item.task_arn,
            region: item.region,
            cluster_id: item.cluster_arn,
            launch_mode,
            cpu: item.cpu,
            memory: item.memory,
            container_instance_ref,
            host,
            group: item.group,
            group_name: item.group_name,
            started_at,
            stop,
        })
    }
}
