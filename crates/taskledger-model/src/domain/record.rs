use super::{HostMetadata, LaunchMode, TaskId, Timestamp};

/// Whether the task has been observed stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopState {
    #[default]
    Running,
    Stopped {
        at: Timestamp,
        run_time_seconds: u64,
    },
}

impl StopState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, StopState::Stopped { .. })
    }

    pub fn run_time_seconds(&self) -> u64 {
        match self {
            StopState::Running => 0,
            StopState::Stopped {
                run_time_seconds, ..
            } => *run_time_seconds,
        }
    }
}

/// Durable record of one task, keyed by [`TaskRecord::task_id`].
///
/// Everything except [`TaskRecord::stop`] is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub region: String,
    pub cluster_id: String,
    pub launch_mode: LaunchMode,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    /// Placement reference; `None` for serverless tasks.
    pub container_instance_ref: Option<String>,
    pub host: HostMetadata,
    pub group: String,
    pub group_name: String,
    pub started_at: Timestamp,
    pub stop: StopState,
}
