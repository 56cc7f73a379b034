use super::{LaunchMode, TaskId, Timestamp};

/// A single sighting of a task, normalised from either entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskObservation {
    pub task_id: TaskId,
    pub region: String,
    pub cluster_id: String,
    pub launch_mode: LaunchMode,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    /// Composite group label, e.g. `service:web`.
    pub group: String,
    pub container_instance_ref: Option<String>,
    pub started_at: Option<Timestamp>,
    /// Present only when the task was observed in its terminal state.
    pub stopped_at: Option<Timestamp>,
}

impl TaskObservation {
    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }
}
