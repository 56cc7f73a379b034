mod constants;
pub use constants::*;

mod launch_mode;
pub use launch_mode::LaunchMode;

mod timestamp;
pub use timestamp::{Timestamp, run_time_seconds};

mod group;
pub use group::split_group;

mod host;
pub use host::{HostInfo, HostMetadata};

mod record;
pub use record::{StopState, TaskRecord};

mod observation;
pub use observation::TaskObservation;

mod item;
pub use item::{KEY_ATTRIBUTE, RecordItem};

/// Opaque task identifier (the task reference issued by the platform).
pub type TaskId = String;
