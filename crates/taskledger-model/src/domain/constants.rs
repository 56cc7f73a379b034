/// Placeholder stored for placement and instance ids that do not apply or could not be resolved.
pub const INSTANCE_ID_UNKNOWN: &str = "INSTANCE_ID_UNKNOWN";

/// Placeholder stored when the host instance type is not known.
pub const INSTANCE_TYPE_UNKNOWN: &str = "INSTANCE_TYPE_UNKNOWN";

/// OS family assumed when the host does not report one.
pub const DEFAULT_OS_FAMILY: &str = "linux";

/// `stoppedAt` value of a record whose task has not been observed stopped.
pub const STILL_RUNNING: &str = "STILL-RUNNING";

/// Group assigned to labels that carry no `group:` prefix.
pub const DEFAULT_GROUP: &str = "taskgroup";
