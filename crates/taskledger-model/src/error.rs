use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid launch mode: {0} (expected: EC2|EXTERNAL|FARGATE)")]
    InvalidLaunchMode(String),

    #[error("invalid stored item: {0}")]
    InvalidItem(String),
}

/// Input-validation failures for inbound task state-change notifications.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("malformed notification: {0}")]
    Malformed(String),

    #[error("unsupported event source {0:?}")]
    WrongSource(String),

    #[error("unsupported detail-type {0:?}")]
    WrongDetailType(String),

    #[error("task has not settled: lastStatus={last} desiredStatus={desired}")]
    Unsettled { last: String, desired: String },

    #[error("invalid notification detail: {0}")]
    InvalidDetail(#[from] ModelError),
}
