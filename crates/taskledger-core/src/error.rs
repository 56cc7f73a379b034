use thiserror::Error;

use taskledger_model::{EventError, ModelError};

use crate::{platform::PlatformError, store::StoreError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("rejected notification: {0}")]
    Event(#[from] EventError),

    #[error("invalid observation: {0}")]
    Model(#[from] ModelError),

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    #[error("platform query failed: {0}")]
    Platform(#[from] PlatformError),
}

impl CoreError {
    /// `true` for input-validation failures that no retry can fix.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CoreError::Event(_) | CoreError::Model(_))
    }
}
