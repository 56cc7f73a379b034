use thiserror::Error;

use taskledger_core::{PlatformError, StoreError};

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status} {kind}: {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Exception name without its namespace (`com.amazonaws.ecs#ClusterNotFoundException`).
    pub fn api_kind(&self) -> Option<&str> {
        match self {
            RemoteError::Api { kind, .. } => Some(kind.rsplit('#').next().unwrap_or(kind)),
            _ => None,
        }
    }

    pub fn is_conditional_check_failed(&self) -> bool {
        self.api_kind() == Some("ConditionalCheckFailedException")
    }
}

impl From<RemoteError> for PlatformError {
    fn from(err: RemoteError) -> Self {
        let msg = err.to_string();
        match &err {
            RemoteError::Http(e) if e.is_timeout() => PlatformError::Timeout(msg),
            RemoteError::Http(e) if e.is_decode() => PlatformError::Malformed(msg),
            RemoteError::Http(_) => PlatformError::Transport(msg),
            RemoteError::InvalidResponse(_) => PlatformError::Malformed(msg),
            RemoteError::Api { status, .. } => {
                let kind = err.api_kind().unwrap_or_default();
                if kind.contains("NotFound") || *status == 404 {
                    PlatformError::NotFound(msg)
                } else if kind.contains("AccessDenied")
                    || kind.contains("UnrecognizedClient")
                    || *status == 401
                    || *status == 403
                {
                    PlatformError::AccessDenied(msg)
                } else if kind.contains("Throttling") || *status == 408 || *status == 504 {
                    PlatformError::Timeout(msg)
                } else {
                    PlatformError::Transport(msg)
                }
            }
        }
    }
}

impl From<RemoteError> for StoreError {
    fn from(err: RemoteError) -> Self {
        StoreError::Backend(err.to_string())
    }
}
