use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::filter::ParseError;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?} (expected text, json or journald)")]
    UnknownFormat(String),
    #[error("journald output needs linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("connecting to journald: {0}")]
    Journald(#[source] std::io::Error),
    #[error("invalid log filter {directives:?}: {source}")]
    InvalidDirectives {
        directives: String,
        #[source]
        source: ParseError,
    },
    #[error("a global subscriber is already installed")]
    AlreadyInstalled(#[from] SetGlobalDefaultError),
}
