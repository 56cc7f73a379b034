mod config;
mod error;
mod format;
mod install;

pub use config::{LogWriter, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Environment variable selecting the output format (`text`, `json`, `journald`).
pub const ENV_LOG_FORMAT: &str = "TASKLEDGER_LOG_FORMAT";

/// Environment variable the binaries read filter directives from.
pub const ENV_LEVEL_OVERRIDE: &str = "RUST_LOG";

pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    install::install(cfg, |key| std::env::var(key).ok())
}
