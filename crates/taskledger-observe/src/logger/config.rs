use std::io::IsTerminal;

use crate::logger::{ENV_LEVEL_OVERRIDE, ENV_LOG_FORMAT, error::LoggerError, format::LoggerFormat};

/// Stream formatted events go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogWriter {
    Stdout,
    Stderr,
}

impl LogWriter {
    fn is_terminal(self) -> bool {
        match self {
            LogWriter::Stdout => std::io::stdout().is_terminal(),
            LogWriter::Stderr => std::io::stderr().is_terminal(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// Filter directives, e.g. `info` or `taskledger_core=debug`.
    pub level: String,
    /// Environment variable whose directives replace `level` when set and non-blank.
    pub level_override: Option<String>,
    pub writer: LogWriter,
    pub with_targets: bool,
    pub use_color: bool,
}

impl LoggerConfig {
    /// Settings for the taskledger binaries.
    ///
    /// Logs go to stderr since stdout carries the command result. `RUST_LOG`
    /// overrides the level, `TASKLEDGER_LOG_FORMAT` picks the format.
    pub fn for_verbosity(verbose: bool) -> Result<Self, LoggerError> {
        Self::from_lookup(verbose, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(verbose: bool, lookup: F) -> Result<Self, LoggerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match lookup(ENV_LOG_FORMAT) {
            Some(raw) => raw.parse()?,
            None => LoggerFormat::Text,
        };
        let writer = LogWriter::Stderr;
        Ok(Self {
            format,
            level: if verbose { "debug" } else { "info" }.to_string(),
            level_override: Some(ENV_LEVEL_OVERRIDE.to_string()),
            writer,
            with_targets: true,
            use_color: format == LoggerFormat::Text && writer.is_terminal(),
        })
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            level_override: None,
            writer: LogWriter::Stderr,
            with_targets: true,
            use_color: LogWriter::Stderr.is_terminal(),
        }
    }
}
