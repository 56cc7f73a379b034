use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::OffsetTime, writer::BoxMakeWriter},
    layer::SubscriberExt,
};

use crate::logger::{
    config::{LogWriter, LoggerConfig},
    error::LoggerError,
    format::LoggerFormat,
};

type OutputLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the process-wide subscriber described by `cfg`.
///
/// `lookup` resolves the override variable named in `cfg.level_override`.
pub(crate) fn install<F>(cfg: &LoggerConfig, lookup: F) -> Result<(), LoggerError>
where
    F: Fn(&str) -> Option<String>,
{
    let filter = build_filter(cfg, lookup)?;
    let output = build_output(cfg)?;
    let subscriber = tracing_subscriber::registry().with(output).with(filter);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_filter<F>(cfg: &LoggerConfig, lookup: F) -> Result<EnvFilter, LoggerError>
where
    F: Fn(&str) -> Option<String>,
{
    let directives = cfg
        .level_override
        .as_deref()
        .and_then(&lookup)
        .filter(|raw| !raw.trim().is_empty())
        .unwrap_or_else(|| cfg.level.clone());

    EnvFilter::try_new(&directives)
        .map_err(|source| LoggerError::InvalidDirectives { directives, source })
}

fn build_output(cfg: &LoggerConfig) -> Result<OutputLayer, LoggerError> {
    // record timestamps are UTC, so are the log lines
    let timer = OffsetTime::new(UtcOffset::UTC, Rfc3339);
    let writer = match cfg.writer {
        LogWriter::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogWriter::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    match cfg.format {
        LoggerFormat::Text => Ok(fmt::layer()
            .with_writer(writer)
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(timer)
            .boxed()),
        LoggerFormat::Json => Ok(fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(cfg.with_targets)
            .with_timer(timer)
            .boxed()),
        LoggerFormat::Journald => journald_layer(),
    }
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald_layer() -> Result<OutputLayer, LoggerError> {
    let layer = tracing_journald::layer().map_err(LoggerError::Journald)?;
    Ok(layer.boxed())
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald_layer() -> Result<OutputLayer, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}
