//! Tracing subscriber setup

use crate::config::LoggingConfig;
use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Unknown log format: {0}")]
    UnknownFormat(String),

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Parse a format name
    pub fn parse(name: &str) -> Result<Self, LoggingError> {
        match name.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Map a level name to a tracing level, defaulting to INFO
pub fn parse_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Build a subscriber whose fmt layer writes to `writer`
pub fn build_subscriber<W>(
    config: &LoggingConfig,
    writer: W,
) -> Result<Box<dyn Subscriber + Send + Sync>, LoggingError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = LevelFilter::from_level(parse_level(&config.level));

    let subscriber: Box<dyn Subscriber + Send + Sync> = match LogFormat::parse(&config.format)? {
        LogFormat::Json => Box::new(
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer)),
        ),
        LogFormat::Pretty => Box::new(
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(writer)),
        ),
    };
    Ok(subscriber)
}

/// Install the global subscriber, logging to stderr
///
/// Stdout is left to command output. Fails if a subscriber is already
/// installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    build_subscriber(config, std::io::stderr)?
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}
