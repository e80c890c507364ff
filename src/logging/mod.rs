//! Logging configuration and initialization
//!
//! Centralized `tracing` setup. Console output is human-readable or JSON;
//! an optional file sink always receives JSON for log aggregation.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: standard tracing filter (e.g. "info", "decodeforge=debug")
//! - `DECODEFORGE_LOG_LEVEL`: simple level (error, warn, info, debug, trace)
//! - `DECODEFORGE_LOG_FORMAT`: "human" or "json"
//! - `DECODEFORGE_LOG_FILE`: optional file path for JSON log output

use once_cell::sync::OnceCell;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

static TRACING_INITIALIZED: OnceCell<()> = OnceCell::new();

const LOG_LEVEL_ENV: &str = "DECODEFORGE_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "DECODEFORGE_LOG_FORMAT";
const LOG_FILE_ENV: &str = "DECODEFORGE_LOG_FILE";

/// Errors that can occur during logging initialization
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("failed to create log directory: {0}")]
    DirectoryCreationFailed(String),

    #[error("failed to open log file: {0}")]
    FileOpenFailed(String),
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" | "pretty" | "console" => Some(LogFormat::Human),
            "json" | "structured" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub log_file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    fn from_env() -> Self {
        LoggingConfig {
            level: std::env::var(LOG_LEVEL_ENV)
                .ok()
                .and_then(|s| LogLevel::parse(&s))
                .unwrap_or_default(),
            format: std::env::var(LOG_FORMAT_ENV)
                .ok()
                .and_then(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            log_file: std::env::var(LOG_FILE_ENV).ok().map(PathBuf::from),
        }
    }
}

/// Initialize logging from environment variables with defaults.
///
/// Idempotent: only the first call installs a subscriber.
pub fn init_logging_default() {
    init_with_config(&LoggingConfig::from_env());
}

/// Initialize logging with a custom configuration. Idempotent.
pub fn init_with_config(config: &LoggingConfig) {
    TRACING_INITIALIZED.get_or_init(|| {
        let _ = try_init(config);
    });
}

fn try_init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_filter = build_env_filter(config.level)?;

    let console = match config.format {
        LogFormat::Human => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_target(false).boxed(),
    };

    let file_layer = match &config.log_file {
        Some(path) => Some(open_file_layer(path)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file_layer)
        .init();

    Ok(())
}

fn open_file_layer<S>(path: &PathBuf) -> Result<Box<dyn Layer<S> + Send + Sync>, LoggingError>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| LoggingError::DirectoryCreationFailed(e.to_string()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggingError::FileOpenFailed(e.to_string()))?;

    Ok(fmt::layer()
        .json()
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .boxed())
}

/// `RUST_LOG` wins over `DECODEFORGE_LOG_LEVEL`, which wins over the
/// configured default.
fn build_env_filter(default_level: LogLevel) -> Result<EnvFilter, LoggingError> {
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        return EnvFilter::try_new(rust_log).map_err(|e| LoggingError::InvalidFilter(e.to_string()));
    }
    if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
        if let Some(level) = LogLevel::parse(&level) {
            return Ok(EnvFilter::new(level.as_filter_str()));
        }
    }
    Ok(EnvFilter::new(default_level.as_filter_str()))
}

/// Check if tracing has been initialized
pub fn is_initialized() -> bool {
    TRACING_INITIALIZED.get().is_some()
}
