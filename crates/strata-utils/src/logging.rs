//! # Logging Utilities
//!
//! Logging infrastructure for Strata using `tracing`.
//!
//! The dispatch core logs through the `tracing` macros only; this module
//! installs the subscriber that decides where those events go:
//! - Pretty console output for development, JSON for machine consumption
//! - Filtering through `RUST_LOG` or an explicit level
//! - An optional non-blocking log file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strata_utils::init_logging;
//!
//! // Keep the guard alive for as long as logs should be written.
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Stack created");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Filter directives (e.g. `RUST_LOG=debug`, `RUST_LOG=strata_core=trace`)
//! - `STRATA_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `STRATA_LOG_FILE`: Optional log file path; the file rotates daily
//!
//! ## Explicit configuration
//!
//! ```rust,no_run
//! use strata_utils::{LogFormat, LogLevel, LoggingConfig};
//!
//! let _guard = LoggingConfig::new(LogFormat::Json)
//!     .with_level(LogLevel::Debug)
//!     .with_file("/tmp/strata.log")
//!     .init()
//!     .expect("Failed to initialize logging");
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fs, io};

use chrono::{NaiveDate, Utc};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Variable selecting the output format.
pub const FORMAT_ENV: &str = "STRATA_LOG_FORMAT";

/// Variable naming an additional log file.
pub const FILE_ENV: &str = "STRATA_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    /// Default when neither a level nor `RUST_LOG` is given
    Info,
    Debug,
    /// Every dispatch and forwarding hop
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Keeps the file writer alive
///
/// Dropping the guard flushes and stops the background writer thread, so
/// hold it until the program exits.
#[derive(Debug, Default)]
pub struct LoggingGuard
{
    file: Option<PathBuf>,
    _writer: Option<WorkerGuard>,
}

impl LoggingGuard
{
    /// Path of the log file, if one was configured.
    #[must_use]
    pub fn file(&self) -> Option<&Path>
    {
        self.file.as_deref()
    }
}

/// How a log file rotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileRotation
{
    /// `<name>.<YYYY-MM-DD>`, a new file each day
    Daily,
    /// Exactly the given path
    Never,
}

/// Subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig
{
    format: LogFormat,
    level: Option<LogLevel>,
    file: Option<(PathBuf, FileRotation)>,
    console: bool,
}

impl LoggingConfig
{
    /// Console logging in `format`, filtered by `RUST_LOG` (default `info`).
    #[must_use]
    pub fn new(format: LogFormat) -> Self
    {
        Self {
            format,
            level: None,
            file: None,
            console: true,
        }
    }

    /// Read `STRATA_LOG_FORMAT` and `STRATA_LOG_FILE`.
    ///
    /// ## Errors
    ///
    /// `InvalidFormat` if `STRATA_LOG_FORMAT` is set to an unknown format.
    pub fn from_env() -> Result<Self, LoggingError>
    {
        Self::from_vars(env::var(FORMAT_ENV).ok(), env::var_os(FILE_ENV))
    }

    fn from_vars(format: Option<String>, file: Option<OsString>) -> Result<Self, LoggingError>
    {
        let format = match format {
            Some(value) if !value.is_empty() => value.parse().map_err(LoggingError::InvalidFormat)?,
            _ => LogFormat::default(),
        };
        let mut config = Self::new(format);
        if let Some(path) = file.filter(|path| !path.is_empty()) {
            config.file = Some((PathBuf::from(path), FileRotation::Daily));
        }
        Ok(config)
    }

    /// Filter at `level`, overriding `RUST_LOG`.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self
    {
        self.level = Some(level);
        self
    }

    /// Also write to `path`, rotating daily.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self
    {
        self.file = Some((path.into(), FileRotation::Daily));
        self
    }

    /// Write to the file only.
    #[must_use]
    pub fn without_console(mut self) -> Self
    {
        self.console = false;
        self
    }

    fn filter(&self) -> EnvFilter
    {
        if let Some(level) = self.level {
            return EnvFilter::new(Level::from(level).to_string());
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    }

    fn console_layer(&self) -> BoxedLayer
    {
        match self.format {
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(true)
                .with_writer(io::stderr)
                .with_filter(self.filter())
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_target(true)
                .with_thread_names(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(io::stderr)
                .with_filter(self.filter())
                .boxed(),
        }
    }

    fn file_layer(&self, path: &Path, rotation: FileRotation) -> Result<(BoxedLayer, WorkerGuard), LoggingError>
    {
        let name = path
            .file_name()
            .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?
            .to_string_lossy()
            .into_owned();
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let appender = match rotation {
            FileRotation::Daily => RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(name),
            FileRotation::Never => RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name),
        }
        .build(dir)
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = match self.format {
            LogFormat::Pretty => fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false) // No ANSI in files
                .with_filter(self.filter())
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_filter(self.filter())
                .boxed(),
        };
        Ok((layer, guard))
    }

    /// Install the global subscriber.
    ///
    /// ## Errors
    ///
    /// - `InitializationFailed` if a subscriber is already installed or the
    ///   log file cannot be opened
    /// - `InvalidPath` if the log file path has no file name
    pub fn init(self) -> Result<LoggingGuard, LoggingError>
    {
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = LoggingGuard::default();

        if self.console {
            layers.push(self.console_layer());
        }
        if let Some((path, rotation)) = &self.file {
            let (layer, writer) = self.file_layer(path, *rotation)?;
            layers.push(layer);
            guard = LoggingGuard {
                file: Some(path.clone()),
                _writer: Some(writer),
            };
        }

        Registry::default()
            .with(layers)
            .try_init()
            .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
        Ok(guard)
    }
}

/// Initialize logging from the environment
///
/// Reads `RUST_LOG`, `STRATA_LOG_FORMAT` and `STRATA_LOG_FILE`.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `STRATA_LOG_FORMAT` holds an unknown format
/// - The file named by `STRATA_LOG_FILE` cannot be opened
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    LoggingConfig::from_env()?.init()
}

/// Initialize console logging with an explicit level and format
///
/// `STRATA_LOG_FILE` is still honored.
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `STRATA_LOG_FORMAT` holds an unknown format
/// - File logging fails
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    let mut config = LoggingConfig::from_env()?;
    config.format = format;
    config.with_level(level).init()
}

/// Initialize file-only logging in `dir`
///
/// The file is named `YYYY-MM-DD-strata.log` after today's UTC date; `dir`
/// is created if needed. With `level` unset, `RUST_LOG` or `info` applies.
///
/// ## Errors
///
/// Returns an error if the directory cannot be created or logging is
/// already initialized.
pub fn init_logging_to_dir(dir: &Path, level: Option<LogLevel>) -> Result<LoggingGuard, LoggingError>
{
    fs::create_dir_all(dir)?;
    let mut config = LoggingConfig::new(LogFormat::Pretty).without_console();
    config.file = Some((dir.join(dated_log_name(Utc::now().date_naive())), FileRotation::Never));
    if let Some(level) = level {
        config = config.with_level(level);
    }
    config.init()
}

fn dated_log_name(date: NaiveDate) -> String
{
    format!("{}-strata.log", date.format("%Y-%m-%d"))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Log file path without a file name
    #[error("Invalid log file path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
