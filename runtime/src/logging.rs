//! Logger presets built on `tracing-subscriber`.
//!
//! Two presets mirror how services are usually run:
//!
//! - [`LogPreset::Debug`]: everything from DEBUG up, framework crates at the
//!   configured level, console output plus an optional log file.
//! - [`LogPreset::Production`]: WARN and above, same framework overrides.
//!
//! Framework crates (`hyper`, `tower`, `axum`, ...) are noisy at DEBUG, so they
//! get their own level. `RUST_LOG`, when set, replaces the computed filter.
//!
//! Correlation ids show up on every line emitted inside the HTTP request span,
//! because the fmt layer renders span fields.
//!
//! # Example
//!
//! ```no_run
//! use crosscut_runtime::logging::{self, LogConfig, LogLevel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! logging::init(
//!     &LogConfig::production()
//!         .with_framework_level(LogLevel::Error)
//!         .with_file("logs/service.log"),
//! )?;
//! # Ok(())
//! # }
//! ```

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt as fmt_layer, EnvFilter, Layer};

/// Crates whose level is governed by [`LogConfig::framework_level`].
pub const FRAMEWORK_TARGETS: &[&str] = &["hyper", "h2", "tower", "tower_http", "axum", "reqwest"];

/// Errors from logger initialization.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// The log file (or its directory) could not be opened
    #[error("Failed to open log file {}: {source}", path.display())]
    OpenFile {
        /// Path that was opened
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A global subscriber is already installed
    #[error("Global logger already initialized: {0}")]
    AlreadyInitialized(String),

    /// A level name could not be parsed
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// A format name could not be parsed
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),
}

/// Severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very verbose diagnostics
    Trace,
    /// Diagnostics useful during development
    Debug,
    /// Normal operation
    Info,
    /// Something unexpected but recoverable
    Warn,
    /// Failures
    Error,
}

impl LogLevel {
    /// Directive spelling used by `EnvFilter`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" | "verbose" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" | "information" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "fatal" => Ok(Self::Error),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Line layout of an output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Timestamp, level, span context, target and fields on one line
    #[default]
    Full,
    /// Single line with span context shortened to field values
    Compact,
    /// Multi-line, human-oriented
    Pretty,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Logger preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogPreset {
    /// DEBUG and above
    Debug,
    /// WARN and above
    Production,
}

impl LogPreset {
    /// Global minimum level of the preset.
    #[must_use]
    pub const fn min_level(self) -> LogLevel {
        match self {
            Self::Debug => LogLevel::Debug,
            Self::Production => LogLevel::Warn,
        }
    }
}

/// Logger configuration consumed by [`init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Preset selecting the global minimum level
    pub preset: LogPreset,
    /// Level for [`FRAMEWORK_TARGETS`] and for the log file
    pub framework_level: LogLevel,
    /// Log file; a date suffix is added to the file name
    pub file: Option<PathBuf>,
    /// Colour console output
    pub ansi: bool,
    /// Print event targets
    pub with_target: bool,
    /// Console line layout
    pub console_format: LogFormat,
    /// Log file line layout
    pub file_format: LogFormat,
    /// Let `RUST_LOG` replace the computed filter
    pub env_override: bool,
}

impl LogConfig {
    /// Debug preset with framework crates at DEBUG.
    #[must_use]
    pub const fn debug() -> Self {
        Self::for_preset(LogPreset::Debug)
    }

    /// Production preset with framework crates at WARN.
    #[must_use]
    pub const fn production() -> Self {
        Self::for_preset(LogPreset::Production)
    }

    /// Defaults for `preset`.
    #[must_use]
    pub const fn for_preset(preset: LogPreset) -> Self {
        Self {
            preset,
            framework_level: preset.min_level(),
            file: None,
            ansi: true,
            with_target: true,
            console_format: LogFormat::Full,
            file_format: LogFormat::Full,
            env_override: true,
        }
    }

    /// Override the framework/file level.
    #[must_use]
    pub const fn with_framework_level(mut self, level: LogLevel) -> Self {
        self.framework_level = level;
        self
    }

    /// Also write to `path` (date-suffixed).
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Enable or disable console colours.
    #[must_use]
    pub const fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Enable or disable event targets in output lines.
    #[must_use]
    pub const fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Console line layout.
    #[must_use]
    pub const fn with_console_format(mut self, format: LogFormat) -> Self {
        self.console_format = format;
        self
    }

    /// Log file line layout.
    #[must_use]
    pub const fn with_file_format(mut self, format: LogFormat) -> Self {
        self.file_format = format;
        self
    }

    /// Enable or disable `RUST_LOG` overriding the computed filter.
    #[must_use]
    pub const fn with_env_override(mut self, env_override: bool) -> Self {
        self.env_override = env_override;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::debug()
    }
}

/// Filter directives computed from the configuration, e.g.
/// `debug,hyper=warn,h2=warn,...`.
#[must_use]
pub fn filter_directives(config: &LogConfig) -> String {
    let mut directives = vec![config.preset.min_level().as_str().to_string()];
    directives.extend(
        FRAMEWORK_TARGETS
            .iter()
            .map(|target| format!("{target}={}", config.framework_level)),
    );
    directives.join(",")
}

/// `EnvFilter` for the configuration, honouring `RUST_LOG` when allowed.
#[must_use]
pub fn filter(config: &LogConfig) -> EnvFilter {
    let computed = || EnvFilter::new(filter_directives(config));
    if config.env_override {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| computed())
    } else {
        computed()
    }
}

/// Path of the log file for `date`: `<stem>-<YYYYMMDD>.<ext>`.
#[must_use]
pub fn dated_path(path: &Path, date: NaiveDate) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "log".into(), |s| s.to_string_lossy());
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{}.{}", date.format("%Y%m%d"), ext.to_string_lossy()),
        None => format!("{stem}-{}", date.format("%Y%m%d")),
    };
    path.with_file_name(name)
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open_error = |source: std::io::Error| LoggingError::OpenFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(open_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_error)
}

fn output_layer<S, W>(
    format: LogFormat,
    writer: W,
    ansi: bool,
    with_target: bool,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt_layer::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(with_target);
    match format {
        LogFormat::Full => layer.boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    }
}

/// Build the subscriber for `config` without installing it.
///
/// # Errors
///
/// Returns [`LoggingError::OpenFile`] when the log file cannot be opened.
pub fn build_subscriber(
    config: &LogConfig,
) -> Result<Box<dyn Subscriber + Send + Sync>, LoggingError> {
    let file_layer = match &config.file {
        Some(path) => {
            let path = dated_path(path, Local::now().date_naive());
            let file = open_log_file(&path)?;
            Some(
                output_layer(
                    config.file_format,
                    Mutex::new(file),
                    false,
                    config.with_target,
                )
                .with_filter(LevelFilter::from(config.framework_level)),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter(config))
        .with(output_layer(
            config.console_format,
            std::io::stdout,
            config.ansi,
            config.with_target,
        ))
        .with(file_layer);

    Ok(Box::new(subscriber))
}

/// Install the global subscriber for `config`.
///
/// Call once at process start.
///
/// # Errors
///
/// Returns [`LoggingError::OpenFile`] when the log file cannot be opened and
/// [`LoggingError::AlreadyInitialized`] when a global subscriber exists.
pub fn init(config: &LogConfig) -> Result<(), LoggingError> {
    let subscriber = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(
        preset = ?config.preset,
        framework_level = %config.framework_level,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_debug_preset_directives() {
        let directives = filter_directives(&LogConfig::debug());
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("hyper=debug"));
        assert!(directives.contains("tower_http=debug"));
    }

    #[test]
    fn test_production_preset_directives() {
        let config = LogConfig::production().with_framework_level(LogLevel::Error);
        let directives = filter_directives(&config);
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("axum=error"));
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" info ".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_builder_setters() {
        let config = LogConfig::debug()
            .with_target(false)
            .with_console_format(LogFormat::Pretty)
            .with_file_format(LogFormat::Compact);

        assert!(!config.with_target);
        assert_eq!(config.console_format, LogFormat::Pretty);
        assert_eq!(config.file_format, LogFormat::Compact);
        assert_eq!(LogConfig::production().console_format, LogFormat::Full);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!(" pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(LoggingError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_dated_path() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(
            dated_path(Path::new("logs/app.log"), date),
            PathBuf::from("logs/app-20250309.log")
        );
        assert_eq!(
            dated_path(Path::new("service"), date),
            PathBuf::from("service-20250309")
        );
    }

    #[test]
    fn test_file_output_respects_level() {
        let dir = std::env::temp_dir().join(format!("crosscut-logging-{}", std::process::id()));
        let base = dir.join("test.log");
        let config = LogConfig::production()
            .with_ansi(false)
            .with_env_override(false)
            .with_target(false)
            .with_file_format(LogFormat::Compact)
            .with_file(&base);

        let subscriber = build_subscriber(&config).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("quiet line");
            tracing::warn!("loud line");
        });

        let written =
            std::fs::read_to_string(dated_path(&base, Local::now().date_naive())).unwrap();
        assert!(written.contains("loud line"));
        assert!(!written.contains("quiet line"));
        assert!(!written.contains("crosscut_runtime::logging"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
