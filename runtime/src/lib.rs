//! # Crosscut Runtime
//!
//! Operational building blocks for services built with Crosscut.
//!
//! ## Core Components
//!
//! - **Retry**: bounded exponential backoff for transient faults, with a WARN
//!   log line per retry
//! - **Logging**: debug and production `tracing-subscriber` presets
//! - **Config**: environment and TOML driven service configuration
//! - **Metrics**: Prometheus recorder plus metric descriptions
//! - **Measure**: elapsed-time helpers
//!
//! ## Example
//!
//! ```no_run
//! use crosscut_runtime::config::ServiceConfig;
//! use crosscut_runtime::retry::RetryPolicyHandler;
//! use crosscut_runtime::logging;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::from_env()?;
//! logging::init(&config.log_config())?;
//!
//! let retry = RetryPolicyHandler::new(config.retry_policy());
//! let body = retry
//!     .execute(|| async { Ok::<_, std::io::Error>("pong") })
//!     .await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Environment and TOML configuration
pub mod config;

/// Logger presets
pub mod logging;

/// Elapsed-time helpers
pub mod measure;

/// Prometheus metrics for observability
pub mod metrics;

/// Retry logic with exponential backoff
pub mod retry;

pub use config::{ConfigError, Environment, ServiceConfig};
pub use logging::{LogConfig, LogFormat, LogLevel, LogPreset, LoggingError};
pub use retry::{FaultKinds, RetryError, RetryPolicy, RetryPolicyHandler};
