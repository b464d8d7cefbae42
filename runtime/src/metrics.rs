//! Prometheus metrics for the mediator and retry wrapper.
//!
//! Components record through the `metrics` facade. Nothing is collected until
//! a recorder is installed, so libraries can emit freely and the service
//! decides whether to export.
//!
//! | Metric                                 | Kind      | Labels         |
//! |----------------------------------------|-----------|----------------|
//! | `mediator_requests_total`              | counter   | `request_type` |
//! | `mediator_dispatch_duration_seconds`   | histogram | `request_type` |
//! | `retry_attempts_total`                 | counter   | `fault`        |
//! | `retry_exhausted_total`                | counter   | `fault`        |
//!
//! # Example
//!
//! ```rust,no_run
//! use crosscut_runtime::metrics;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = metrics::install_prometheus()?;
//!
//! // Serve this from a /metrics route
//! let body = handle.render();
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

pub use metrics_exporter_prometheus::PrometheusRecorder;

/// Latency buckets for `*_duration_seconds` histograms.
pub const DURATION_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "mediator_requests_total",
        "Total number of requests dispatched through the mediator"
    );
    describe_histogram!(
        "mediator_dispatch_duration_seconds",
        Unit::Seconds,
        "Time taken to run the pipeline and handler for a request"
    );
    describe_counter!(
        "retry_attempts_total",
        "Total number of retries scheduled after a transient fault"
    );
    describe_counter!(
        "retry_exhausted_total",
        "Total number of operations that failed after the last retry"
    );
}

fn builder() -> Result<PrometheusBuilder, MetricsError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            DURATION_BUCKETS,
        )
        .map_err(|e| MetricsError::Build(e.to_string()))
}

/// Build a Prometheus recorder without installing it globally.
///
/// Useful with [`metrics::with_local_recorder`] in tests.
///
/// # Errors
///
/// Returns [`MetricsError::Build`] if the exporter configuration is rejected.
pub fn build_recorder() -> Result<PrometheusRecorder, MetricsError> {
    Ok(builder()?.build_recorder())
}

/// Install a global Prometheus recorder and describe all metrics.
///
/// Call once at process start; the returned handle renders the scrape body.
///
/// # Errors
///
/// Returns [`MetricsError::Install`] if a recorder is already installed.
pub fn install_prometheus() -> Result<PrometheusHandle, MetricsError> {
    let handle = builder()?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;
    register_metrics();

    tracing::info!("Prometheus metrics recorder installed");
    Ok(handle)
}
