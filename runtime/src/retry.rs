//! Bounded retry with exponential backoff for transient faults.
//!
//! A [`RetryPolicyHandler`] re-runs an operation while it fails with a fault
//! that matches the policy's [`FaultKinds`] allow-list, waiting
//! `backoff_unit * 2^attempt` before retry number `attempt` (1-based). Every
//! retry is logged at WARN with the attempt number, the delay and the fault
//! category. Once `max_retries` retries are spent, the last fault is returned.
//!
//! # Example
//!
//! ```rust
//! use crosscut_runtime::retry::{FaultKinds, RetryPolicy, RetryPolicyHandler};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::builder()
//!     .max_retries(5)
//!     .backoff_unit(Duration::from_millis(100))
//!     .faults(FaultKinds::of::<std::io::Error>())
//!     .build();
//!
//! let handler = RetryPolicyHandler::new(policy);
//! let value = handler
//!     .execute(|| async { Ok::<_, std::io::Error>(42) })
//!     .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Retries performed when no explicit count is configured.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Base of the exponential backoff when none is configured.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

#[derive(Clone, Copy)]
struct FaultKind {
    name: &'static str,
    matches: fn(&(dyn Error + 'static)) -> bool,
}

/// Allow-list of fault categories that trigger a retry.
///
/// A fault matches when it, or any error in its `source()` chain, is one of
/// the listed types. Kinds are OR-composed. An empty list matches every fault.
#[derive(Clone, Default)]
pub struct FaultKinds {
    kinds: Vec<FaultKind>,
}

impl FaultKinds {
    /// Match every fault.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Match faults of type `E`.
    #[must_use]
    pub fn of<E: Error + 'static>() -> Self {
        Self::any().or::<E>()
    }

    /// Additionally match faults of type `E`.
    #[must_use]
    pub fn or<E: Error + 'static>(mut self) -> Self {
        self.kinds.push(FaultKind {
            name: short_type_name(std::any::type_name::<E>()),
            matches: |err| err.is::<E>(),
        });
        self
    }

    /// Whether every fault matches.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Category name of `err`, or `None` when it is not retryable.
    #[must_use]
    pub fn classify<E: Error + 'static>(&self, err: &E) -> Option<&'static str> {
        if self.kinds.is_empty() {
            return Some(short_type_name(std::any::type_name::<E>()));
        }

        let mut current = Some(err as &(dyn Error + 'static));
        while let Some(fault) = current {
            if let Some(kind) = self.kinds.iter().find(|kind| (kind.matches)(fault)) {
                return Some(kind.name);
            }
            current = fault.source();
        }
        None
    }
}

impl fmt::Debug for FaultKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kinds.is_empty() {
            return f.write_str("FaultKinds(any)");
        }
        f.debug_tuple("FaultKinds")
            .field(&self.kinds.iter().map(|kind| kind.name).collect::<Vec<_>>())
            .finish()
    }
}

/// Strip the module path, keeping generic arguments intact.
fn short_type_name(full: &'static str) -> &'static str {
    let head_end = full.find('<').unwrap_or(full.len());
    let start = full[..head_end].rfind("::").map_or(0, |idx| idx + 2);
    &full[start..]
}

/// Retry policy configuration.
///
/// # Default Values
///
/// - `max_retries`: 3
/// - `backoff_unit`: 1 second (delays of 2s, 4s, 8s)
/// - `faults`: every fault
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: usize,
    /// Multiplied by `2^attempt` to get the delay before a retry
    pub backoff_unit: Duration,
    /// Faults that trigger a retry
    pub faults: FaultKinds,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            faults: FaultKinds::any(),
        }
    }
}

impl RetryPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    /// Delay before retry number `attempt` (1-based): `backoff_unit * 2^attempt`.
    ///
    /// Saturates at `Duration::MAX` instead of overflowing.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt)
            .ok()
            .and_then(|exp| 2_u32.checked_pow(exp));
        factor
            .and_then(|factor| self.backoff_unit.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Set maximum number of retries.
    #[must_use]
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    /// Set the backoff unit.
    #[must_use]
    pub fn backoff_unit(mut self, unit: Duration) -> Self {
        self.policy.backoff_unit = unit;
        self
    }

    /// Set the retryable fault kinds.
    #[must_use]
    pub fn faults(mut self, faults: FaultKinds) -> Self {
        self.policy.faults = faults;
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}

/// Why a retried operation finally failed.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// Every retry was spent; `source` is the last fault.
    #[error("Operation failed after {attempts} attempts: {source}")]
    Exhausted {
        /// Total attempts made, including the first
        attempts: usize,
        /// The last fault
        source: E,
    },

    /// The fault is outside the policy's allow-list.
    #[error("Operation failed with a non-retryable fault: {0}")]
    NotRetryable(E),

    /// Cancellation was requested while waiting to retry.
    #[error("Retry cancelled after {attempts} attempts: {source}")]
    Cancelled {
        /// Attempts made before cancellation
        attempts: usize,
        /// The fault of the last attempt
        source: E,
    },
}

impl<E> RetryError<E> {
    /// The fault that ended the retry loop.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { source, .. }
            | Self::NotRetryable(source)
            | Self::Cancelled { source, .. } => source,
        }
    }

    /// The fault that ended the retry loop, by reference.
    pub const fn fault(&self) -> &E {
        match self {
            Self::Exhausted { source, .. }
            | Self::NotRetryable(source)
            | Self::Cancelled { source, .. } => source,
        }
    }
}

enum Stop {
    NotRetryable,
    Exhausted,
}

struct Backoff {
    attempt: usize,
    delay: Duration,
    category: &'static str,
}

/// Runs operations under a [`RetryPolicy`].
///
/// Synchronous operations block the calling thread between attempts;
/// asynchronous ones suspend the calling task.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicyHandler {
    policy: RetryPolicy,
}

impl RetryPolicyHandler {
    /// Create a handler for `policy`.
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The policy in use.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run a synchronous operation, sleeping the thread between attempts.
    ///
    /// Use `T = ()` for actions without a result.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::NotRetryable`] for faults outside the allow-list
    /// and [`RetryError::Exhausted`] with the last fault once every retry is
    /// spent.
    pub fn execute_blocking<T, E, F>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Error + 'static,
    {
        let mut retries = 0;
        loop {
            match operation() {
                Ok(value) => {
                    self.report_success(retries);
                    return Ok(value);
                }
                Err(err) => match self.next_delay(retries, &err) {
                    Ok(backoff) => {
                        std::thread::sleep(backoff.delay);
                        Self::report_retry(&backoff, &err);
                        retries += 1;
                    }
                    Err(stop) => return Err(Self::stop_error(stop, retries, err)),
                },
            }
        }
    }

    /// Run an asynchronous operation, suspending between attempts.
    ///
    /// Use `T = ()` for actions without a result.
    ///
    /// # Errors
    ///
    /// Same as [`execute_blocking`](Self::execute_blocking).
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        self.execute_with_cancel(&CancellationToken::new(), |_| operation())
            .await
    }

    /// Run an asynchronous operation that receives the cancellation token.
    ///
    /// Cancellation aborts the wait between attempts; an attempt already in
    /// flight is not interrupted.
    ///
    /// # Errors
    ///
    /// Same as [`execute_blocking`](Self::execute_blocking), plus
    /// [`RetryError::Cancelled`] when `cancel` fires during a backoff wait.
    pub async fn execute_with_cancel<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        let mut retries = 0;
        loop {
            match operation(cancel.clone()).await {
                Ok(value) => {
                    self.report_success(retries);
                    return Ok(value);
                }
                Err(err) => match self.next_delay(retries, &err) {
                    Ok(backoff) => {
                        tokio::select! {
                            () = cancel.cancelled() => {
                                tracing::info!(attempts = retries + 1, "Retry cancelled");
                                return Err(RetryError::Cancelled { attempts: retries + 1, source: err });
                            }
                            () = sleep(backoff.delay) => {}
                        }
                        Self::report_retry(&backoff, &err);
                        retries += 1;
                    }
                    Err(stop) => return Err(Self::stop_error(stop, retries, err)),
                },
            }
        }
    }

    /// Decide whether to retry after `retries` completed retries failed with `err`.
    fn next_delay<E: Error + 'static>(&self, retries: usize, err: &E) -> Result<Backoff, Stop> {
        let Some(category) = self.policy.faults.classify(err) else {
            tracing::warn!(error = %err, "Fault is not retryable, failing immediately");
            return Err(Stop::NotRetryable);
        };

        if retries >= self.policy.max_retries {
            tracing::error!(
                attempts = retries + 1,
                fault = category,
                error = %err,
                "Operation failed after max retries"
            );
            metrics::counter!("retry_exhausted_total", "fault" => category).increment(1);
            return Err(Stop::Exhausted);
        }

        let attempt = retries + 1;
        Ok(Backoff {
            attempt,
            delay: self.policy.delay_for_attempt(attempt),
            category,
        })
    }

    /// Log and count a retry whose backoff wait has elapsed.
    fn report_retry<E: Error>(backoff: &Backoff, err: &E) {
        tracing::warn!(
            attempt = backoff.attempt,
            delay_ms = u64::try_from(backoff.delay.as_millis()).unwrap_or(u64::MAX),
            fault = backoff.category,
            error = %err,
            "Retrying after transient fault"
        );
        metrics::counter!("retry_attempts_total", "fault" => backoff.category).increment(1);
    }

    fn report_success(&self, retries: usize) {
        if retries > 0 {
            tracing::info!(
                attempts = retries + 1,
                max_retries = self.policy.max_retries,
                "Operation succeeded after retry"
            );
        }
    }

    fn stop_error<E>(stop: Stop, retries: usize, err: E) -> RetryError<E> {
        match stop {
            Stop::NotRetryable => RetryError::NotRetryable(err),
            Stop::Exhausted => RetryError::Exhausted {
                attempts: retries + 1,
                source: err,
            },
        }
    }
}
