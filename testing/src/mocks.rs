//! Scripted handlers, behaviors and operations for tests.
//!
//! - [`CallLog`]: shared, ordered record of pipeline stages
//! - [`RecordingHandler`] / [`RecordingBehavior`]: record into a [`CallLog`]
//!   and return scripted outcomes
//! - [`FlakyOperation`]: fails a fixed number of times, then succeeds

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use async_trait::async_trait;
use crosscut_core::mediator::{PipelineBehavior, Request, RequestHandler};
use crosscut_core::outcome::Outcome;
use crosscut_core::CancellationToken;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered record of calls, shared between mocks.
///
/// # Example
///
/// ```
/// use crosscut_testing::mocks::CallLog;
///
/// let log = CallLog::new();
/// let shared = log.clone();
/// shared.record("before");
/// assert_eq!(log.entries(), vec!["before"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    /// Snapshot of all entries in call order
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of entries equal to `entry`
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.as_str() == entry)
            .count()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Check if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Forget all entries
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// Handler that records `"handler"` and returns a scripted outcome.
pub struct RecordingHandler<R: Request> {
    log: CallLog,
    outcome: Outcome<R::Output>,
    _request: PhantomData<fn(&R)>,
}

impl<R: Request> RecordingHandler<R> {
    /// Handler returning `outcome` on every call
    #[must_use]
    pub const fn new(log: CallLog, outcome: Outcome<R::Output>) -> Self {
        Self {
            log,
            outcome,
            _request: PhantomData,
        }
    }
}

#[async_trait]
impl<R> RequestHandler<R> for RecordingHandler<R>
where
    R: Request,
    R::Output: Clone,
{
    async fn handle(&self, _request: &R, _cancel: &CancellationToken) -> Outcome<R::Output> {
        self.log.record("handler");
        self.outcome.clone()
    }
}

/// Behavior that records `"before"` and `"after"` and returns scripted
/// outcomes from each hook.
///
/// `after` additionally records `"after:success"` or `"after:failure"`
/// depending on the handler result it observed.
pub struct RecordingBehavior<R> {
    log: CallLog,
    before: Outcome,
    after: Outcome,
    _request: PhantomData<fn(&R)>,
}

impl<R> RecordingBehavior<R> {
    /// Behavior whose hooks both succeed
    #[must_use]
    pub fn passing(log: CallLog) -> Self {
        Self::new(log, Outcome::success(), Outcome::success())
    }

    /// Behavior with scripted hook outcomes
    #[must_use]
    pub const fn new(log: CallLog, before: Outcome, after: Outcome) -> Self {
        Self {
            log,
            before,
            after,
            _request: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior<R> for RecordingBehavior<R> {
    async fn before(&self, _request: &R, _cancel: &CancellationToken) -> Outcome {
        self.log.record("before");
        self.before.clone()
    }

    async fn after(
        &self,
        _request: &R,
        response: &Outcome<R::Output>,
        _cancel: &CancellationToken,
    ) -> Outcome {
        self.log.record("after");
        self.log.record(if response.is_success() {
            "after:success"
        } else {
            "after:failure"
        });
        self.after.clone()
    }
}

type ErrorFactory<E> = Box<dyn Fn(usize) -> E + Send + Sync>;

/// Operation that fails `failures` times, then succeeds with the call number.
///
/// # Example
///
/// ```
/// use crosscut_testing::mocks::FlakyOperation;
///
/// let op = FlakyOperation::new(1, |n| std::io::Error::other(format!("attempt {n}")));
/// assert!(op.call().is_err());
/// assert_eq!(op.call().unwrap(), 2);
/// assert_eq!(op.calls(), 2);
/// ```
pub struct FlakyOperation<E> {
    failures: usize,
    calls: AtomicUsize,
    make_error: ErrorFactory<E>,
}

impl<E> FlakyOperation<E> {
    /// Fail `failures` times with `make_error(call_number)`
    #[must_use]
    pub fn new<F>(failures: usize, make_error: F) -> Self
    where
        F: Fn(usize) -> E + Send + Sync + 'static,
    {
        Self {
            failures,
            calls: AtomicUsize::new(0),
            make_error: Box::new(make_error),
        }
    }

    /// Invoke the operation
    ///
    /// # Errors
    ///
    /// Returns the scripted error for the first `failures` calls.
    pub fn call(&self) -> Result<usize, E> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err((self.make_error)(call))
        } else {
            Ok(call)
        }
    }

    /// Invoke the operation after yielding to the runtime
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call).
    pub async fn call_async(&self) -> Result<usize, E> {
        tokio::task::yield_now().await;
        self.call()
    }

    /// Number of calls so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_call_log_counts_entries() {
        let log = CallLog::new();
        log.record("before");
        log.record("handler");
        log.record("before");

        assert_eq!(log.count("before"), 2);
        assert_eq!(log.len(), 3);

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_flaky_operation_fails_then_succeeds() {
        let op = FlakyOperation::new(2, |n| format!("down {n}"));

        assert_eq!(op.call(), Err("down 1".to_string()));
        assert_eq!(op.call(), Err("down 2".to_string()));
        assert_eq!(op.call(), Ok(3));
        assert_eq!(op.calls(), 3);
    }
}
