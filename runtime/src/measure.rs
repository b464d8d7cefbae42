//! Elapsed-time helpers.
//!
//! ```
//! use crosscut_runtime::measure;
//!
//! let sum = measure::time(|| (1..=10).sum::<u32>(), Some(|elapsed| {
//!     tracing::debug!(?elapsed, "summed");
//! }));
//! assert_eq!(sum, 55);
//! ```

use std::future::Future;
use std::time::{Duration, Instant};

/// Run `f`, pass its elapsed time to `report` and return its result.
pub fn time<T, F, R>(f: F, report: Option<R>) -> T
where
    F: FnOnce() -> T,
    R: FnOnce(Duration),
{
    let start = Instant::now();
    let value = f();
    if let Some(report) = report {
        report(start.elapsed());
    }
    value
}

/// Await `future`, pass its elapsed time to `report` and return its output.
pub async fn time_async<Fut, R>(future: Fut, report: Option<R>) -> Fut::Output
where
    Fut: Future,
    R: FnOnce(Duration),
{
    let start = Instant::now();
    let value = future.await;
    if let Some(report) = report {
        report(start.elapsed());
    }
    value
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_time_reports_elapsed() {
        let reported = Cell::new(None);
        let value = time(
            || {
                std::thread::sleep(Duration::from_millis(5));
                "done"
            },
            Some(|elapsed| reported.set(Some(elapsed))),
        );

        assert_eq!(value, "done");
        assert!(reported.get().unwrap() >= Duration::from_millis(5));
    }

    #[test]
    fn test_time_without_report() {
        let value = time(|| 7, None::<fn(Duration)>);
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_time_async_reports_elapsed() {
        let mut reported = None;
        let value = time_async(
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                42
            },
            Some(|elapsed| reported = Some(elapsed)),
        )
        .await;

        assert_eq!(value, 42);
        assert!(reported.unwrap() >= Duration::from_millis(20));
    }
}
