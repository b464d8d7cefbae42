//! # Crosscut Testing
//!
//! Testing utilities for services built with Crosscut.
//!
//! This crate provides:
//! - Recording handlers and behaviors that log which pipeline stages ran
//! - Flaky operations for exercising retry policies
//! - A `tracing` layer that captures log events for assertions
//!
//! ## Example
//!
//! ```ignore
//! use crosscut_testing::mocks::{CallLog, RecordingBehavior, RecordingHandler};
//! use crosscut_core::{Mediator, Outcome};
//!
//! #[tokio::test]
//! async fn test_failed_before_skips_handler() {
//!     let log = CallLog::new();
//!     let mediator = Mediator::builder()
//!         .handler(RecordingHandler::<Ping>::new(log.clone(), Outcome::success()))
//!         .behavior(RecordingBehavior::<Ping>::new(
//!             log.clone(),
//!             Outcome::failure(["denied"]),
//!             Outcome::success(),
//!         ))
//!         .build()?;
//!
//!     mediator.send(Ping, &CancellationToken::new()).await?;
//!     assert_eq!(log.entries(), vec!["before"]);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]

pub mod logs;
pub mod mocks;

// Re-export commonly used items
pub use logs::{capture, CapturedEvent, CapturedEvents};
pub use mocks::{CallLog, FlakyOperation, RecordingBehavior, RecordingHandler};
