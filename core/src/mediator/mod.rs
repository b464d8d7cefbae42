//! In-process mediator: routes a request to its handler through an optional
//! pipeline behavior.
//!
//! # Dispatch
//!
//! ```text
//! send(request)
//!   └─ resolve handler by concrete type ── missing ──▶ MediatorError
//!        ├─ no behavior ──▶ handle ──▶ result
//!        └─ behavior ──▶ before ── failure ──▶ before's failure
//!                          └─ handle ──▶ after ── failure ──▶ after's failure
//!                                          └─ success ──▶ handler's result
//! ```
//!
//! Stages run strictly one after another. The registry is built once at
//! startup ([`MediatorBuilder`]) and never mutated, so a [`Mediator`] can be
//! cloned freely and shared across tasks.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use crosscut_core::mediator::{MediatorBuilder, Request, RequestHandler};
//! use crosscut_core::outcome::Outcome;
//! use tokio_util::sync::CancellationToken;
//!
//! struct CreateUser {
//!     name: String,
//! }
//!
//! impl Request for CreateUser {
//!     type Output = u64;
//! }
//!
//! struct CreateUserHandler;
//!
//! #[async_trait]
//! impl RequestHandler<CreateUser> for CreateUserHandler {
//!     async fn handle(&self, request: &CreateUser, _cancel: &CancellationToken) -> Outcome<u64> {
//!         if request.name.is_empty() {
//!             return Outcome::failure_with_code(400, ["name is required"]);
//!         }
//!         Outcome::success_with(1)
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mediator = MediatorBuilder::new()
//!     .handler(CreateUserHandler)
//!     .build()
//!     .expect("valid wiring");
//!
//! let outcome = mediator
//!     .send(CreateUser { name: "ada".into() }, &CancellationToken::new())
//!     .await
//!     .expect("handler registered");
//! assert_eq!(outcome.value(), Some(&1));
//! # });
//! ```

mod builder;
mod traits;

pub use builder::MediatorBuilder;
pub use traits::{FnHandler, PipelineBehavior, Request, RequestHandler};

use crate::error::MediatorError;
use crate::outcome::Outcome;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Immutable handler and behavior registrations.
///
/// Values are `Arc<dyn RequestHandler<R>>` / `Arc<dyn PipelineBehavior<R>>`
/// erased behind `Any`, keyed by `TypeId::of::<R>()`.
pub(crate) struct Registry {
    pub(crate) handlers: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    pub(crate) behaviors: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Registry {
    fn handler<R: Request>(&self) -> Option<Arc<dyn RequestHandler<R>>> {
        self.handlers
            .get(&TypeId::of::<R>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn RequestHandler<R>>>())
            .cloned()
    }

    fn behavior<R: Request>(&self) -> Option<Arc<dyn PipelineBehavior<R>>> {
        self.behaviors
            .get(&TypeId::of::<R>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn PipelineBehavior<R>>>())
            .cloned()
    }
}

/// Routes requests to their registered handlers.
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone)]
pub struct Mediator {
    registry: Arc<Registry>,
}

impl Mediator {
    /// Start building a mediator.
    #[must_use]
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// Whether a handler is registered for request type `R`.
    #[must_use]
    pub fn has_handler<R: Request>(&self) -> bool {
        self.registry.handlers.contains_key(&TypeId::of::<R>())
    }

    /// Whether a pipeline behavior is registered for request type `R`.
    #[must_use]
    pub fn has_behavior<R: Request>(&self) -> bool {
        self.registry.behaviors.contains_key(&TypeId::of::<R>())
    }

    /// Send a request to its handler.
    ///
    /// The cancellation token is forwarded to the handler and both hooks; the
    /// mediator itself does not abort between stages.
    ///
    /// # Errors
    ///
    /// Returns [`MediatorError::HandlerNotRegistered`] when no handler is
    /// registered for `R`. Domain failures are returned inside the `Ok`
    /// outcome, never as an error.
    #[tracing::instrument(skip_all, name = "mediator_send", fields(request_type = type_name::<R>()))]
    pub async fn send<R: Request>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<Outcome<R::Output>, MediatorError> {
        let request_type = type_name::<R>();

        let Some(handler) = self.registry.handler::<R>() else {
            tracing::error!(request_type, "No handler registered");
            return Err(MediatorError::HandlerNotRegistered { request_type });
        };

        metrics::counter!("mediator_requests_total", "request_type" => request_type).increment(1);
        let start = Instant::now();

        let outcome = match self.registry.behavior::<R>() {
            Some(behavior) => run_pipeline(&*behavior, &*handler, &request, cancel).await,
            None => handler.handle(&request, cancel).await,
        };

        metrics::histogram!("mediator_dispatch_duration_seconds", "request_type" => request_type)
            .record(start.elapsed().as_secs_f64());

        if let Outcome::Failure(failure) = &outcome {
            tracing::debug!(code = failure.code(), "Request completed with failure");
        }

        Ok(outcome)
    }
}

async fn run_pipeline<R: Request>(
    behavior: &dyn PipelineBehavior<R>,
    handler: &dyn RequestHandler<R>,
    request: &R,
    cancel: &CancellationToken,
) -> Outcome<R::Output> {
    if let Outcome::Failure(failure) = behavior.before(request, cancel).await {
        tracing::debug!(code = failure.code(), "Pipeline before hook short-circuited");
        return Outcome::Failure(failure);
    }

    let result = handler.handle(request, cancel).await;

    match behavior.after(request, &result, cancel).await {
        Outcome::Success(()) => result,
        Outcome::Failure(failure) => {
            tracing::debug!(code = failure.code(), "Pipeline after hook rejected result");
            Outcome::Failure(failure)
        }
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("handlers", &self.registry.handlers.len())
            .field("behaviors", &self.registry.behaviors.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Echo(u32);

    impl Request for Echo {
        type Output = u32;
    }

    struct Unrouted;

    impl Request for Unrouted {
        type Output = ();
    }

    #[derive(Default)]
    struct Trace {
        stages: Mutex<Vec<&'static str>>,
    }

    struct EchoHandler(Arc<Trace>);

    #[async_trait]
    impl RequestHandler<Echo> for EchoHandler {
        async fn handle(&self, request: &Echo, _cancel: &CancellationToken) -> Outcome<u32> {
            self.0.stages.lock().unwrap().push("handle");
            Outcome::success_with(request.0)
        }
    }

    struct Gate {
        trace: Arc<Trace>,
        reject_before: bool,
        reject_after: bool,
    }

    #[async_trait]
    impl PipelineBehavior<Echo> for Gate {
        async fn before(&self, _request: &Echo, _cancel: &CancellationToken) -> Outcome {
            self.trace.stages.lock().unwrap().push("before");
            if self.reject_before {
                Outcome::failure_with_code(401, ["denied"])
            } else {
                Outcome::success()
            }
        }

        async fn after(
            &self,
            _request: &Echo,
            response: &Outcome<u32>,
            _cancel: &CancellationToken,
        ) -> Outcome {
            self.trace.stages.lock().unwrap().push("after");
            assert!(response.is_success());
            if self.reject_after {
                Outcome::failure_with_code(422, ["audit failed"])
            } else {
                Outcome::success()
            }
        }
    }

    fn stages(trace: &Trace) -> Vec<&'static str> {
        trace.stages.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_send_without_behavior_returns_handler_result() {
        let trace = Arc::new(Trace::default());
        let mediator = MediatorBuilder::new()
            .handler(EchoHandler(Arc::clone(&trace)))
            .build()
            .unwrap();

        let outcome = mediator.send(Echo(5), &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome, Outcome::success_with(5));
        assert_eq!(stages(&trace), ["handle"]);
    }

    #[tokio::test]
    async fn test_before_failure_skips_handler_and_after() {
        let trace = Arc::new(Trace::default());
        let mediator = MediatorBuilder::new()
            .handler(EchoHandler(Arc::clone(&trace)))
            .behavior(Gate {
                trace: Arc::clone(&trace),
                reject_before: true,
                reject_after: false,
            })
            .build()
            .unwrap();

        let outcome = mediator.send(Echo(5), &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.code(), Some(401));
        assert_eq!(stages(&trace), ["before"]);
    }

    #[tokio::test]
    async fn test_after_failure_replaces_handler_success() {
        let trace = Arc::new(Trace::default());
        let mediator = MediatorBuilder::new()
            .behavior(Gate {
                trace: Arc::clone(&trace),
                reject_before: false,
                reject_after: true,
            })
            .handler(EchoHandler(Arc::clone(&trace)))
            .build()
            .unwrap();

        let outcome = mediator.send(Echo(5), &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.code(), Some(422));
        assert_eq!(outcome.error_messages().unwrap(), ["audit failed".to_string()]);
        assert_eq!(stages(&trace), ["before", "handle", "after"]);
    }

    #[tokio::test]
    async fn test_passing_behavior_keeps_handler_result() {
        let trace = Arc::new(Trace::default());
        let mediator = MediatorBuilder::new()
            .handler(EchoHandler(Arc::clone(&trace)))
            .behavior(Gate {
                trace: Arc::clone(&trace),
                reject_before: false,
                reject_after: false,
            })
            .build()
            .unwrap();

        let outcome = mediator.send(Echo(9), &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.value(), Some(&9));
        assert_eq!(stages(&trace), ["before", "handle", "after"]);
    }

    #[tokio::test]
    async fn test_unregistered_request_is_configuration_error() {
        let mediator = MediatorBuilder::new()
            .handler_fn(|echo: &Echo| Outcome::success_with(echo.0))
            .build()
            .unwrap();

        for _ in 0..3 {
            let err = mediator
                .send(Unrouted, &CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, MediatorError::HandlerNotRegistered { .. }));
        }
    }

    #[test]
    fn test_duplicate_handler_rejected_at_build() {
        let err = MediatorBuilder::new()
            .handler_fn(|echo: &Echo| Outcome::success_with(echo.0))
            .handler_fn(|_: &Echo| Outcome::success_with(0))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            MediatorError::DuplicateHandler {
                request_type: type_name::<Echo>()
            }
        );
    }

    #[test]
    fn test_duplicate_behavior_rejected_at_build() {
        let trace = Arc::new(Trace::default());
        let gate = |trace: &Arc<Trace>| Gate {
            trace: Arc::clone(trace),
            reject_before: false,
            reject_after: false,
        };

        let err = MediatorBuilder::new()
            .handler(EchoHandler(Arc::clone(&trace)))
            .behavior(gate(&trace))
            .behavior(gate(&trace))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            MediatorError::DuplicateBehavior {
                request_type: type_name::<Echo>()
            }
        );
    }

    #[test]
    fn test_debug_reports_counts() {
        let mediator = Mediator::builder()
            .handler_fn(|echo: &Echo| Outcome::success_with(echo.0))
            .build()
            .unwrap();

        assert!(mediator.has_handler::<Echo>());
        assert!(!mediator.has_behavior::<Echo>());
        assert_eq!(format!("{mediator:?}"), "Mediator { handlers: 1, behaviors: 0 }");
    }
}
