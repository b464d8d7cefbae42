//! Request, handler and pipeline-behavior contracts.

use crate::outcome::Outcome;
use async_trait::async_trait;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// A value that can be sent through the [`Mediator`](super::Mediator).
///
/// The concrete type is the routing key: exactly one handler is registered per
/// request type. `Output` is the payload of a successful outcome; commands that
/// produce nothing use `()`.
///
/// # Example
///
/// ```
/// use crosscut_core::mediator::Request;
///
/// struct GetUser {
///     id: u64,
/// }
///
/// impl Request for GetUser {
///     type Output = String;
/// }
/// ```
pub trait Request: Send + Sync + 'static {
    /// Payload returned on success.
    type Output: Send + Sync + 'static;
}

/// Handles one request type.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    /// Handle the request.
    ///
    /// Expected failures are reported as a failed [`Outcome`], not a panic.
    async fn handle(&self, request: &R, cancel: &CancellationToken) -> Outcome<R::Output>;
}

/// Before/after hooks run around the handler of one request type.
///
/// Both hooks default to success, so a behavior only overrides what it needs.
/// A failed `before` short-circuits the handler; a failed `after` replaces the
/// handler's result.
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync + 'static {
    /// Runs before the handler.
    async fn before(&self, _request: &R, _cancel: &CancellationToken) -> Outcome {
        Outcome::success()
    }

    /// Runs after the handler with the handler's result.
    async fn after(
        &self,
        _request: &R,
        _response: &Outcome<R::Output>,
        _cancel: &CancellationToken,
    ) -> Outcome {
        Outcome::success()
    }
}

/// Adapter turning a synchronous closure into a [`RequestHandler`].
///
/// Created by [`MediatorBuilder::handler_fn`](super::MediatorBuilder::handler_fn).
pub struct FnHandler<R, F> {
    f: F,
    _request: PhantomData<fn(&R)>,
}

impl<R, F> FnHandler<R, F> {
    pub(crate) const fn new(f: F) -> Self {
        Self {
            f,
            _request: PhantomData,
        }
    }
}

#[async_trait]
impl<R, F> RequestHandler<R> for FnHandler<R, F>
where
    R: Request,
    F: Fn(&R) -> Outcome<R::Output> + Send + Sync + 'static,
{
    async fn handle(&self, request: &R, _cancel: &CancellationToken) -> Outcome<R::Output> {
        (self.f)(request)
    }
}
