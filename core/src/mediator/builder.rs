//! Startup-time registration of handlers and behaviors.

use super::traits::{FnHandler, PipelineBehavior, Request, RequestHandler};
use super::{Mediator, Registry};
use crate::error::MediatorError;
use crate::outcome::Outcome;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for [`Mediator`].
///
/// Registrations are keyed by the concrete request type. Registering a second
/// handler or behavior for the same type is reported by [`build`](Self::build).
///
/// # Example
///
/// ```
/// use crosscut_core::mediator::{MediatorBuilder, Request};
/// use crosscut_core::outcome::Outcome;
///
/// struct Ping;
///
/// impl Request for Ping {
///     type Output = &'static str;
/// }
///
/// let mediator = MediatorBuilder::new()
///     .handler_fn(|_: &Ping| Outcome::success_with("pong"))
///     .build()
///     .expect("valid wiring");
///
/// assert!(mediator.has_handler::<Ping>());
/// ```
#[derive(Default)]
pub struct MediatorBuilder {
    handlers: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    behaviors: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    errors: Vec<MediatorError>,
}

impl MediatorBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for request type `R`.
    #[must_use]
    pub fn handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R>,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        if self
            .handlers
            .insert(TypeId::of::<R>(), Arc::new(handler))
            .is_some()
        {
            self.errors.push(MediatorError::DuplicateHandler {
                request_type: type_name::<R>(),
            });
        }
        self
    }

    /// Register a synchronous closure as the handler for request type `R`.
    #[must_use]
    pub fn handler_fn<R, F>(self, f: F) -> Self
    where
        R: Request,
        F: Fn(&R) -> Outcome<R::Output> + Send + Sync + 'static,
    {
        self.handler::<R, _>(FnHandler::new(f))
    }

    /// Register the pipeline behavior for request type `R`.
    #[must_use]
    pub fn behavior<R, B>(mut self, behavior: B) -> Self
    where
        R: Request,
        B: PipelineBehavior<R>,
    {
        let behavior: Arc<dyn PipelineBehavior<R>> = Arc::new(behavior);
        if self
            .behaviors
            .insert(TypeId::of::<R>(), Arc::new(behavior))
            .is_some()
        {
            self.errors.push(MediatorError::DuplicateBehavior {
                request_type: type_name::<R>(),
            });
        }
        self
    }

    /// Freeze the registrations into a [`Mediator`].
    ///
    /// # Errors
    ///
    /// Returns the first [`MediatorError::DuplicateHandler`] or
    /// [`MediatorError::DuplicateBehavior`] recorded during registration.
    pub fn build(mut self) -> Result<Mediator, MediatorError> {
        if !self.errors.is_empty() {
            return Err(self.errors.swap_remove(0));
        }

        let orphaned = self
            .behaviors
            .keys()
            .filter(|id| !self.handlers.contains_key(id))
            .count();
        if orphaned > 0 {
            tracing::warn!(orphaned, "Pipeline behaviors registered without a handler");
        }

        tracing::debug!(
            handlers = self.handlers.len(),
            behaviors = self.behaviors.len(),
            "Mediator registry built"
        );

        Ok(Mediator {
            registry: Arc::new(Registry {
                handlers: self.handlers,
                behaviors: self.behaviors,
            }),
        })
    }
}
