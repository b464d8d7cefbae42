//! Error types for mediator wiring.

use thiserror::Error;

/// Errors raised by the mediator.
///
/// These signal a wiring defect, not a business outcome: they are never
/// retried and never converted into an [`Outcome`](crate::outcome::Outcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediatorError {
    /// No handler is registered for the request's concrete type.
    #[error("No handler registered for request type {request_type}")]
    HandlerNotRegistered {
        /// Name of the request type
        request_type: &'static str,
    },

    /// A second handler was registered for the same request type.
    #[error("Handler already registered for request type {request_type}")]
    DuplicateHandler {
        /// Name of the request type
        request_type: &'static str,
    },

    /// A second pipeline behavior was registered for the same request type.
    #[error("Pipeline behavior already registered for request type {request_type}")]
    DuplicateBehavior {
        /// Name of the request type
        request_type: &'static str,
    },
}
