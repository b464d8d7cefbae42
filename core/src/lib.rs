//! # Crosscut Core
//!
//! Core types shared by services built with Crosscut.
//!
//! This crate provides the framework-independent pieces:
//!
//! - **Outcome**: immutable success/failure value for expected business failures
//! - **Mediator**: routes a request to its single registered handler, with an
//!   optional before/after pipeline behavior per request type
//! - **Problem details**: fixed table of well-known HTTP failure categories
//!
//! ## Example
//!
//! ```ignore
//! use crosscut_core::mediator::{MediatorBuilder, Request};
//! use crosscut_core::outcome::Outcome;
//!
//! struct GetOrder { id: u64 }
//!
//! impl Request for GetOrder {
//!     type Output = Order;
//! }
//!
//! let mediator = MediatorBuilder::new()
//!     .handler(GetOrderHandler::new(repository))
//!     .behavior(AuthorizeOrderAccess)
//!     .build()?;
//!
//! match mediator.send(GetOrder { id }, &cancel).await? {
//!     Outcome::Success(order) => render(order),
//!     Outcome::Failure(failure) => reject(failure),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod mediator;
pub mod outcome;
pub mod problem;

// Re-export key types for convenience
pub use error::MediatorError;
pub use mediator::{Mediator, MediatorBuilder, PipelineBehavior, Request, RequestHandler};
pub use outcome::{Failure, Outcome, DEFAULT_ERROR_CODE};
pub use problem::{ProblemDetails, ProblemKind};

// Re-exported so handlers can name the token without a direct dependency.
pub use tokio_util::sync::CancellationToken;
