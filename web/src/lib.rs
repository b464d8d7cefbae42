//! Axum integration for Crosscut services.
//!
//! # Request Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ CorrelationIdLayer                           │  ← id from header or generated
//! │   span "http_request" { correlation_id }     │  ← every log line carries it
//! ├──────────────────────────────────────────────┤
//! │ Handler                                      │
//! │   state.mediator.send(request)               │  ← before → handle → after
//! │   Outcome::Failure  → AppError (4xx)         │
//! │   MediatorError     → AppError (500)         │
//! ├──────────────────────────────────────────────┤
//! │ application/problem+json                     │  ← correlationId in the body
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use axum::{routing::post, Router};
//! use crosscut_web::{correlation_id_layer, AppState};
//!
//! let app = Router::new()
//!     .route("/api/orders", post(place_order))
//!     .layer(correlation_id_layer())
//!     .with_state(AppState::new(mediator));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod correlation;
pub mod error;
pub mod state;

// Re-export key types for convenience
pub use correlation::{
    correlation_id_layer, CorrelationId, CorrelationIdLayer, PropagateCorrelationIdLayer,
    CORRELATION_ID_HEADER,
};
pub use error::{AppError, PROBLEM_JSON};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
