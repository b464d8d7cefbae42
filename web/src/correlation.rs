//! Correlation ID tracking for inbound and outbound HTTP.
//!
//! # Flow
//!
//! 1. **Extract** the id from the `X-Correlation-ID` header, or generate one
//! 2. **Store** it in request extensions for handlers
//! 3. **Scope** the handler in a `http_request` span and a task-local, so log
//!    lines and outbound calls made on that task carry the id
//! 4. **Echo** the id in the response header unless the handler set one
//!
//! Outbound clients wrapped in [`PropagateCorrelationIdLayer`] copy the current
//! task's id onto their requests.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use crosscut_web::correlation::correlation_id_layer;
//!
//! let app = Router::new()
//!     .route("/api/orders", post(place_order))
//!     .layer(correlation_id_layer());
//! ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderValue},
    response::Response,
};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

tokio::task_local! {
    static CURRENT: CorrelationId;
}

/// Identifier shared by every log line and outbound call of one request.
///
/// Generated ids are UUID v4 in simple form (32 hex digits, no dashes).
/// Inbound ids are taken verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Id from a header value, or a fresh one when the value is missing,
    /// blank or not visible ASCII. Non-blank values are kept unmodified.
    #[must_use]
    pub fn from_header(value: Option<&HeaderValue>) -> Self {
        value
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.trim().is_empty())
            .map_or_else(Self::generate, |s| Self(s.to_string()))
    }

    /// The id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of the request being served by the current task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(Self::clone).ok()
    }

    /// Run `future` with `self` as the task's current id.
    pub async fn scope<F: Future>(self, future: F) -> F::Output {
        CURRENT.scope(self, future).await
    }

    fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_else(|| Self::from_header(parts.headers.get(CORRELATION_ID_HEADER))))
    }
}

/// Create a layer that adds correlation ID tracking to all requests.
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for inbound correlation ID tracking.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for inbound correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = CorrelationId::from_header(req.headers().get(CORRELATION_ID_HEADER));
        req.extensions_mut().insert(correlation_id.clone());

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            uri = %req.uri(),
        );

        let fut = self.inner.call(req);
        let scoped = correlation_id.clone();

        Box::pin(CURRENT.scope(scoped, async move {
            let mut response = fut.instrument(span).await?;

            if !response.headers().contains_key(CORRELATION_ID_HEADER) {
                if let Some(value) = correlation_id.header_value() {
                    response.headers_mut().insert(CORRELATION_ID_HEADER, value);
                }
            }

            Ok(response)
        }))
    }
}

/// Layer for outbound HTTP clients that forwards the current correlation ID.
///
/// Requests that already carry the header are left untouched, as are requests
/// sent outside a correlated task.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropagateCorrelationIdLayer;

impl<S> Layer<S> for PropagateCorrelationIdLayer {
    type Service = PropagateCorrelationId<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PropagateCorrelationId { inner }
    }
}

/// Outbound service adding `X-Correlation-ID` to requests.
#[derive(Clone, Debug)]
pub struct PropagateCorrelationId<S> {
    inner: S,
}

impl<S, B> Service<http::Request<B>> for PropagateCorrelationId<S>
where
    S: Service<http::Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        if !req.headers().contains_key(CORRELATION_ID_HEADER) {
            if let Some(value) = CorrelationId::current().and_then(|id| id.header_value()) {
                req.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }
        }
        self.inner.call(req)
    }
}
