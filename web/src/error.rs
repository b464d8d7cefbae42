//! Error types for web handlers.
//!
//! [`AppError`] bridges domain failures and HTTP responses. Every error is
//! rendered as an RFC 9457 problem document (`application/problem+json`)
//! built from the [`ProblemKind`] table, stamped with the request's
//! correlation id when one is in scope.

use crate::correlation::CorrelationId;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use crosscut_core::{Failure, MediatorError, ProblemDetails, ProblemKind};
use std::fmt;

/// Content type of problem documents.
pub const PROBLEM_JSON: &str = "application/problem+json";

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn get_order(
///     State(state): State<AppState>,
///     Path(id): Path<u64>,
/// ) -> WebResult<Json<Order>> {
///     let order = state
///         .mediator
///         .send(GetOrder { id }, &CancellationToken::new())
///         .await?        // MediatorError -> 500
///         .into_result()?; // Failure -> status from its code
///     Ok(Json(order))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    kind: ProblemKind,
    detail: Option<String>,
    errors: Vec<String>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create an error of `kind` with the table's default detail.
    #[must_use]
    pub const fn new(kind: ProblemKind) -> Self {
        Self {
            kind,
            detail: None,
            errors: Vec::new(),
            source: None,
        }
    }

    /// Override the user-facing detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach domain error messages.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    /// Attach an internal source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(ProblemKind::BadRequest).with_detail(detail)
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(ProblemKind::Unauthorized).with_detail(detail)
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(ProblemKind::Forbidden).with_detail(detail)
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(ProblemKind::NotFound).with_detail(format!("{resource} with id {id} not found"))
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(ProblemKind::Conflict).with_detail(detail)
    }

    /// Create a 422 Unprocessable Content error.
    #[must_use]
    pub fn validation(errors: Vec<String>) -> Self {
        Self::new(ProblemKind::UnprocessableContent).with_errors(errors)
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub const fn internal() -> Self {
        Self::new(ProblemKind::InternalServerError)
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(ProblemKind::ServiceUnavailable).with_detail(detail)
    }

    /// Problem category.
    #[must_use]
    pub const fn kind(&self) -> ProblemKind {
        self.kind
    }

    /// HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.kind.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Domain error messages.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Problem document for this error, without correlation id.
    #[must_use]
    pub fn problem(&self) -> ProblemDetails {
        let problem = ProblemDetails::from_kind(self.kind).with_errors(self.errors.clone());
        match &self.detail {
            Some(detail) => problem.with_detail(detail.clone()),
            None => problem,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.kind.status(),
            self.detail.as_deref().unwrap_or_else(|| self.kind.title())
        )
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut problem = self.problem();
        if let Some(id) = CorrelationId::current() {
            problem = problem.with_correlation_id(id.as_str());
        }

        if self.kind.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = self.kind.status(),
                    title = self.kind.title(),
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = self.kind.status(),
                    title = self.kind.title(),
                    "Internal server error"
                ),
            }
        }

        (
            self.status(),
            [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON))],
            Json(problem),
        )
            .into_response()
    }
}

/// Map a domain failure: a code that is a known HTTP status selects that
/// problem kind, anything else is a 400.
impl From<Failure> for AppError {
    fn from(failure: Failure) -> Self {
        let kind = u16::try_from(failure.code())
            .ok()
            .and_then(ProblemKind::from_status)
            .unwrap_or(ProblemKind::BadRequest);
        Self::new(kind).with_errors(failure.into_messages())
    }
}

/// Wiring errors are server faults.
impl From<MediatorError> for AppError {
    fn from(err: MediatorError) -> Self {
        Self::internal().with_source(anyhow::Error::new(err))
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal().with_source(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::bad_request("Invalid input").to_string(),
            "[400] Invalid input"
        );
        assert_eq!(AppError::internal().to_string(), "[500] Internal Server Error");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Order", "123");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.problem().detail, "Order with id 123 not found");
    }

    #[test]
    fn test_failure_with_known_status() {
        let err = AppError::from(Failure::with_code(409, ["version mismatch"]));
        assert_eq!(err.kind(), ProblemKind::Conflict);
        assert_eq!(err.errors(), ["version mismatch"]);
    }

    #[test]
    fn test_failure_with_unknown_code_is_bad_request() {
        assert_eq!(
            AppError::from(Failure::new(["nope"])).kind(),
            ProblemKind::BadRequest
        );
        assert_eq!(
            AppError::from(Failure::with_code(299, ["odd"])).kind(),
            ProblemKind::BadRequest
        );
    }

    #[test]
    fn test_mediator_error_is_internal() {
        let err = AppError::from(MediatorError::HandlerNotRegistered {
            request_type: "Ping",
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn test_response_is_problem_json() {
        let response = AppError::validation(vec!["email is required".into()]).into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PROBLEM_JSON);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 422);
        assert_eq!(json["title"], "Unprocessable Content");
        assert_eq!(json["errors"][0], "email is required");
        assert!(json.get("correlationId").is_none());
    }
}
