//! Well-known HTTP failure categories and RFC 9457 problem-details bodies.
//!
//! Each [`ProblemKind`] maps to a fixed title, a default detail sentence, the
//! RFC section describing the status, and the status code itself. Web layers
//! render them as `application/problem+json` via [`ProblemDetails`].
//!
//! # Example
//!
//! ```
//! use crosscut_core::problem::{ProblemDetails, ProblemKind};
//!
//! let kind = ProblemKind::NotFound;
//! assert_eq!(kind.status(), 404);
//! assert_eq!(kind.title(), "Not Found");
//!
//! let body = ProblemDetails::from_kind(kind).with_instance("/users/7");
//! assert_eq!(body.instance.as_deref(), Some("/users/7"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! problem_kinds {
    ($(
        $(#[$meta:meta])*
        $kind:ident => $status:literal, $title:literal, $detail:literal, $uri:literal;
    )+) => {
        /// A well-known failure category with a fixed problem-details triple.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ProblemKind {
            $(
                $(#[$meta])*
                $kind,
            )+
        }

        impl ProblemKind {
            /// Every kind, in ascending status order.
            pub const ALL: &'static [Self] = &[$(Self::$kind),+];

            /// HTTP status code.
            #[must_use]
            pub const fn status(self) -> u16 {
                match self {
                    $(Self::$kind => $status,)+
                }
            }

            /// Short human-readable title.
            #[must_use]
            pub const fn title(self) -> &'static str {
                match self {
                    $(Self::$kind => $title,)+
                }
            }

            /// Default explanation of the failure.
            #[must_use]
            pub const fn detail(self) -> &'static str {
                match self {
                    $(Self::$kind => $detail,)+
                }
            }

            /// URI of the RFC section defining the status.
            #[must_use]
            pub const fn type_uri(self) -> &'static str {
                match self {
                    $(Self::$kind => $uri,)+
                }
            }

            /// Kind for a status code, if it is one of the well-known ones.
            #[must_use]
            pub const fn from_status(status: u16) -> Option<Self> {
                match status {
                    $($status => Some(Self::$kind),)+
                    _ => None,
                }
            }
        }
    };
}

problem_kinds! {
    /// 400
    BadRequest => 400, "Bad Request", "Invalid request payload",
        "https://tools.ietf.org/html/rfc9110#section-15.5.1";
    /// 401
    Unauthorized => 401, "Unauthorized", "You are not authorized to access this resource",
        "https://tools.ietf.org/html/rfc9110#section-15.5.2";
    /// 402
    PaymentRequired => 402, "Payment Required", "Payment is required to access this resource",
        "https://tools.ietf.org/html/rfc9110#section-15.5.3";
    /// 403
    Forbidden => 403, "Forbidden", "You do not have permission to access this resource",
        "https://tools.ietf.org/html/rfc9110#section-15.5.4";
    /// 404
    NotFound => 404, "Not Found", "The requested resource was not found",
        "https://tools.ietf.org/html/rfc9110#section-15.5.5";
    /// 405
    MethodNotAllowed => 405, "Method Not Allowed",
        "The method specified in the request is not allowed for the resource",
        "https://tools.ietf.org/html/rfc9110#section-15.5.6";
    /// 406
    NotAcceptable => 406, "Not Acceptable",
        "The requested resource is not capable of generating content acceptable according to the Accept headers",
        "https://tools.ietf.org/html/rfc9110#section-15.5.7";
    /// 407
    ProxyAuthenticationRequired => 407, "Proxy Authentication Required",
        "Proxy authentication is required",
        "https://tools.ietf.org/html/rfc9110#section-15.5.8";
    /// 408
    RequestTimeout => 408, "Request Timeout", "The server timed out waiting for the request",
        "https://tools.ietf.org/html/rfc9110#section-15.5.9";
    /// 409
    Conflict => 409, "Conflict",
        "The request could not be completed due to a conflict with the current state of the resource",
        "https://tools.ietf.org/html/rfc9110#section-15.5.10";
    /// 410
    Gone => 410, "Gone", "The requested resource is no longer available",
        "https://tools.ietf.org/html/rfc9110#section-15.5.11";
    /// 411
    LengthRequired => 411, "Length Required", "Content-Length header is required",
        "https://tools.ietf.org/html/rfc9110#section-15.5.12";
    /// 412
    PreconditionFailed => 412, "Precondition Failed",
        "Precondition given in the request evaluated to false",
        "https://tools.ietf.org/html/rfc9110#section-15.5.13";
    /// 413
    PayloadTooLarge => 413, "Payload Too Large", "The request payload is too large",
        "https://tools.ietf.org/html/rfc9110#section-15.5.14";
    /// 414
    UriTooLong => 414, "URI Too Long", "The requested URI is too long",
        "https://tools.ietf.org/html/rfc9110#section-15.5.15";
    /// 415
    UnsupportedMediaType => 415, "Unsupported Media Type",
        "The request entity has a media type which the server or resource does not support",
        "https://tools.ietf.org/html/rfc9110#section-15.5.16";
    /// 416
    RangeNotSatisfiable => 416, "Range Not Satisfiable", "The requested range cannot be satisfied",
        "https://tools.ietf.org/html/rfc9110#section-15.5.17";
    /// 417
    ExpectationFailed => 417, "Expectation Failed",
        "The server cannot meet the requirements of the Expect request-header field",
        "https://tools.ietf.org/html/rfc9110#section-15.5.18";
    /// 418
    ImATeapot => 418, "I'm a teapot",
        "The server refuses to brew coffee because it is, permanently, a teapot",
        "https://tools.ietf.org/html/rfc9110#section-15.5.19";
    /// 421
    MisdirectedRequest => 421, "Misdirected Request",
        "The request was directed at a server that is not able to produce a response",
        "https://tools.ietf.org/html/rfc9110#section-15.5.20";
    /// 422
    UnprocessableContent => 422, "Unprocessable Content",
        "The server understands the content type of the request entity, but was unable to process the contained instructions",
        "https://tools.ietf.org/html/rfc9110#section-15.5.21";
    /// 423
    Locked => 423, "Locked", "The resource that is being accessed is locked",
        "https://tools.ietf.org/html/rfc4918#section-11.3";
    /// 424
    FailedDependency => 424, "Failed Dependency",
        "The request failed due to failure of a previous request",
        "https://tools.ietf.org/html/rfc4918#section-11.4";
    /// 425
    TooEarly => 425, "Too Early",
        "The server is unwilling to risk processing a request that might be replayed",
        "https://tools.ietf.org/html/rfc8470#section-5.2";
    /// 426
    UpgradeRequired => 426, "Upgrade Required", "The client should switch to a different protocol",
        "https://tools.ietf.org/html/rfc9110#section-15.5.22";
    /// 428
    PreconditionRequired => 428, "Precondition Required",
        "The server requires the request to be conditional",
        "https://tools.ietf.org/html/rfc6585#section-3";
    /// 429
    TooManyRequests => 429, "Too Many Requests",
        "The user has sent too many requests in a given amount of time",
        "https://tools.ietf.org/html/rfc6585#section-4";
    /// 431
    RequestHeaderFieldsTooLarge => 431, "Request Header Fields Too Large",
        "The server is unwilling to process the request because its header fields are too large",
        "https://tools.ietf.org/html/rfc6585#section-5";
    /// 451
    UnavailableForLegalReasons => 451, "Unavailable For Legal Reasons",
        "The resource is unavailable for legal reasons",
        "https://tools.ietf.org/html/rfc7725#section-3";
    /// 500
    InternalServerError => 500, "Internal Server Error",
        "Unknown error has occurred during data processing",
        "https://tools.ietf.org/html/rfc9110#section-15.6.1";
    /// 503
    ServiceUnavailable => 503, "Service Unavailable", "The service is currently unavailable.",
        "https://tools.ietf.org/html/rfc9110#section-15.6.4";
}

impl ProblemKind {
    /// Whether the status is a 5xx server error.
    #[must_use]
    pub const fn is_server_error(self) -> bool {
        self.status() >= 500
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status(), self.title())
    }
}

/// RFC 9457 problem-details body.
///
/// Absent members are omitted when serialized. `errors` and `correlationId`
/// are extension members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// URI identifying the problem type.
    #[serde(rename = "type")]
    pub type_uri: String,
    /// Short summary of the problem type.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Explanation specific to this occurrence.
    pub detail: String,
    /// URI reference identifying this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Domain error messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Correlation id of the request that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ProblemDetails {
    /// Body populated from the fixed table entry for `kind`.
    #[must_use]
    pub fn from_kind(kind: ProblemKind) -> Self {
        Self {
            type_uri: kind.type_uri().to_string(),
            title: kind.title().to_string(),
            status: kind.status(),
            detail: kind.detail().to_string(),
            instance: None,
            errors: Vec::new(),
            correlation_id: None,
        }
    }

    /// Replace the default detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Set the occurrence URI.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Attach domain error messages.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    /// Attach the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

impl From<ProblemKind> for ProblemDetails {
    fn from(kind: ProblemKind) -> Self {
        Self::from_kind(kind)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_is_consistent() {
        assert_eq!(ProblemKind::ALL.len(), 31);

        let statuses: HashSet<u16> = ProblemKind::ALL.iter().map(|k| k.status()).collect();
        assert_eq!(statuses.len(), ProblemKind::ALL.len());

        for kind in ProblemKind::ALL {
            assert_eq!(ProblemKind::from_status(kind.status()), Some(*kind));
            assert!(kind.type_uri().starts_with("https://tools.ietf.org/html/rfc"));
            assert!(!kind.title().is_empty());
            assert!(!kind.detail().is_empty());
        }
    }

    #[test]
    fn test_unknown_status() {
        assert_eq!(ProblemKind::from_status(200), None);
        assert_eq!(ProblemKind::from_status(502), None);
    }

    #[test]
    fn test_server_error_classification() {
        assert!(ProblemKind::InternalServerError.is_server_error());
        assert!(!ProblemKind::Conflict.is_server_error());
        assert_eq!(ProblemKind::ImATeapot.to_string(), "418 I'm a teapot");
    }
}
