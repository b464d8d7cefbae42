//! Success/failure values for expected business outcomes.
//!
//! [`Outcome`] replaces thrown-error control flow for failures that callers are
//! expected to handle: validation problems, missing entities, rejected
//! commands. A failure carries a numeric code and an ordered list of messages;
//! a success optionally carries a payload.
//!
//! # Example
//!
//! ```
//! use crosscut_core::outcome::{Outcome, DEFAULT_ERROR_CODE};
//!
//! let ok: Outcome<u32> = Outcome::success_with(7);
//! assert_eq!(ok.value(), Some(&7));
//! assert_eq!(ok.code(), None);
//!
//! let failed: Outcome = Outcome::failure(["name is required"]);
//! assert_eq!(failed.code(), Some(DEFAULT_ERROR_CODE));
//! assert_eq!(failed.error_messages(), Some(&["name is required".to_string()][..]));
//! ```

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Code reported by failures constructed without an explicit code.
pub const DEFAULT_ERROR_CODE: i32 = -1;

/// Failure payload: a numeric code plus ordered error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    code: i32,
    messages: Vec<String>,
}

impl Failure {
    /// Create a failure with [`DEFAULT_ERROR_CODE`].
    #[must_use]
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_code(DEFAULT_ERROR_CODE, messages)
    }

    /// Create a failure with an explicit code.
    #[must_use]
    pub fn with_code<I, S>(code: i32, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            code,
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    /// Numeric failure code.
    #[must_use]
    pub const fn code(&self) -> i32 {
        self.code
    }

    /// Error messages in the order they were supplied.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Consume the failure, returning its messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            write!(f, "[{}] failure", self.code)
        } else {
            write!(f, "[{}] {}", self.code, self.messages.join("; "))
        }
    }
}

impl std::error::Error for Failure {}

/// Immutable success/failure value.
///
/// `Outcome` (no type argument) is the value-less form; `Outcome<T>` carries a
/// payload on success. Reading [`code`](Self::code) or
/// [`error_messages`](Self::error_messages) on a success yields `None`, and
/// reading [`value`](Self::value) on a failure yields `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T = ()> {
    /// The operation succeeded.
    Success(T),
    /// The operation failed with a code and messages.
    Failure(Failure),
}

impl Outcome {
    /// Value-less success.
    pub const fn success() -> Self {
        Self::Success(())
    }

    /// Build a value-less outcome from an optional code and a message list.
    ///
    /// An empty message list is a success regardless of the code; otherwise a
    /// failure with the given code (or [`DEFAULT_ERROR_CODE`]).
    pub fn from_parts(code: Option<i32>, messages: Vec<String>) -> Self {
        if messages.is_empty() {
            Self::Success(())
        } else {
            Self::Failure(Failure {
                code: code.unwrap_or(DEFAULT_ERROR_CODE),
                messages,
            })
        }
    }

    /// Attach a payload to a success, carrying a failure over unchanged.
    pub fn with_value<T>(self, value: T) -> Outcome<T> {
        match self {
            Self::Success(()) => Outcome::Success(value),
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }
}

impl<T> Outcome<T> {
    /// Success carrying `value`.
    pub const fn success_with(value: T) -> Self {
        Self::Success(value)
    }

    /// Failure with [`DEFAULT_ERROR_CODE`].
    ///
    /// An explicitly empty message list still produces a failure.
    pub fn failure<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Failure(Failure::new(messages))
    }

    /// Failure with an explicit code.
    pub fn failure_with_code<I, S>(code: i32, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Failure(Failure::with_code(code, messages))
    }

    /// Whether this outcome is a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether this outcome is a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Failure code, `None` on success.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.code),
        }
    }

    /// Failure messages, `None` on success.
    #[must_use]
    pub fn error_messages(&self) -> Option<&[String]> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.messages()),
        }
    }

    /// Payload, `None` on failure.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Consume the outcome, returning the payload if it succeeded.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Failure payload, `None` on success.
    #[must_use]
    pub const fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Convert into a standard `Result` for use with `?`.
    ///
    /// # Errors
    ///
    /// Returns the [`Failure`] when the outcome failed.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }

    /// Transform the payload of a success.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }

    /// Drop the payload, keeping success/failure, code and messages.
    pub fn discard_value(self) -> Outcome {
        match self {
            Self::Success(_) => Outcome::Success(()),
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }
}

impl<T> From<Failure> for Outcome<T> {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

impl<T> From<Result<T, Failure>> for Outcome<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, Failure> {
    fn from(outcome: Outcome<T>) -> Self {
        outcome.into_result()
    }
}

/// Successes serialize as `{ "isSuccess": true, "value" }`, failures as
/// `{ "isSuccess": false, "code", "errorMessages" }`. A value-less success
/// carries `"value": null`.
impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(value) => {
                let mut state = serializer.serialize_struct("Outcome", 2)?;
                state.serialize_field("isSuccess", &true)?;
                state.serialize_field("value", value)?;
                state.end()
            }
            Self::Failure(failure) => {
                let mut state = serializer.serialize_struct("Outcome", 3)?;
                state.serialize_field("isSuccess", &false)?;
                state.serialize_field("code", &failure.code)?;
                state.serialize_field("errorMessages", &failure.messages)?;
                state.end()
            }
        }
    }
}
