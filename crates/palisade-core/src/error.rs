//! Error types delivered to the terminal callback.
//!
//! Every failure that happens while an invocation is running (plugin
//! rejection, user function failure, panic) is represented as an
//! [`InvocationError`]. Configuration errors are a construction-time contract
//! violation and live in `palisade-config`; they never become invocation
//! errors.
//!
//! | `ErrorKind`      | Raised by                                        |
//! |------------------|--------------------------------------------------|
//! | `Authentication` | token decoding, signature or XSRF verification   |
//! | `Validation`     | schema validation of the event                   |
//! | `Protection`     | SQL-injection detection in `fail` mode           |
//! | `User`           | the wrapped user function                        |
//! | `Internal`       | panics escaping a plugin, broken hook contracts  |

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::Location;
use thiserror::Error;

/// Boxed error type accepted from user code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using [`InvocationError`].
pub type InvocationResult<T> = Result<T, InvocationError>;

/// Classification of invocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Token decode, signature or XSRF failure.
    Authentication,
    /// Event failed schema validation.
    Validation,
    /// Event rejected by injection protection.
    Protection,
    /// The user function failed.
    User,
    /// Orchestration failure.
    Internal,
}

impl ErrorKind {
    /// Returns the error type name reported to callers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Authentication => "AuthenticationError",
            Self::Validation => "ValidationError",
            Self::Protection => "ProtectionError",
            Self::User => "UserError",
            Self::Internal => "InternalError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An invocation failure.
///
/// Carries a kind, a message, the underlying error (if any) and a captured
/// stack. The stack always holds at least the creation site; full backtrace
/// frames are added when `RUST_BACKTRACE` enables capture.
///
/// # Example
///
/// ```
/// use palisade_core::{ErrorKind, InvocationError};
///
/// let mut err = InvocationError::authentication("token expired");
/// assert_eq!(err.kind(), ErrorKind::Authentication);
/// assert!(!err.stack().is_empty());
///
/// err.strip_stack();
/// assert!(err.stack().is_empty());
/// assert_eq!(err.to_string(), "token expired");
/// ```
#[derive(Error, Debug)]
#[error("{message}")]
pub struct InvocationError {
    kind: ErrorKind,
    message: String,
    stack: Vec<String>,
    #[source]
    source: Option<BoxError>,
}

impl InvocationError {
    /// Creates an error of the given kind.
    #[must_use]
    #[track_caller]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: capture_stack(),
            source: None,
        }
    }

    /// Wraps an underlying error, reusing its message.
    #[must_use]
    #[track_caller]
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self {
            kind,
            message: source.to_string(),
            stack: capture_stack(),
            source: Some(source),
        }
    }

    /// Builds an error from a caught panic payload.
    #[must_use]
    #[track_caller]
    pub fn from_panic(kind: ErrorKind, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_string());
        Self::new(kind, message)
    }

    /// Creates an authentication error.
    #[must_use]
    #[track_caller]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Creates a validation error.
    #[must_use]
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates a protection error.
    #[must_use]
    #[track_caller]
    pub fn protection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protection, message)
    }

    /// Creates a user error.
    #[must_use]
    #[track_caller]
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::User, message)
    }

    /// Creates an internal error.
    #[must_use]
    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the captured stack frames.
    #[must_use]
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    /// Clears the stack, keeping message, kind and source.
    pub fn strip_stack(&mut self) {
        self.stack.clear();
    }

    /// Consuming variant of [`strip_stack`](Self::strip_stack).
    #[must_use]
    pub fn stripped(mut self) -> Self {
        self.strip_stack();
        self
    }
}

#[track_caller]
fn capture_stack() -> Vec<String> {
    let location = Location::caller();
    let mut frames = vec![format!(
        "at {}:{}:{}",
        location.file(),
        location.line(),
        location.column()
    )];

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        frames.extend(
            backtrace
                .to_string()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string),
        );
    }
    frames
}
