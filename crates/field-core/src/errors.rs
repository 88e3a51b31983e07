//! Closed error taxonomy shared by every fallible call site.
//!
//! Transport and parsing failures are classified into an [`ErrorKind`] and
//! carried in an [`AppError`]. Cancellation is deliberately absent from the
//! taxonomy: it is reported as [`Cancelled`] and never folded into an
//! `AppError`.

use std::fmt;

use thiserror::Error;

/// Result type returned by every fallible operation in the session layer.
pub type AppResult<T> = Result<T, AppError>;

/// Boxed underlying cause attached to an [`AppError`].
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Unauthorized,
    Forbidden,
    NotFound,
    /// Request rejected as invalid. `code` distinguishes conflict responses.
    Validation { code: Option<String> },
    RateLimited { retry_after_secs: Option<u64> },
    ServiceUnavailable,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Validation { .. } => "validation",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub cause: Option<Cause>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying failure.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn validation(code: Option<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation { code }, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Seconds the server asked the caller to wait, for rate-limited errors.
    #[must_use]
    pub const fn retry_after_secs(&self) -> Option<u64> {
        match self.kind {
            ErrorKind::RateLimited { retry_after_secs } => retry_after_secs,
            _ => None,
        }
    }

    /// Whether the caller should return the user to the unauthenticated route.
    #[must_use]
    pub const fn forces_logout(&self) -> bool {
        matches!(self.kind, ErrorKind::Unauthorized)
    }

    /// Whether retrying the same request later can reasonably succeed.
    ///
    /// The layer itself never retries; this only informs the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Network
                | ErrorKind::RateLimited { .. }
                | ErrorKind::ServiceUnavailable
                | ErrorKind::Unknown
        )
    }

    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match &self.kind {
            ErrorKind::Validation { .. } => self.message.clone(),
            ErrorKind::RateLimited {
                retry_after_secs: Some(secs),
            } => format!("Too many requests. Try again in {secs} seconds."),
            ErrorKind::RateLimited {
                retry_after_secs: None,
            } => "Too many requests. Try again shortly.".to_string(),
            ErrorKind::Unauthorized => "Your session has ended. Please sign in again.".to_string(),
            ErrorKind::Forbidden => "You do not have access to this resource.".to_string(),
            ErrorKind::NotFound => "The requested item could not be found.".to_string(),
            ErrorKind::Network => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ErrorKind::ServiceUnavailable | ErrorKind::Unknown => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

/// Distinguished outcome of an explicitly cancelled operation.
///
/// Never converted into an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;
