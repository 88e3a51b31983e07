//! Classification of transport failures into the error taxonomy.
//!
//! Centralizes status-code handling (`Retry-After` parsing on 429, body
//! message extraction on 400/409/422) so callers only ever see an
//! [`AppError`]. Body parsing is best-effort: an absent or malformed body
//! falls back to generic text.

use field_core::responses::ApiErrorBody;
use field_core::{AppError, ErrorKind};
use reqwest::header;

use crate::transport::{HttpResponse, TransportFailure};

pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Map a failure to its taxonomy member.
#[must_use]
pub fn map_failure(failure: TransportFailure) -> AppError {
    match failure {
        TransportFailure::Status(response) => map_status(&response),
        TransportFailure::Timeout(cause) => {
            let error = AppError::network(TIMEOUT_MESSAGE);
            match cause {
                Some(cause) => error.with_cause(cause),
                None => error,
            }
        }
        TransportFailure::Io(cause) => {
            AppError::network(format!("Network error: {cause}")).with_cause(cause)
        }
        TransportFailure::Encode(cause) => {
            AppError::unknown(format!("Could not encode request: {cause}")).with_cause(cause)
        }
        TransportFailure::Decode(cause) => {
            AppError::unknown(format!("Unexpected response format: {cause}")).with_cause(cause)
        }
        TransportFailure::Other(cause) => {
            AppError::unknown(format!("Unexpected error: {cause}")).with_cause(cause)
        }
    }
}

/// Map a non-success response.
#[must_use]
pub fn map_status(response: &HttpResponse) -> AppError {
    let body = ApiErrorBody::parse(&response.body).unwrap_or_default();
    let status = response.status.as_u16();

    match status {
        400 => AppError::validation(None, body.error_first().unwrap_or("Invalid request")),
        401 => AppError::unauthorized(body.message_first().unwrap_or("Authentication required")),
        403 => AppError::new(
            ErrorKind::Forbidden,
            body.message_first().unwrap_or("Access denied"),
        ),
        404 => AppError::new(
            ErrorKind::NotFound,
            body.message_first().unwrap_or("Resource not found"),
        ),
        408 => AppError::network(TIMEOUT_MESSAGE),
        409 => AppError::validation(
            Some("409".to_string()),
            body.message_first().unwrap_or("Conflict"),
        ),
        422 => AppError::validation(None, body.message_first().unwrap_or("Validation failed")),
        429 => {
            let retry_after_secs = parse_retry_after(response);
            AppError::new(
                ErrorKind::RateLimited { retry_after_secs },
                body.message_first().unwrap_or("Too many requests"),
            )
        }
        500..=599 => AppError::new(
            ErrorKind::ServiceUnavailable,
            format!("Service unavailable (HTTP {status})"),
        ),
        _ => AppError::unknown(format!("Unexpected HTTP status {status}")),
    }
}

/// Parse the `Retry-After` header as whole seconds.
fn parse_retry_after(response: &HttpResponse) -> Option<u64> {
    response
        .header(&header::RETRY_AFTER)
        .and_then(|v| v.trim().parse::<u64>().ok())
}
