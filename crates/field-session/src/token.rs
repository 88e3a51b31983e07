use base64::Engine as _;
use chrono::{DateTime, Utc};

/// Read the `exp` claim of a JWT-shaped credential.
///
/// Display-only: the signature is NOT verified, and opaque (non-JWT)
/// credentials simply yield `None`.
#[must_use]
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

/// `true` when the credential is a JWT whose expiry falls within
/// `buffer_secs` from now. Opaque credentials are never considered expired.
#[must_use]
pub fn expires_within(token: &str, buffer_secs: i64) -> bool {
    token_expiry(token)
        .is_some_and(|exp| exp <= Utc::now() + chrono::TimeDelta::seconds(buffer_secs))
}
