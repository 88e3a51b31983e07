//! Request and response bodies exchanged with the field-operations API.
//!
//! Unknown fields are ignored and optional fields default when absent, so
//! older clients keep working as the server adds fields.

use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::Session;

/// Generic error body returned by the API on failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Best-effort parse. Absent or malformed bodies yield `None`.
    #[must_use]
    pub fn parse(body: &[u8]) -> Option<Self> {
        if body.is_empty() {
            return None;
        }
        serde_json::from_slice(body).ok()
    }

    /// `error`, then `message`.
    #[must_use]
    pub fn error_first(&self) -> Option<&str> {
        non_blank(self.error.as_deref()).or_else(|| non_blank(self.message.as_deref()))
    }

    /// `message`, then `error`.
    #[must_use]
    pub fn message_first(&self) -> Option<&str> {
        non_blank(self.message.as_deref()).or_else(|| non_blank(self.error.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

/// Authenticated user as described by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub email: String,
}

impl UserProfile {
    /// Pair the profile with the credential that authenticated it.
    #[must_use]
    pub fn into_session(self, token: String) -> Session {
        Session {
            id: self.id,
            email: self.email,
            token,
        }
    }
}

/// Response of the login and registration endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

impl AuthResponse {
    #[must_use]
    pub fn into_session(self) -> Session {
        self.user.into_session(self.token)
    }
}

/// Accept a JSON string, number or boolean where a string is expected.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string-like value, got {other}"
        ))),
    }
}
