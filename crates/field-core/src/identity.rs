use std::fmt;

use serde::{Deserialize, Serialize};

/// The currently authenticated identity.
///
/// Produced by `field-net` after a successful authentication or
/// restoration call and owned by the `SessionStore` in `field-session`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Observable snapshot of the session layer.
///
/// `is_ready == false` means restoration has not finished and authentication
/// status is unknown, not that the user is signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub is_ready: bool,
    pub user: Option<Session>,
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}
