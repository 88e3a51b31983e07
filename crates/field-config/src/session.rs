//! Session invalidation settings.

use serde::{Deserialize, Serialize};

/// Error codes that, on a 401 response, mean the server has ended the session.
pub const DEFAULT_INVALIDATION_CODES: &[&str] = &[
    "SESSION_INVALIDATED",
    "TRIAL_EXPIRED",
    "PLAN_EXPIRED",
    "MISSING_TOKEN",
];

fn default_invalidation_codes() -> Vec<String> {
    DEFAULT_INVALIDATION_CODES
        .iter()
        .map(|code| (*code).to_string())
        .collect()
}

const fn default_rearm_on_sign_in() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_invalidation_codes")]
    pub invalidation_codes: Vec<String>,

    /// Re-enable invalidation detection after a fresh sign-in.
    #[serde(default = "default_rearm_on_sign_in")]
    pub rearm_on_sign_in: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            invalidation_codes: default_invalidation_codes(),
            rearm_on_sign_in: default_rearm_on_sign_in(),
        }
    }
}
