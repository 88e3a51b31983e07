//! Top-level navigation routes.
//!
//! Routes serialize as `snake_case`. The route state machine exposes
//! `allowed_next_states()` so the navigation gate can reject impossible moves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level route chosen by the navigation gate.
///
/// ```text
/// gate → auth ⇄ main
///      → main
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Session status unknown; restoration still running.
    Gate,
    /// Unauthenticated destinations.
    Auth,
    /// Authenticated destinations.
    Main,
}

impl Route {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Gate => &[Self::Auth, Self::Main],
            Self::Auth => &[Self::Main],
            Self::Main => &[Self::Auth],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gate => "gate",
            Self::Auth => "auth",
            Self::Main => "main",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
