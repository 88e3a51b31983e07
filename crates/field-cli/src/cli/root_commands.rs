use clap::{Args, Subcommand, ValueEnum};

use crate::cli::subcommands::AuthCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Sign in, sign up, sign out and inspect the session.
    Auth {
        #[command(subcommand)]
        action: AuthCommands,
    },
    /// Restore the session and print where navigation lands.
    Route,
    /// Send an authenticated request and print the JSON response.
    Request(RequestArgs),
}

impl Commands {
    /// Command path as typed, without arguments.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Auth { action } => action.name(),
            Self::Route => "route",
            Self::Request(_) => "request",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RequestMethod {
    Get,
    Delete,
}

#[derive(Clone, Debug, Args)]
pub struct RequestArgs {
    /// HTTP method.
    pub method: RequestMethod,
    /// Path relative to the configured base URL (e.g. /visits).
    pub path: String,
}
