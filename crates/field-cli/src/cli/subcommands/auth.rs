use clap::{Args, Subcommand};

/// Authentication commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AuthCommands {
    /// Sign in with email and password.
    Login(AuthLoginArgs),
    /// Create an account and sign in to it.
    Signup(AuthSignupArgs),
    /// Sign out and clear the stored credential.
    Logout,
    /// Restore the stored session and show who is signed in.
    Status,
}

impl AuthCommands {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "auth login",
            Self::Signup(_) => "auth signup",
            Self::Logout => "auth logout",
            Self::Status => "auth status",
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct AuthLoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

#[derive(Clone, Debug, Args)]
pub struct AuthSignupArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    /// Display name.
    #[arg(long)]
    pub name: Option<String>,
}
