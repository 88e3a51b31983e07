use field_core::{AppError, Session};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::auth::AuthLoginArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
pub(super) struct AuthLoginResponse {
    authenticated: bool,
    user_id: String,
    email: String,
    expires_at: Option<String>,
}

impl From<&Session> for AuthLoginResponse {
    fn from(session: &Session) -> Self {
        Self {
            authenticated: true,
            user_id: session.id.clone(),
            email: session.email.clone(),
            expires_at: field_session::token_expiry(&session.token).map(|at| at.to_rfc3339()),
        }
    }
}

/// Attach the user-facing text of a failure as context.
pub(super) fn describe(action: &'static str) -> impl FnOnce(AppError) -> anyhow::Error {
    move |error| {
        let user_message = error.user_message();
        anyhow::Error::new(error).context(format!("{action}: {user_message}"))
    }
}

pub async fn handle(
    args: &AuthLoginArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let session = ctx
        .layer
        .auth()
        .sign_in(&args.email, &args.password)
        .await
        .map_err(describe("auth login"))?;

    output(&AuthLoginResponse::from(&session), flags.format)
}
