use field_core::responses::SignUpRequest;

use super::login::{AuthLoginResponse, describe};
use crate::cli::GlobalFlags;
use crate::cli::subcommands::auth::AuthSignupArgs;
use crate::context::AppContext;
use crate::output::output;

pub async fn handle(
    args: &AuthSignupArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let request = SignUpRequest {
        name: args.name.clone(),
        email: args.email.clone(),
        password: args.password.clone(),
    };
    let session = ctx
        .layer
        .auth()
        .sign_up(&request)
        .await
        .map_err(describe("auth signup"))?;

    output(&AuthLoginResponse::from(&session), flags.format)
}
