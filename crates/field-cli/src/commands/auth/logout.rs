use serde::Serialize;

use super::login::describe;
use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct AuthLogoutResponse {
    cleared: bool,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.layer
        .auth()
        .sign_out()
        .await
        .map_err(describe("auth logout"))?;
    output(&AuthLogoutResponse { cleared: true }, flags.format)
}
