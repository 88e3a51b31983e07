use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Credentials expiring within this window are flagged in the status.
const EXPIRY_WARNING_SECS: i64 = 300;

#[derive(Serialize)]
struct AuthStatusResponse {
    authenticated: bool,
    user_id: Option<String>,
    email: Option<String>,
    expires_at: Option<String>,
    expiring_soon: bool,
    credential_backend: &'static str,
    api: String,
    note: Option<String>,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let layer = &ctx.layer;
    let restored = layer.auth().restore().await;
    let credential_kept = layer.credentials().has();

    let note = match (&restored, credential_kept) {
        (Some(_), _) => None,
        (None, true) => Some("stored credential could not be verified; try again later".into()),
        (None, false) => Some("not signed in".into()),
    };

    let status = AuthStatusResponse {
        authenticated: restored.is_some(),
        user_id: restored.as_ref().map(|s| s.id.clone()),
        email: restored.as_ref().map(|s| s.email.clone()),
        expires_at: restored
            .as_ref()
            .and_then(|s| field_session::token_expiry(&s.token))
            .map(|at| at.to_rfc3339()),
        expiring_soon: restored
            .as_ref()
            .is_some_and(|s| field_session::expires_within(&s.token, EXPIRY_WARNING_SECS)),
        credential_backend: layer.credentials().backend(),
        api: ctx.config.api.base_url().to_string(),
        note,
    };

    output(&status, flags.format)
}
