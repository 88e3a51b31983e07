use field_core::Route;
use field_session::Destination;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct RouteResponse {
    route: Route,
    history: Vec<String>,
    user_id: Option<String>,
}

pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let gate = ctx.layer.gate();
    ctx.layer.auth().restore().await;
    let route = gate.decided().await;

    let history = gate
        .history()
        .into_iter()
        .map(|destination| match destination {
            Destination::Route(route) => route.to_string(),
            Destination::Protected(name) => name,
        })
        .collect();

    output(
        &RouteResponse {
            route,
            history,
            user_id: ctx.layer.session().current().map(|s| s.id),
        },
        flags.format,
    )
}
