use field_net::CancelToken;
use reqwest::Method;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{RequestArgs, RequestMethod};
use crate::context::AppContext;
use crate::output::{ErrorReport, output};

#[derive(Serialize)]
struct RequestFailure {
    error: ErrorReport,
    signed_out: bool,
}

pub async fn handle(
    args: &RequestArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let method = match args.method {
        RequestMethod::Get => Method::GET,
        RequestMethod::Delete => Method::DELETE,
    };
    tracing::debug!(%method, path = %args.path, "sending request");

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let outcome = ctx
        .layer
        .pipeline()
        .send_cancellable::<(), serde_json::Value>(method, &args.path, None, &cancel)
        .await;
    interrupt.abort();

    let Ok(result) = outcome else {
        tracing::warn!(path = %args.path, "request interrupted");
        anyhow::bail!("request {} cancelled", args.path);
    };

    match result {
        Ok(body) => output(&body, flags.format),
        Err(error) => {
            let failure = RequestFailure {
                error: ErrorReport::from(&error),
                signed_out: ctx.layer.trigger().has_fired(),
            };
            output(&failure, flags.format)?;
            Err(anyhow::Error::new(error).context(format!("request {} failed", args.path)))
        }
    }
}
