//! Function-runtime entry point.
//!
//! Builds the relay once per cold start from environment variables, then
//! relays every invocation payload. A failed invocation is returned to the
//! runtime as an error so the invoking service sees it and may retry.

use clap::Parser;
use cli::{build_relay, handle_invocation, init_tracing, RelaySettings};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use relay::RelayRunId;
use serde_json::Value;
use tracing::{error, info_span, Instrument};

#[derive(Debug, Parser)]
#[command(name = "codepipeline-relay-lambda")]
struct LambdaArgs {
    #[command(flatten)]
    settings: RelaySettings,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // No arguments are passed to a function; everything comes from the
    // environment.
    let args = LambdaArgs::try_parse_from(["codepipeline-relay-lambda"])?;
    init_tracing(true, false);

    let relay = build_relay(&args.settings).await?;
    let settings = &args.settings;
    let relay = &relay;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        let run_id = RelayRunId::new_random();
        let request_id = event.context.request_id.clone();
        handle_invocation(
            relay,
            settings.shape,
            settings.github_token.as_deref(),
            event.payload,
        )
        .instrument(info_span!("invocation", %run_id, %request_id))
        .await
        .map_err(|err| {
            error!(%run_id, error = %format!("{err:#}"), "Relay failed");
            Error::from(err)
        })
    }))
    .await
}
