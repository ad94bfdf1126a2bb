//! Wiring shared by the relay's entry points.
//!
//! Both binaries build the same [`StatusRelay`] from [`RelaySettings`]; they
//! differ only in where the trigger comes from:
//!
//! | Binary | Trigger source | Failure signal |
//! |--------|----------------|----------------|
//! | `codepipeline-relay` | `--event` file or stdin | exit code (`0` / `75` / `1`) |
//! | `codepipeline-relay-lambda` | the function runtime's invocation payload | error returned to the runtime |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use codepipeline::CodePipelineClient;
use github::{GithubClientConfig, GithubStatusClient, DEFAULT_API_BASE_URL};
use listener::{parse_trigger_value, TriggerShape};
use relay::{RelayConfig, RelayError, RetryPolicy, StatusRelay};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// BSD `EX_TEMPFAIL`: the invoker may redeliver the trigger.
pub const EXIT_RETRYABLE: u8 = 75;

/// Settings every entry point reads from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct RelaySettings {
    /// Payload shape: auto, flat or enveloped
    #[arg(long, env = "RELAY_EVENT_SHAPE", default_value = "auto")]
    pub shape: TriggerShape,

    /// GitHub token for enveloped triggers (flat triggers carry their own)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE_URL)]
    pub github_api_url: String,

    /// Region used in the console link [default: the AWS SDK's region]
    #[arg(long, env = "RELAY_CONSOLE_REGION")]
    pub console_region: Option<String>,

    /// Timeout in seconds applied to each network call
    #[arg(long, env = "RELAY_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

pub fn init_tracing(json: bool, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolves the console region: explicit configuration first, then the
/// region the AWS SDK resolved.
pub fn resolve_console_region(
    configured: Option<String>,
    sdk_region: Option<&str>,
) -> Result<RelayConfig, RelayError> {
    let region = configured
        .filter(|r| !r.is_empty())
        .or_else(|| sdk_region.map(str::to_string))
        .ok_or_else(|| RelayError::ConfigurationError {
            message: "no console region: set RELAY_CONSOLE_REGION or AWS_REGION".to_string(),
        })?;
    RelayConfig::new(region)
}

/// Constructs both adapters and injects them into a [`StatusRelay`].
pub async fn build_relay(settings: &RelaySettings) -> Result<StatusRelay> {
    let timeout = Duration::from_secs(settings.timeout_secs);
    let executions = CodePipelineClient::from_env(timeout).await;
    let config = resolve_console_region(settings.console_region.clone(), executions.region())?;
    let statuses = GithubStatusClient::new(GithubClientConfig {
        api_base_url: settings.github_api_url.clone(),
        timeout,
        ..GithubClientConfig::default()
    })?;

    Ok(StatusRelay::new(
        config,
        Arc::new(executions),
        Arc::new(statuses),
    ))
}

/// Relays one already-decoded trigger payload.
///
/// # Errors
///
/// Fails if the payload does not decode into a trigger, or if the relay
/// itself fails; nothing is submitted in the first case.
pub async fn handle_invocation(
    relay: &StatusRelay,
    shape: TriggerShape,
    configured_token: Option<&str>,
    payload: Value,
) -> Result<()> {
    let event = parse_trigger_value(payload, shape, configured_token)?;
    relay.relay(&event).await?;
    info!("Commit status reported");
    Ok(())
}

pub fn exit_status_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RelayError>().map(RelayError::retry_policy) {
        Some(RetryPolicy::Retryable) => EXIT_RETRYABLE,
        _ => 1,
    }
}
