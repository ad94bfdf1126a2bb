//! Relay pipeline service adapter.
//!
//! Implements [`relay::PipelineExecutionSource`] with the AWS CodePipeline
//! `GetPipelineExecution` operation.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Credential and region resolution follow the AWS default
//! provider chain (environment, profile, instance/task role). The [`relay`]
//! crate sees only [`relay::PipelineExecution`].

use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_codepipeline::config::http::HttpResponse;
use aws_sdk_codepipeline::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_codepipeline::operation::get_pipeline_execution::GetPipelineExecutionError;
use aws_sdk_codepipeline::types as sdk;
use relay::{
    ArtifactName, ArtifactRevision, ExecutionId, PipelineExecution, PipelineExecutionSource,
    PipelineName, PipelineStatus, RelayError, RevisionId, UpstreamService,
};
use tracing::{debug, warn};

/// CodePipeline client implementing [`PipelineExecutionSource`].
///
/// The SDK's retry strategy is disabled: a failed lookup is reported once and
/// redelivery is left to the invoking environment.
#[derive(Debug, Clone)]
pub struct CodePipelineClient {
    client: aws_sdk_codepipeline::Client,
    region: Option<String>,
}

impl CodePipelineClient {
    /// Loads shared AWS configuration from the environment and builds a client
    /// whose every operation is bounded by `timeout`.
    pub async fn from_env(timeout: Duration) -> Self {
        let timeouts = TimeoutConfig::builder().operation_timeout(timeout).build();
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(timeouts)
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        Self::from_sdk_config(&shared)
    }

    /// Builds a client from already-loaded shared configuration.
    ///
    /// Retries are disabled here as well, whatever `shared` says.
    pub fn from_sdk_config(shared: &SdkConfig) -> Self {
        let config = aws_sdk_codepipeline::config::Builder::from(shared)
            .retry_config(RetryConfig::disabled())
            .build();

        let region = shared.region().map(|r| r.to_string());
        debug!(region = ?region, "Loaded AWS configuration");

        Self {
            client: aws_sdk_codepipeline::Client::from_conf(config),
            region,
        }
    }

    /// Region the SDK resolved, if any.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

#[async_trait]
impl PipelineExecutionSource for CodePipelineClient {
    async fn get_execution(
        &self,
        pipeline: &PipelineName,
        execution: &ExecutionId,
    ) -> Result<PipelineExecution, RelayError> {
        let output = self
            .client
            .get_pipeline_execution()
            .pipeline_name(pipeline.as_str())
            .pipeline_execution_id(execution.as_str())
            .send()
            .await
            .map_err(lookup_error)?;

        let found = output.pipeline_execution().ok_or_else(|| {
            RelayError::upstream_transport(
                UpstreamService::PipelineService,
                "response did not include a pipeline execution",
            )
        })?;

        Ok(execution_from_sdk(found))
    }
}

/// Converts an SDK failure into [`RelayError::UpstreamError`].
///
/// When the service answered, the error code and message become `message` and
/// the raw response text becomes `body`. Failures without a response keep the
/// SDK's full error chain as `message`.
fn lookup_error(err: SdkError<GetPipelineExecutionError, HttpResponse>) -> RelayError {
    let Some(raw) = err.raw_response() else {
        return RelayError::upstream_transport(
            UpstreamService::PipelineService,
            DisplayErrorContext(&err).to_string(),
        );
    };

    let status = raw.status().as_u16();
    let body = raw
        .body()
        .bytes()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default();
    let message = match err.as_service_error() {
        Some(service_err) => match (service_err.code(), service_err.message()) {
            (Some(code), Some(text)) => format!("{code}: {text}"),
            (Some(code), None) => code.to_string(),
            (None, Some(text)) => text.to_string(),
            (None, None) => "unexpected response".to_string(),
        },
        None => "unexpected response".to_string(),
    };

    RelayError::UpstreamError {
        service: UpstreamService::PipelineService,
        status: Some(status),
        body: Some(body),
        message,
    }
}

/// Projects the SDK execution onto the relay's model.
///
/// Revisions without a name cannot be the source artifact and are dropped;
/// the order of the rest is preserved. A missing status maps to an empty
/// [`PipelineStatus::Other`], which the relay reports as a failure.
pub fn execution_from_sdk(execution: &sdk::PipelineExecution) -> PipelineExecution {
    let status = execution
        .status()
        .map(|s| PipelineStatus::from_provider(s.as_str()))
        .unwrap_or_else(|| PipelineStatus::Other(String::new()));

    let artifact_revisions = execution
        .artifact_revisions()
        .iter()
        .filter_map(|revision| {
            let Some(name) = revision.name().and_then(ArtifactName::new) else {
                warn!("Skipping artifact revision without a name");
                return None;
            };
            Some(ArtifactRevision {
                name,
                revision_id: revision.revision_id().and_then(RevisionId::new),
                revision_url: revision.revision_url().map(str::to_string),
            })
        })
        .collect();

    PipelineExecution {
        status,
        artifact_revisions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay::{CommitState, SOURCE_ARTIFACT};

    fn revision(name: Option<&str>, id: &str) -> sdk::ArtifactRevision {
        sdk::ArtifactRevision::builder()
            .set_name(name.map(str::to_string))
            .revision_id(id)
            .revision_url(format!("https://github.com/my-org/my-repo/commit/{id}"))
            .build()
    }

    #[test]
    fn maps_status_and_revisions_in_order() {
        let execution = sdk::PipelineExecution::builder()
            .status(sdk::PipelineExecutionStatus::Succeeded)
            .artifact_revisions(revision(Some("BuildArtifact"), "b1"))
            .artifact_revisions(revision(Some(SOURCE_ARTIFACT), "abc123"))
            .build();

        let mapped = execution_from_sdk(&execution);

        assert_eq!(mapped.status, PipelineStatus::Succeeded);
        let names: Vec<_> = mapped
            .artifact_revisions
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, ["BuildArtifact", SOURCE_ARTIFACT]);

        let source = mapped.source_artifact().unwrap();
        assert_eq!(source.revision_id.as_ref().unwrap().as_str(), "abc123");
        assert_eq!(
            source.revision_url.as_deref(),
            Some("https://github.com/my-org/my-repo/commit/abc123")
        );
    }

    #[test]
    fn sdk_statuses_map_onto_commit_states() {
        let cases = [
            (sdk::PipelineExecutionStatus::InProgress, CommitState::Pending),
            (sdk::PipelineExecutionStatus::Succeeded, CommitState::Success),
            (sdk::PipelineExecutionStatus::Failed, CommitState::Failure),
            (sdk::PipelineExecutionStatus::Stopped, CommitState::Failure),
            (sdk::PipelineExecutionStatus::Superseded, CommitState::Failure),
            (
                sdk::PipelineExecutionStatus::from("SomeFutureStatus"),
                CommitState::Failure,
            ),
        ];
        for (status, expected) in cases {
            let execution = sdk::PipelineExecution::builder()
                .status(status.clone())
                .build();
            let mapped = execution_from_sdk(&execution);
            assert_eq!(CommitState::from(&mapped.status), expected, "{status:?}");
        }
    }

    #[test]
    fn missing_status_reports_failure() {
        let mapped = execution_from_sdk(&sdk::PipelineExecution::builder().build());
        assert_eq!(CommitState::from(&mapped.status), CommitState::Failure);
        assert!(mapped.artifact_revisions.is_empty());
    }

    #[test]
    fn unnamed_revisions_are_dropped() {
        let execution = sdk::PipelineExecution::builder()
            .artifact_revisions(revision(None, "x"))
            .artifact_revisions(revision(Some(SOURCE_ARTIFACT), "y"))
            .build();

        let mapped = execution_from_sdk(&execution);
        assert_eq!(mapped.artifact_revisions.len(), 1);
        assert_eq!(mapped.artifact_revisions[0].name.as_str(), SOURCE_ARTIFACT);
    }
}
