//! The status relay: fetch an execution, map its status, post a commit status.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    console_deep_link, CommitState, CommitStatusPublisher, CommitStatusReport, CommitTarget,
    ConsoleRegion, PipelineExecutionSource, RelayError, RepositoryRef, TriggerEvent,
};

/// Deployment-specific settings the relay needs besides its ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Region embedded in the console deep link.
    pub console_region: ConsoleRegion,
}

impl RelayConfig {
    /// Builds a config from a raw region string.
    ///
    /// # Errors
    ///
    /// [`RelayError::ConfigurationError`] if `console_region` is empty.
    pub fn new(console_region: impl Into<String>) -> Result<Self, RelayError> {
        let console_region =
            ConsoleRegion::new(console_region).ok_or_else(|| RelayError::ConfigurationError {
                message: "console region must not be empty".to_string(),
            })?;
        Ok(Self { console_region })
    }
}

/// Forwards pipeline execution status to the commit status API.
///
/// Holds no per-invocation state; one instance can serve any number of
/// [`StatusRelay::relay`] calls.
pub struct StatusRelay {
    config: RelayConfig,
    executions: Arc<dyn PipelineExecutionSource>,
    statuses: Arc<dyn CommitStatusPublisher>,
}

impl StatusRelay {
    /// Builds a relay that looks executions up through `executions` and
    /// submits commit statuses through `statuses`.
    pub fn new(
        config: RelayConfig,
        executions: Arc<dyn PipelineExecutionSource>,
        statuses: Arc<dyn CommitStatusPublisher>,
    ) -> Self {
        Self {
            config,
            executions,
            statuses,
        }
    }

    /// Relays the status of the execution named by `event`.
    ///
    /// Performs exactly one execution lookup and, if every check passes,
    /// exactly one status submission. Nothing is submitted when a step before
    /// the submission fails.
    ///
    /// # Errors
    ///
    /// - [`RelayError::UpstreamError`] if either call fails.
    /// - [`RelayError::MissingArtifact`] if the execution has no source artifact.
    /// - [`RelayError::IncompleteArtifact`] if the source artifact has no revision id.
    /// - [`RelayError::InvalidRevisionUrl`] if the owner/repo cannot be derived.
    #[instrument(
        name = "relay",
        skip_all,
        fields(pipeline = %event.pipeline_name, execution_id = %event.execution_id)
    )]
    pub async fn relay(&self, event: &TriggerEvent) -> Result<(), RelayError> {
        let execution = self
            .executions
            .get_execution(&event.pipeline_name, &event.execution_id)
            .await?;
        debug!(
            status = %execution.status,
            artifacts = execution.artifact_revisions.len(),
            "Fetched pipeline execution"
        );

        let source = execution.source_artifact()?;
        let revision = source
            .revision_id
            .clone()
            .ok_or_else(|| RelayError::IncompleteArtifact {
                name: source.name.to_string(),
                field: "revisionId",
            })?;
        let revision_url =
            source
                .revision_url
                .as_deref()
                .ok_or_else(|| RelayError::InvalidRevisionUrl {
                    url: String::new(),
                    reason: "artifact has no revision URL".to_string(),
                })?;
        let repository = RepositoryRef::from_revision_url(revision_url)?;

        let state = CommitState::from(&execution.status);
        let target_url = console_deep_link(
            &self.config.console_region,
            &event.pipeline_name,
            &event.execution_id,
        );
        let report = CommitStatusReport::new(state, target_url);
        let target = CommitTarget {
            repository,
            revision,
        };

        info!(
            repository = %target.repository,
            commit = %target.revision,
            pipeline_status = %execution.status,
            state = %state,
            "Setting commit status"
        );

        self.statuses
            .publish_status(&target, &report, &event.auth_token)
            .await
    }
}
