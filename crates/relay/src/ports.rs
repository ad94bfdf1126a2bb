//! Port traits implemented by infrastructure crates.
//!
//! The relay depends only on these traits. `codepipeline` implements
//! [`PipelineExecutionSource`]; `github` implements [`CommitStatusPublisher`].

use async_trait::async_trait;

use crate::{
    AuthToken, CommitStatusReport, CommitTarget, ExecutionId, PipelineExecution, PipelineName,
    RelayError,
};

/// Read access to pipeline executions.
#[async_trait]
pub trait PipelineExecutionSource: Send + Sync {
    /// Fetches one execution of `pipeline`.
    ///
    /// # Errors
    ///
    /// [`RelayError::UpstreamError`] for any transport or service failure.
    async fn get_execution(
        &self,
        pipeline: &PipelineName,
        execution: &ExecutionId,
    ) -> Result<PipelineExecution, RelayError>;
}

/// Write access to commit statuses.
#[async_trait]
pub trait CommitStatusPublisher: Send + Sync {
    /// Submits `report` against `target`, authenticated with `token`.
    ///
    /// Implementations must treat anything other than `201 Created` as a
    /// failure.
    ///
    /// # Errors
    ///
    /// [`RelayError::UpstreamError`] for transport failures and unexpected
    /// status codes; [`RelayError::SerializationError`] if the report cannot
    /// be encoded.
    async fn publish_status(
        &self,
        target: &CommitTarget,
        report: &CommitStatusReport,
        token: &AuthToken,
    ) -> Result<(), RelayError>;
}
