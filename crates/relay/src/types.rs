//! Value types exchanged between the relay and its ports.
//!
//! [`PipelineExecution`] is the projection of the pipeline service's response
//! the relay cares about; [`CommitStatusReport`] is the exact outbound body.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    ArtifactName, ConsoleRegion, ExecutionId, PipelineName, RelayError, RepositoryName,
    RepositoryOwner, RevisionId,
};

/// Name of the artifact revision that identifies the triggering commit.
pub const SOURCE_ARTIFACT: &str = "SourceArtifact";

/// Fixed `context` tag identifying this reporter on the commit.
pub const STATUS_CONTEXT: &str = "continuous-integration/codepipeline";

// ---------------------------------------------------------------------------
// Pipeline service projection
// ---------------------------------------------------------------------------

/// Execution status as reported by the pipeline service, reduced to the
/// buckets the relay distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    /// `InProgress`.
    InProgress,
    /// `Succeeded`.
    Succeeded,
    /// Any other value, kept verbatim for logging (`Failed`, `Stopped`, …).
    Other(String),
}

impl PipelineStatus {
    /// Reduces a provider status string. Matching is exact and case-sensitive.
    pub fn from_provider(value: &str) -> Self {
        match value {
            "InProgress" => Self::InProgress,
            "Succeeded" => Self::Succeeded,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => f.write_str("InProgress"),
            Self::Succeeded => f.write_str("Succeeded"),
            Self::Other(value) => f.write_str(value),
        }
    }
}

/// One artifact revision attached to an execution.
///
/// Fields other than `name` are optional because the provider omits them for
/// some source action types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRevision {
    pub name: ArtifactName,
    pub revision_id: Option<RevisionId>,
    pub revision_url: Option<String>,
}

/// The relevant projection of a pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineExecution {
    pub status: PipelineStatus,
    /// Artifact revisions in the order the provider returned them.
    pub artifact_revisions: Vec<ArtifactRevision>,
}

impl PipelineExecution {
    /// Returns the first revision named [`SOURCE_ARTIFACT`].
    ///
    /// # Errors
    ///
    /// [`RelayError::MissingArtifact`] if no revision carries that name.
    pub fn source_artifact(&self) -> Result<&ArtifactRevision, RelayError> {
        self.artifact_revisions
            .iter()
            .find(|a| a.name.as_str() == SOURCE_ARTIFACT)
            .ok_or_else(|| RelayError::MissingArtifact {
                name: SOURCE_ARTIFACT.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Repository resolution
// ---------------------------------------------------------------------------

/// An `owner/repo` pair on the source-control host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: RepositoryOwner,
    pub name: RepositoryName,
}

impl RepositoryRef {
    /// Derives the repository from a revision URL of the form
    /// `https://host/<owner>/<repo>/...`.
    ///
    /// The first two non-empty path segments are taken positionally; nothing
    /// else about the path is checked.
    ///
    /// # Errors
    ///
    /// [`RelayError::InvalidRevisionUrl`] if the URL does not parse or its path
    /// has fewer than two non-empty segments.
    pub fn from_revision_url(revision_url: &str) -> Result<Self, RelayError> {
        let invalid = |reason: String| RelayError::InvalidRevisionUrl {
            url: revision_url.to_string(),
            reason,
        };

        let parsed = Url::parse(revision_url).map_err(|e| invalid(e.to_string()))?;
        let mut segments = parsed
            .path_segments()
            .ok_or_else(|| invalid("URL cannot have a path".to_string()))?
            .filter(|s| !s.is_empty());

        let owner = segments.next().and_then(RepositoryOwner::new);
        let name = segments.next().and_then(RepositoryName::new);
        match (owner, name) {
            (Some(owner), Some(name)) => Ok(Self { owner, name }),
            _ => Err(invalid(
                "path does not contain /<owner>/<repo>".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The commit a status is reported against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTarget {
    pub repository: RepositoryRef,
    pub revision: RevisionId,
}

// ---------------------------------------------------------------------------
// Outbound report
// ---------------------------------------------------------------------------

/// Commit status state accepted by the status API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
}

impl CommitState {
    /// Returns the wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl From<&PipelineStatus> for CommitState {
    // Anything not known to be running or green is reported as a failure.
    fn from(status: &PipelineStatus) -> Self {
        match status {
            PipelineStatus::InProgress => Self::Pending,
            PipelineStatus::Succeeded => Self::Success,
            PipelineStatus::Other(_) => Self::Failure,
        }
    }
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /repos/{owner}/{repo}/statuses/{sha}`.
///
/// Field names and order are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatusReport {
    pub state: CommitState,
    pub target_url: String,
    pub description: String,
    pub context: String,
}

impl CommitStatusReport {
    /// Builds a report with an empty description and the fixed
    /// [`STATUS_CONTEXT`].
    pub fn new(state: CommitState, target_url: impl Into<String>) -> Self {
        Self {
            state,
            target_url: target_url.into(),
            description: String::new(),
            context: STATUS_CONTEXT.to_string(),
        }
    }

    /// Encodes the report as the JSON request body.
    ///
    /// # Errors
    ///
    /// [`RelayError::SerializationError`] if encoding fails.
    pub fn to_json(&self) -> Result<Vec<u8>, RelayError> {
        serde_json::to_vec(self).map_err(|e| RelayError::SerializationError {
            message: e.to_string(),
        })
    }
}

/// Builds the console URL of an execution.
pub fn console_deep_link(
    region: &ConsoleRegion,
    pipeline: &PipelineName,
    execution: &ExecutionId,
) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/codesuite/codepipeline/pipelines/{pipeline}/executions/{execution}"
    )
}
