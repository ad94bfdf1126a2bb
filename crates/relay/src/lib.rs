//! Core domain for the CodePipeline status relay.
//!
//! On a pipeline-execution trigger, the relay looks up the execution, finds the
//! commit it built, maps the execution status to a commit state, and posts that
//! state to the source-control host with a link back to the execution.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies
//! and never reads the process environment. Infrastructure crates implement
//! the traits in [`ports`]; the `cli` crate wires them together.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ExecutionId`, `PipelineName`, `AuthToken`, etc.) |
//! | [`types`] | Execution projection, status mapping, repository resolution, outbound report |
//! | [`event`] | The normalised [`TriggerEvent`] and its validation |
//! | [`ports`] | [`PipelineExecutionSource`] and [`CommitStatusPublisher`] |
//! | [`relay`] | [`StatusRelay`] |
//! | [`errors`] | [`RelayError`] and [`RetryPolicy`] |

pub mod errors;
pub mod event;
pub mod identifiers;
pub mod ports;
pub mod relay;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{RelayError, RetryPolicy, UpstreamService};
pub use event::TriggerEvent;
pub use identifiers::{
    ArtifactName, AuthToken, ConsoleRegion, ExecutionId, PipelineName, RelayRunId,
    RepositoryName, RepositoryOwner, RevisionId,
};
pub use ports::{CommitStatusPublisher, PipelineExecutionSource};
pub use relay::{RelayConfig, StatusRelay};
pub use types::{
    console_deep_link, ArtifactRevision, CommitState, CommitStatusReport, CommitTarget,
    PipelineExecution, PipelineStatus, RepositoryRef, SOURCE_ARTIFACT, STATUS_CONTEXT,
};
