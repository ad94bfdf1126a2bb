//! Error and retry-classification types for the relay.
//!
//! [`RelayError`] is the single error type returned by
//! [`crate::StatusRelay::relay`] and by every port implementation. Adapter
//! crates convert their transport errors into [`RelayError::UpstreamError`].
//!
//! [`RetryPolicy`] lets the invoking environment decide whether redelivering
//! the trigger is worthwhile. The relay itself never retries.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether redelivering the same trigger could plausibly succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Transient condition: transport failure, rate limiting, server error.
    Retryable,
    /// The same input will fail the same way.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Upstream services
// ---------------------------------------------------------------------------

/// The external service an [`RelayError::UpstreamError`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamService {
    /// The CI/CD pipeline service (execution lookup).
    PipelineService,
    /// The source-control commit status API (status submission).
    CommitStatusApi,
}

impl std::fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PipelineService => f.write_str("pipeline service"),
            Self::CommitStatusApi => f.write_str("commit status API"),
        }
    }
}

// ---------------------------------------------------------------------------
// Relay errors
// ---------------------------------------------------------------------------

/// Errors that abort a relay invocation.
///
/// Every variant is surfaced to the caller immediately. No commit status is
/// submitted when any step before the submission fails.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required trigger field was absent or empty.
    #[error("missing event param {field}")]
    MissingField {
        /// Wire name of the missing field (e.g. `"execution-id"`).
        field: &'static str,
    },

    /// A call to an external service failed or returned an unexpected status.
    #[error("{}", describe_upstream(*service, *status, body.as_deref(), message))]
    UpstreamError {
        /// Which service failed.
        service: UpstreamService,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Response body text, when a response was received.
        body: Option<String>,
        /// Transport- or SDK-level description of the failure.
        message: String,
    },

    /// The execution carries no artifact revision with the expected name.
    #[error("missing {name}")]
    MissingArtifact {
        /// Artifact name that was searched for.
        name: String,
    },

    /// The source artifact was found but lacks a field the relay needs.
    #[error("artifact {name} has no {field}")]
    IncompleteArtifact {
        /// Artifact name.
        name: String,
        /// Missing field (e.g. `"revisionId"`).
        field: &'static str,
    },

    /// The artifact's revision URL is malformed or has no `/owner/repo` path.
    #[error("invalid revision URL '{url}': {reason}")]
    InvalidRevisionUrl {
        /// The offending URL as received.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The outbound report could not be encoded.
    #[error("failed to serialise commit status report: {message}")]
    SerializationError {
        /// Encoder error text.
        message: String,
    },

    /// Relay or adapter configuration is invalid.
    #[error("configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },
}

impl RelayError {
    /// Builds an [`RelayError::UpstreamError`] for a call that never produced
    /// a response (connection refused, timeout, SDK failure).
    pub fn upstream_transport(service: UpstreamService, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            service,
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// Builds an [`RelayError::UpstreamError`] for a response with an
    /// unexpected status code.
    pub fn upstream_status(service: UpstreamService, status: u16, body: impl Into<String>) -> Self {
        Self::UpstreamError {
            service,
            status: Some(status),
            body: Some(body.into()),
            message: "unexpected response".to_string(),
        }
    }

    /// Classifies this error for the invoking environment.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::UpstreamError { status: None, .. } => RetryPolicy::Retryable,
            Self::UpstreamError {
                status: Some(code), ..
            } if *code == 429 || *code >= 500 => RetryPolicy::Retryable,
            _ => RetryPolicy::NonRetryable,
        }
    }
}

fn describe_upstream(
    service: UpstreamService,
    status: Option<u16>,
    body: Option<&str>,
    message: &str,
) -> String {
    match status {
        Some(code) => format!(
            "{message} from {service}: {code} body: {}",
            body.unwrap_or_default()
        ),
        None => format!("{service} request failed: {message}"),
    }
}
