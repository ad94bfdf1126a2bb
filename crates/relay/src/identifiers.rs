//! Newtype domain identifiers.
//!
//! Every value the relay keys a call on is a distinct newtype wrapping a
//! `String`. This prevents accidentally passing a [`PipelineName`] where an
//! [`ExecutionId`] is expected, even though both are plain strings on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — pipeline service
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies one execution of a pipeline (the `execution-id` trigger field).
    ExecutionId
}

string_id! {
    /// Name of the pipeline the execution belongs to.
    PipelineName
}

string_id! {
    /// Name of an artifact revision attached to an execution
    /// (e.g. `"SourceArtifact"`).
    ArtifactName
}

string_id! {
    /// Region identifier used in the console deep link (e.g. `"eu-west-1"`).
    ConsoleRegion
}

// ---------------------------------------------------------------------------
// Identifiers — source control
// ---------------------------------------------------------------------------

string_id! {
    /// An opaque source revision, in practice a Git commit SHA.
    RevisionId
}

string_id! {
    /// The account or organisation that owns a repository.
    RepositoryOwner
}

string_id! {
    /// The repository name, without its owner.
    RepositoryName
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Token used to authenticate against the commit status API.
///
/// `Debug` and `Display` are redacted; the raw value is only reachable through
/// [`AuthToken::expose`], which the HTTP adapter calls when building the
/// `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Creates a new token, returning `None` if the value is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the raw token.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

impl std::fmt::Display for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single relay invocation.
///
/// Generated fresh for every process run and attached to the root span so all
/// log lines from one invocation can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayRunId(Uuid);

impl RelayRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RelayRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
