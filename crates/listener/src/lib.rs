//! Relay trigger intake.
//!
//! Two inbound payload shapes are supported; both are normalised into a
//! [`relay::TriggerEvent`]:
//!
//! | Shape | Payload | Token source |
//! |-------|---------|--------------|
//! | [`TriggerShape::Flat`] | `{"execution-id", "github-token", "pipeline"}` | the payload |
//! | [`TriggerShape::Enveloped`] | `{"detail": {"execution-id", "pipeline"}, ...}` | configuration (`GITHUB_TOKEN`) |
//!
//! The enveloped shape is the one an event bus rule delivers for a pipeline
//! execution state change. Its `detail` may be an object or a JSON-encoded
//! string; any other envelope fields are ignored.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Payload decoding and input reading live here. The
//! [`relay`] crate sees only [`relay::TriggerEvent`].

use std::io::Read;
use std::path::Path;

use relay::{RelayError, TriggerEvent};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Path value meaning "read the trigger from standard input".
pub const STDIN_PATH: &str = "-";

/// Errors raised while reading or decoding a trigger payload.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The payload is not JSON, or not the expected shape.
    #[error("malformed trigger payload: {0}")]
    Malformed(String),

    /// The payload could not be read.
    #[error("failed to read trigger payload: {0}")]
    Io(#[from] std::io::Error),

    /// The payload decoded but failed validation.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Which payload shape to expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerShape {
    /// Enveloped if the top-level object has a `detail` key, flat otherwise.
    #[default]
    Auto,
    Flat,
    Enveloped,
}

impl std::str::FromStr for TriggerShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "flat" => Ok(Self::Flat),
            "enveloped" => Ok(Self::Enveloped),
            other => Err(format!(
                "unknown trigger shape '{other}' (expected auto, flat or enveloped)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload shapes
// ---------------------------------------------------------------------------

/// Flat trigger carrying its own token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlatTriggerPayload {
    #[serde(rename = "execution-id", default)]
    pub execution_id: String,
    #[serde(rename = "github-token", default)]
    pub github_token: String,
    #[serde(default)]
    pub pipeline: String,
}

impl FlatTriggerPayload {
    /// Validates the payload into a [`TriggerEvent`].
    pub fn into_event(self) -> Result<TriggerEvent, RelayError> {
        TriggerEvent::new(self.execution_id, Some(self.github_token), self.pipeline)
    }
}

/// The `detail` of an enveloped trigger.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvelopeDetail {
    #[serde(rename = "execution-id", default)]
    pub execution_id: String,
    #[serde(default)]
    pub pipeline: String,
}

/// Event-bus envelope; only `detail` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerEnvelope {
    pub detail: Value,
}

impl TriggerEnvelope {
    /// Decodes `detail`, accepting either an embedded object or a string
    /// holding JSON.
    pub fn detail(&self) -> Result<EnvelopeDetail, TriggerError> {
        let decoded = match &self.detail {
            Value::String(encoded) => serde_json::from_str(encoded),
            other => serde_json::from_value(other.clone()),
        };
        decoded.map_err(|e| TriggerError::Malformed(format!("detail: {e}")))
    }

    /// Validates the envelope into a [`TriggerEvent`] using the configured
    /// token.
    pub fn into_event(self, configured_token: Option<&str>) -> Result<TriggerEvent, TriggerError> {
        let detail = self.detail()?;
        Ok(TriggerEvent::new(
            detail.execution_id,
            configured_token,
            detail.pipeline,
        )?)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Decodes a raw trigger payload into a validated [`TriggerEvent`].
///
/// `configured_token` is only consulted for the enveloped shape; the flat
/// shape must carry its own token.
///
/// # Errors
///
/// - [`TriggerError::Malformed`] if the payload is not a JSON object of the
///   expected shape.
/// - [`TriggerError::Relay`] wrapping [`RelayError::MissingField`] if a
///   required field (including the token) is empty or absent.
pub fn parse_trigger(
    raw: &[u8],
    shape: TriggerShape,
    configured_token: Option<&str>,
) -> Result<TriggerEvent, TriggerError> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| TriggerError::Malformed(e.to_string()))?;
    parse_trigger_value(value, shape, configured_token)
}

/// Same as [`parse_trigger`], for a payload the caller already decoded, as a
/// function runtime hands it over.
pub fn parse_trigger_value(
    value: Value,
    shape: TriggerShape,
    configured_token: Option<&str>,
) -> Result<TriggerEvent, TriggerError> {
    if !value.is_object() {
        return Err(TriggerError::Malformed(
            "expected a JSON object".to_string(),
        ));
    }

    let shape = match shape {
        TriggerShape::Auto if value.get("detail").is_some() => TriggerShape::Enveloped,
        TriggerShape::Auto => TriggerShape::Flat,
        explicit => explicit,
    };
    debug!(?shape, "Decoding trigger payload");

    match shape {
        TriggerShape::Enveloped => {
            let envelope: TriggerEnvelope = serde_json::from_value(value)
                .map_err(|e| TriggerError::Malformed(e.to_string()))?;
            envelope.into_event(configured_token)
        }
        _ => {
            let payload: FlatTriggerPayload = serde_json::from_value(value)
                .map_err(|e| TriggerError::Malformed(e.to_string()))?;
            Ok(payload.into_event()?)
        }
    }
}

/// Reads the raw trigger payload from `path`, or from stdin when `path` is
/// [`STDIN_PATH`].
pub fn read_trigger_input(path: &Path) -> Result<Vec<u8>, TriggerError> {
    if path.as_os_str() == STDIN_PATH {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read(path)?)
    }
}
