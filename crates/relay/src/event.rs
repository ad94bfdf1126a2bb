//! The normalised trigger event.
//!
//! Inbound payload shapes are decoded by the `listener` crate; whichever shape
//! arrives, it ends up as one [`TriggerEvent`] built through
//! [`TriggerEvent::new`], so validation lives in exactly one place.

use crate::{AuthToken, ExecutionId, PipelineName, RelayError};

/// One validated relay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub execution_id: ExecutionId,
    pub pipeline_name: PipelineName,
    pub auth_token: AuthToken,
}

impl TriggerEvent {
    /// Validates raw trigger fields.
    ///
    /// Fields are checked in the order `execution-id`, `github-token`,
    /// `pipeline`; the first empty one is reported.
    ///
    /// # Errors
    ///
    /// [`RelayError::MissingField`] naming the first absent or empty field.
    pub fn new(
        execution_id: impl Into<String>,
        auth_token: Option<impl Into<String>>,
        pipeline_name: impl Into<String>,
    ) -> Result<Self, RelayError> {
        let execution_id = ExecutionId::new(execution_id).ok_or(RelayError::MissingField {
            field: "execution-id",
        })?;
        let auth_token = auth_token
            .and_then(AuthToken::new)
            .ok_or(RelayError::MissingField {
                field: "github-token",
            })?;
        let pipeline_name = PipelineName::new(pipeline_name).ok_or(RelayError::MissingField {
            field: "pipeline",
        })?;

        Ok(Self {
            execution_id,
            pipeline_name,
            auth_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_field(result: Result<TriggerEvent, RelayError>) -> &'static str {
        match result {
            Err(RelayError::MissingField { field }) => field,
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn valid_fields_build_an_event() {
        let event = TriggerEvent::new("exec-1", Some("tok"), "build-pipe").unwrap();
        assert_eq!(event.execution_id.as_str(), "exec-1");
        assert_eq!(event.pipeline_name.as_str(), "build-pipe");
        assert_eq!(event.auth_token.expose(), "tok");
    }

    #[test]
    fn each_empty_field_is_reported() {
        assert_eq!(
            missing_field(TriggerEvent::new("", Some("tok"), "p")),
            "execution-id"
        );
        assert_eq!(
            missing_field(TriggerEvent::new("e", Some(""), "p")),
            "github-token"
        );
        assert_eq!(
            missing_field(TriggerEvent::new("e", None::<String>, "p")),
            "github-token"
        );
        assert_eq!(missing_field(TriggerEvent::new("e", Some("tok"), "")), "pipeline");
    }

    #[test]
    fn execution_id_is_checked_first() {
        assert_eq!(
            missing_field(TriggerEvent::new("", None::<String>, "")),
            "execution-id"
        );
    }
}
