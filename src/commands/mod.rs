// Command handlers shared by the HTTP routes, the invoke proxy and the CLI

pub mod config;
pub mod conversation;
pub mod estimates;

pub use config::*;
pub use conversation::*;
pub use estimates::*;

use crate::estimation::EstimationError;
use crate::models::StateTransitionError;
use thiserror::Error;

/// Failure of a command, classified for the transport layer
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Estimation(#[from] EstimationError),

    #[error(transparent)]
    Transition(#[from] StateTransitionError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommandError {
    /// Short machine-readable kind for error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::Estimation(e) => e.kind(),
            CommandError::Transition(_) => "invalid_transition",
            CommandError::NotFound(_) => "not_found",
            CommandError::InvalidArgument(_) => "invalid_argument",
            CommandError::Config(_) => "config",
            CommandError::Internal(_) => "internal",
        }
    }

    /// Structured detail payload, `null` when there is nothing to add
    pub fn details(&self) -> serde_json::Value {
        match self {
            CommandError::Estimation(e) => e.details(),
            CommandError::Transition(StateTransitionError::InvalidTransition { from, to }) => {
                serde_json::json!({ "from": from, "to": to })
            }
            CommandError::Transition(StateTransitionError::NotReadyForAnalysis(step)) => {
                serde_json::json!({ "step": step })
            }
            _ => serde_json::Value::Null,
        }
    }

    pub fn not_found(what: &str, id: &str) -> Self {
        CommandError::NotFound(format!("{} not found: {}", what, id))
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversationStep;

    #[test]
    fn test_kind_passes_through_engine_errors() {
        let err: CommandError = EstimationError::CyclicDependency {
            cycle: vec!["A".to_string()],
        }
        .into();
        assert_eq!(err.kind(), "cyclic_dependency");
        assert_eq!(err.details()["cycle"][0], "A");
    }

    #[test]
    fn test_transition_details() {
        let err: CommandError =
            StateTransitionError::NotReadyForAnalysis(ConversationStep::Details).into();
        assert_eq!(err.kind(), "invalid_transition");
        assert_eq!(err.details()["step"], "details");
    }

    #[test]
    fn test_not_found_message() {
        let err = CommandError::not_found("Conversation", "abc");
        assert_eq!(err.to_string(), "Conversation not found: abc");
    }
}
