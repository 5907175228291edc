// Requirements-gathering conversation state machine with validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Steps of the requirements-gathering dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    /// Waiting for the project name, objective and deadline
    Greeting,
    /// Waiting for tech stack, team size, deliverables and budget
    Details,
    /// Waiting for constraints, complexity and integrations
    Constraints,
    /// Requirements complete, analysis may run
    ReadyForAnalysis,
    /// At least one estimate has been produced
    Analyzed,
}

impl ConversationStep {
    pub fn all() -> &'static [ConversationStep] {
        &[
            ConversationStep::Greeting,
            ConversationStep::Details,
            ConversationStep::Constraints,
            ConversationStep::ReadyForAnalysis,
            ConversationStep::Analyzed,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStep::Greeting => "greeting",
            ConversationStep::Details => "details",
            ConversationStep::Constraints => "constraints",
            ConversationStep::ReadyForAnalysis => "ready_for_analysis",
            ConversationStep::Analyzed => "analyzed",
        }
    }
}

impl Default for ConversationStep {
    fn default() -> Self {
        ConversationStep::Greeting
    }
}

impl std::fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateTransitionError {
    #[error("Invalid conversation transition from {from} to {to}")]
    InvalidTransition {
        from: ConversationStep,
        to: ConversationStep,
    },

    #[error("Conversation is still gathering requirements (step: {0})")]
    NotReadyForAnalysis(ConversationStep),

    #[error("No task decomposition has been submitted for this conversation")]
    MissingDecomposition,
}

/// Validates if a conversation can move from one step to another
pub fn can_transition(from: ConversationStep, to: ConversationStep) -> bool {
    use ConversationStep::*;

    match (from, to) {
        // Gathering moves strictly forward one step at a time
        (Greeting, Details) => true,
        (Details, Constraints) => true,
        (Constraints, ReadyForAnalysis) => true,

        (ReadyForAnalysis, Analyzed) => true,

        // Same step is always allowed (no-op); covers re-analysis
        (a, b) if a == b => true,

        _ => false,
    }
}

/// Validates and performs a step transition
pub fn transition_state(
    current: ConversationStep,
    target: ConversationStep,
) -> Result<ConversationStep, StateTransitionError> {
    if !can_transition(current, target) {
        return Err(StateTransitionError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    Ok(target)
}

/// Step a user message moves the dialogue to, if it advances at all
pub fn next_state(current: ConversationStep) -> Option<ConversationStep> {
    match current {
        ConversationStep::Greeting => Some(ConversationStep::Details),
        ConversationStep::Details => Some(ConversationStep::Constraints),
        ConversationStep::Constraints => Some(ConversationStep::ReadyForAnalysis),
        ConversationStep::ReadyForAnalysis => None,
        ConversationStep::Analyzed => None,
    }
}

/// Get all valid next steps from the current step
pub fn valid_next_states(current: ConversationStep) -> Vec<ConversationStep> {
    ConversationStep::all()
        .iter()
        .copied()
        .filter(|&step| can_transition(current, step))
        .collect()
}

/// Whether the dialogue has gathered everything analysis needs
pub fn is_analyzable(step: ConversationStep) -> bool {
    matches!(
        step,
        ConversationStep::ReadyForAnalysis | ConversationStep::Analyzed
    )
}

/// Guard for the analyze operation
pub fn ensure_analyzable(
    step: ConversationStep,
    has_decomposition: bool,
) -> Result<(), StateTransitionError> {
    if !is_analyzable(step) {
        return Err(StateTransitionError::NotReadyForAnalysis(step));
    }
    if !has_decomposition {
        return Err(StateTransitionError::MissingDecomposition);
    }
    Ok(())
}

/// Assistant prompt shown on entering a step
pub fn prompt_for(step: ConversationStep) -> &'static str {
    match step {
        ConversationStep::Greeting => {
            "Hi! I'm your IT Project Planning Assistant. I'll help you create detailed project estimates with timelines and costs. Let's start with your project basics:\n\n1. What's your project name?\n2. What's the main objective?\n3. Do you have a target deadline?"
        }
        ConversationStep::Details => {
            "Great! Now I need more details:\n\n1. What's your preferred tech stack?\n2. What's your team size preference?\n3. What are the key deliverables/features?\n4. What's your budget range?"
        }
        ConversationStep::Constraints => {
            "Perfect! A few more questions:\n\n1. Any specific constraints or requirements?\n2. How would you rate the project complexity (simple/medium/complex)?\n3. Any existing assets or systems to integrate with?"
        }
        ConversationStep::ReadyForAnalysis => {
            "Excellent! I have all the information needed. Let me analyze your project and create a detailed breakdown with tasks, timeline, and cost estimates. This will take a moment..."
        }
        ConversationStep::Analyzed => {
            "Your estimate is ready. Run the analysis again after submitting a revised task breakdown to refresh it."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConversationStep::*;

    #[test]
    fn test_gathering_moves_forward() {
        assert!(can_transition(Greeting, Details));
        assert!(can_transition(Details, Constraints));
        assert!(can_transition(Constraints, ReadyForAnalysis));
        assert_eq!(
            transition_state(Constraints, ReadyForAnalysis).unwrap(),
            ReadyForAnalysis
        );
    }

    #[test]
    fn test_cannot_skip_steps() {
        assert!(!can_transition(Greeting, Constraints));
        assert!(!can_transition(Greeting, ReadyForAnalysis));
        let result = transition_state(Details, Analyzed);
        assert!(matches!(
            result,
            Err(StateTransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cannot_go_back() {
        assert!(!can_transition(Details, Greeting));
        assert!(!can_transition(Analyzed, ReadyForAnalysis));
    }

    #[test]
    fn test_same_state_allowed() {
        for step in ConversationStep::all() {
            assert!(can_transition(*step, *step));
        }
    }

    #[test]
    fn test_next_state() {
        assert_eq!(next_state(Greeting), Some(Details));
        assert_eq!(next_state(Constraints), Some(ReadyForAnalysis));
        assert_eq!(next_state(ReadyForAnalysis), None);
        assert_eq!(next_state(Analyzed), None);
    }

    #[test]
    fn test_valid_next_states() {
        assert_eq!(valid_next_states(Greeting), vec![Greeting, Details]);
        assert_eq!(
            valid_next_states(ReadyForAnalysis),
            vec![ReadyForAnalysis, Analyzed]
        );
    }

    #[test]
    fn test_analysis_guard() {
        assert_eq!(
            ensure_analyzable(Details, true),
            Err(StateTransitionError::NotReadyForAnalysis(Details))
        );
        assert_eq!(
            ensure_analyzable(ReadyForAnalysis, false),
            Err(StateTransitionError::MissingDecomposition)
        );
        assert!(ensure_analyzable(ReadyForAnalysis, true).is_ok());
        assert!(ensure_analyzable(Analyzed, true).is_ok());
    }

    #[test]
    fn test_step_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReadyForAnalysis).unwrap(),
            "\"ready_for_analysis\""
        );
    }
}
