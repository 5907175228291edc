// Conversation models - the requirements dialogue that precedes analysis

use super::state_machine::{self, ConversationStep, StateTransitionError};
use super::TaskDecomposition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Free-form answers captured at each gathering step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementsContext {
    pub initial_input: Option<String>,
    pub additional_details: Option<String>,
    pub constraints: Option<String>,
}

impl RequirementsContext {
    pub fn is_complete(&self) -> bool {
        self.initial_input.is_some()
            && self.additional_details.is_some()
            && self.constraints.is_some()
    }
}

/// One conversation as held by the conversation store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub project_id: String,
    pub current_step: ConversationStep,
    pub completed_steps: Vec<ConversationStep>,
    pub context: RequirementsContext,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decomposition: Option<TaskDecomposition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_estimate_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationRecord {
    /// Create a conversation seeded with the greeting prompt
    pub fn new(id: String, project_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            current_step: ConversationStep::Greeting,
            completed_steps: Vec::new(),
            context: RequirementsContext::default(),
            messages: vec![ChatMessage::assistant(state_machine::prompt_for(
                ConversationStep::Greeting,
            ))],
            decomposition: None,
            last_estimate_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a user message, advance the dialogue and return the assistant reply
    pub fn apply_user_message(
        &mut self,
        content: &str,
    ) -> Result<(String, ConversationStep), StateTransitionError> {
        self.messages.push(ChatMessage::user(content));

        let current = self.current_step;
        match current {
            ConversationStep::Greeting => {
                self.context.initial_input = Some(content.to_string())
            }
            ConversationStep::Details => {
                self.context.additional_details = Some(content.to_string())
            }
            ConversationStep::Constraints => self.context.constraints = Some(content.to_string()),
            ConversationStep::ReadyForAnalysis | ConversationStep::Analyzed => {}
        }

        let reply = match state_machine::next_state(current) {
            Some(next) => {
                self.advance_to(next)?;
                state_machine::prompt_for(next)
            }
            None => state_machine::prompt_for(current),
        };

        self.messages.push(ChatMessage::assistant(reply));
        self.updated_at = Utc::now();
        Ok((reply.to_string(), self.current_step))
    }

    /// Attach the decomposer's task list, replacing any earlier one
    pub fn set_decomposition(&mut self, decomposition: TaskDecomposition) {
        self.decomposition = Some(decomposition);
        self.updated_at = Utc::now();
    }

    /// Mark an estimate as produced for this conversation
    pub fn mark_analyzed(&mut self, estimate_id: String) -> Result<(), StateTransitionError> {
        self.advance_to(ConversationStep::Analyzed)?;
        self.last_estimate_id = Some(estimate_id);
        self.updated_at = Utc::now();
        Ok(())
    }

    fn advance_to(&mut self, target: ConversationStep) -> Result<(), StateTransitionError> {
        let current = self.current_step;
        let next = state_machine::transition_state(current, target)?;
        if next != current {
            self.completed_steps.push(current);
            self.current_step = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ConversationRecord {
        ConversationRecord::new("conv-1".to_string(), "proj-1".to_string())
    }

    #[test]
    fn test_new_record_seeds_greeting() {
        let record = record();
        assert_eq!(record.current_step, ConversationStep::Greeting);
        assert_eq!(record.messages.len(), 1);
        assert_eq!(record.messages[0].role, MessageRole::Assistant);
    }

    #[test]
    fn test_three_messages_reach_ready() {
        let mut record = record();

        let (_, step) = record.apply_user_message("A B2B SaaS platform").unwrap();
        assert_eq!(step, ConversationStep::Details);
        let (_, step) = record.apply_user_message("Rust and React, 4 devs").unwrap();
        assert_eq!(step, ConversationStep::Constraints);
        let (reply, step) = record.apply_user_message("Must integrate SSO").unwrap();
        assert_eq!(step, ConversationStep::ReadyForAnalysis);
        assert!(reply.contains("all the information"));

        assert!(record.context.is_complete());
        assert_eq!(
            record.completed_steps,
            vec![
                ConversationStep::Greeting,
                ConversationStep::Details,
                ConversationStep::Constraints
            ]
        );
        // greeting + 3 user + 3 assistant
        assert_eq!(record.messages.len(), 7);
    }

    #[test]
    fn test_messages_after_ready_do_not_advance() {
        let mut record = record();
        for msg in ["one", "two", "three"] {
            record.apply_user_message(msg).unwrap();
        }
        let (_, step) = record.apply_user_message("anything else?").unwrap();
        assert_eq!(step, ConversationStep::ReadyForAnalysis);
        assert_eq!(record.context.constraints.as_deref(), Some("three"));
    }

    #[test]
    fn test_mark_analyzed_requires_ready() {
        let mut record = record();
        assert!(record.mark_analyzed("est-1".to_string()).is_err());

        for msg in ["one", "two", "three"] {
            record.apply_user_message(msg).unwrap();
        }
        record.mark_analyzed("est-1".to_string()).unwrap();
        assert_eq!(record.current_step, ConversationStep::Analyzed);

        // Re-analysis keeps the step and swaps the estimate id
        record.mark_analyzed("est-2".to_string()).unwrap();
        assert_eq!(record.last_estimate_id.as_deref(), Some("est-2"));
        assert_eq!(record.completed_steps.len(), 4);
    }
}
