//! Conversation commands
//!
//! Drive the requirements dialogue and attach the decomposer's task list.

use super::{CommandError, CommandResult};
use crate::conversation::{ConversationStore, EstimateStore};
use crate::models::{ConversationRecord, ConversationStep, TaskDecomposition};
use serde::{Deserialize, Serialize};

/// Assistant reply to a posted message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub step: ConversationStep,
}

/// Start a new conversation seeded with the greeting
pub async fn start_conversation(store: &ConversationStore) -> CommandResult<ConversationRecord> {
    Ok(store.create())
}

/// Record a user message and advance the dialogue
pub async fn post_message(
    store: &ConversationStore,
    conversation_id: &str,
    content: String,
) -> CommandResult<ChatReply> {
    if content.trim().is_empty() {
        return Err(CommandError::InvalidArgument(
            "Message content must not be empty".to_string(),
        ));
    }

    let handle = store
        .get(conversation_id)
        .ok_or_else(|| CommandError::not_found("Conversation", conversation_id))?;
    let mut record = handle.lock().await;

    let (response, step) = record.apply_user_message(&content)?;
    log::debug!("Conversation {} now at step {}", conversation_id, step);

    Ok(ChatReply { response, step })
}

/// Attach a task decomposition, replacing any earlier one.
///
/// Accepted at any step; structural problems surface when analysis runs.
pub async fn submit_decomposition(
    store: &ConversationStore,
    conversation_id: &str,
    decomposition: TaskDecomposition,
) -> CommandResult<ConversationRecord> {
    let handle = store
        .get(conversation_id)
        .ok_or_else(|| CommandError::not_found("Conversation", conversation_id))?;
    let mut record = handle.lock().await;

    log::info!(
        "Conversation {} received a decomposition with {} tasks",
        conversation_id,
        decomposition.tasks.len()
    );
    record.set_decomposition(decomposition);
    Ok(record.clone())
}

/// Get a conversation by ID
pub async fn get_conversation(
    store: &ConversationStore,
    conversation_id: &str,
) -> CommandResult<ConversationRecord> {
    store
        .snapshot(conversation_id)
        .await
        .ok_or_else(|| CommandError::not_found("Conversation", conversation_id))
}

/// Delete a conversation together with its project's stored estimate.
///
/// Waits for an in-flight analysis of the conversation to finish first.
pub async fn delete_conversation(
    conversations: &ConversationStore,
    estimates: &EstimateStore,
    conversation_id: &str,
) -> CommandResult<ConversationRecord> {
    let handle = conversations
        .remove(conversation_id)
        .ok_or_else(|| CommandError::not_found("Conversation", conversation_id))?;
    let record = handle.lock().await.clone();

    let estimate_dropped = estimates.remove(&record.project_id).is_some();
    log::info!(
        "Deleted conversation {} (estimate dropped: {})",
        conversation_id,
        estimate_dropped
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    #[tokio::test]
    async fn test_dialogue_reaches_ready() {
        let store = ConversationStore::new();
        let id = start_conversation(&store).await.unwrap().id;

        let reply = post_message(&store, &id, "Inventory app".to_string())
            .await
            .unwrap();
        assert_eq!(reply.step, ConversationStep::Details);
        assert!(reply.response.contains("tech stack"));

        post_message(&store, &id, "Rust, 3 devs".to_string())
            .await
            .unwrap();
        let reply = post_message(&store, &id, "No constraints".to_string())
            .await
            .unwrap();
        assert_eq!(reply.step, ConversationStep::ReadyForAnalysis);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let store = ConversationStore::new();
        let id = start_conversation(&store).await.unwrap().id;
        let err = post_message(&store, &id, "   ".to_string()).await.unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_unknown_conversation() {
        let store = ConversationStore::new();
        let err = post_message(&store, "nope", "hi".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
        assert!(get_conversation(&store, "nope").await.is_err());
    }

    #[tokio::test]
    async fn test_submit_decomposition_at_greeting() {
        let store = ConversationStore::new();
        let id = start_conversation(&store).await.unwrap().id;

        let decomposition = TaskDecomposition {
            tasks: vec![Task::new("T1", "Setup", 1.0, 1.0, 2.0)],
            project_summary: None,
        };
        let record = submit_decomposition(&store, &id, decomposition)
            .await
            .unwrap();
        assert_eq!(record.current_step, ConversationStep::Greeting);
        assert_eq!(record.decomposition.unwrap().tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_conversation() {
        let conversations = ConversationStore::new();
        let estimates = EstimateStore::new();
        let id = start_conversation(&conversations).await.unwrap().id;

        let record = delete_conversation(&conversations, &estimates, &id)
            .await
            .unwrap();
        assert_eq!(record.id, id);
        assert!(conversations.is_empty());

        let err = delete_conversation(&conversations, &estimates, &id)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
    }
}
