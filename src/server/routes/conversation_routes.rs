//! Conversation command routing

use crate::commands;
use crate::commands::CommandError;
use crate::models::TaskDecomposition;
use serde_json::Value;

use super::{get_arg, route_async, ServerAppState};

const COMMANDS: &[&str] = &[
    "start_conversation",
    "post_message",
    "submit_decomposition",
    "get_conversation",
    "delete_conversation",
];

pub fn is_conversation_command(cmd: &str) -> bool {
    COMMANDS.contains(&cmd)
}

/// Route conversation commands
pub async fn route_conversation_command(
    cmd: &str,
    args: Value,
    state: &ServerAppState,
) -> Result<Value, CommandError> {
    let store = state.conversations.as_ref();

    match cmd {
        "start_conversation" => route_async!(commands::start_conversation(store)),

        "post_message" => {
            let conversation_id: String = get_arg(&args, "conversation_id")?;
            let content: String = get_arg(&args, "content")?;
            route_async!(commands::post_message(store, &conversation_id, content))
        }

        "submit_decomposition" => {
            let conversation_id: String = get_arg(&args, "conversation_id")?;
            let decomposition: TaskDecomposition = get_arg(&args, "decomposition")?;
            route_async!(commands::submit_decomposition(
                store,
                &conversation_id,
                decomposition
            ))
        }

        "get_conversation" => {
            let conversation_id: String = get_arg(&args, "conversation_id")?;
            route_async!(commands::get_conversation(store, &conversation_id))
        }

        "delete_conversation" => {
            let conversation_id: String = get_arg(&args, "conversation_id")?;
            route_async!(commands::delete_conversation(
                store,
                &state.estimates,
                &conversation_id
            ))
        }

        _ => Err(CommandError::InvalidArgument(format!(
            "Unknown conversation command: {}",
            cmd
        ))),
    }
}
