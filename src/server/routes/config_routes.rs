//! Configuration command routing
//!
//! Read-only: the configuration is fixed when the server starts.

use crate::commands;
use crate::commands::CommandError;
use serde_json::Value;

use super::{route_async, ServerAppState};

pub fn is_config_command(cmd: &str) -> bool {
    matches!(cmd, "get_config" | "get_rate_table")
}

/// Route configuration commands
pub async fn route_config_command(
    cmd: &str,
    _args: Value,
    state: &ServerAppState,
) -> Result<Value, CommandError> {
    match cmd {
        "get_config" => route_async!(commands::get_config(&state.config)),
        "get_rate_table" => route_async!(commands::get_rate_table(&state.config)),
        _ => Err(CommandError::InvalidArgument(format!(
            "Unknown config command: {}",
            cmd
        ))),
    }
}
