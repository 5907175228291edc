//! Command routing modules
//!
//! This module organizes command routing into focused sub-modules by domain:
//! - conversation_routes: requirements dialogue and decomposition submission
//! - estimate_routes: analysis, stored estimates, export, validation
//! - config_routes: effective configuration and rate table

pub mod config_routes;
pub mod conversation_routes;
pub mod estimate_routes;

use crate::commands::CommandError;
use serde_json::Value;

use super::ServerAppState;

// =============================================================================
// Argument helpers for route modules
// =============================================================================

/// Extract a required argument from JSON args
pub fn get_arg<T: serde::de::DeserializeOwned>(
    args: &Value,
    name: &str,
) -> Result<T, CommandError> {
    serde_json::from_value(
        args.get(name)
            .ok_or_else(|| CommandError::InvalidArgument(format!("Missing argument: {}", name)))?
            .clone(),
    )
    .map_err(|e| CommandError::InvalidArgument(format!("Invalid argument {}: {}", name, e)))
}

/// Extract an optional argument from JSON args
pub fn get_opt_arg<T: serde::de::DeserializeOwned>(
    args: &Value,
    name: &str,
) -> Result<Option<T>, CommandError> {
    match args.get(name) {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| CommandError::InvalidArgument(format!("Invalid argument {}: {}", name, e))),
        _ => Ok(None),
    }
}

/// Serialize a command result for the proxy response
pub fn to_json<T: serde::Serialize>(value: T) -> Result<Value, CommandError> {
    serde_json::to_value(value)
        .map_err(|e| CommandError::Internal(format!("Failed to serialize result: {}", e)))
}

// =============================================================================
// Command Routing Macros
// =============================================================================

/// Routes an async command: awaits the handler and serializes the result
#[macro_export]
macro_rules! route_async {
    ($handler:expr) => {{
        let result = $handler.await?;
        $crate::server::routes::to_json(result)
    }};
}

pub use route_async;

// =============================================================================
// Main Command Dispatcher
// =============================================================================

/// Route a command to its implementation by dispatching to the appropriate sub-router
pub async fn route_command(
    cmd: &str,
    args: Value,
    state: &ServerAppState,
) -> Result<Value, CommandError> {
    if conversation_routes::is_conversation_command(cmd) {
        return conversation_routes::route_conversation_command(cmd, args, state).await;
    }

    if estimate_routes::is_estimate_command(cmd) {
        return estimate_routes::route_estimate_command(cmd, args, state).await;
    }

    if config_routes::is_config_command(cmd) {
        return config_routes::route_config_command(cmd, args, state).await;
    }

    Err(CommandError::InvalidArgument(format!(
        "Unknown command: {}",
        cmd
    )))
}
