//! Estimate command routing
//!
//! Analysis of a conversation, stored estimate lookup and export, and the
//! stateless estimate/validate commands.

use crate::commands;
use crate::commands::CommandError;
use crate::models::TaskDecomposition;
use crate::utils::parse_date;
use chrono::NaiveDate;
use serde_json::Value;

use super::{get_arg, get_opt_arg, route_async, ServerAppState};

const COMMANDS: &[&str] = &[
    "analyze_conversation",
    "get_estimate",
    "export_estimate_csv",
    "estimate_decomposition",
    "validate_decomposition",
];

pub fn is_estimate_command(cmd: &str) -> bool {
    COMMANDS.contains(&cmd)
}

/// Optional `start_date` argument in YYYY-MM-DD form
fn start_date_arg(args: &Value) -> Result<Option<NaiveDate>, CommandError> {
    get_opt_arg::<String>(args, "start_date")?
        .map(|s| parse_date(&s).map_err(CommandError::InvalidArgument))
        .transpose()
}

/// Route estimate commands
pub async fn route_estimate_command(
    cmd: &str,
    args: Value,
    state: &ServerAppState,
) -> Result<Value, CommandError> {
    match cmd {
        "analyze_conversation" => {
            let conversation_id: String = get_arg(&args, "conversation_id")?;
            let start_date = start_date_arg(&args)?;
            route_async!(commands::analyze_conversation(
                &state.conversations,
                &state.estimates,
                &state.config,
                &conversation_id,
                start_date
            ))
        }

        "get_estimate" => {
            let project_id: String = get_arg(&args, "project_id")?;
            route_async!(commands::get_estimate(&state.estimates, &project_id))
        }

        "export_estimate_csv" => {
            let project_id: String = get_arg(&args, "project_id")?;
            route_async!(commands::export_estimate_csv(&state.estimates, &project_id))
        }

        "estimate_decomposition" => {
            let decomposition: TaskDecomposition = get_arg(&args, "decomposition")?;
            let project_id: Option<String> = get_opt_arg(&args, "project_id")?;
            let start_date = start_date_arg(&args)?;
            route_async!(commands::estimate_decomposition(
                &state.config,
                project_id,
                decomposition,
                start_date
            ))
        }

        "validate_decomposition" => {
            let decomposition: TaskDecomposition = get_arg(&args, "decomposition")?;
            route_async!(commands::validate_decomposition(decomposition))
        }

        _ => Err(CommandError::InvalidArgument(format!(
            "Unknown estimate command: {}",
            cmd
        ))),
    }
}
