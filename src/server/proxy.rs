//! Command proxy handler that routes HTTP requests to the command layer
//!
//! A single /api/invoke endpoint dispatches to the same command functions the
//! REST routes use. Command routing lives in the `routes/` sub-modules:
//! - conversation_routes: requirements dialogue and decomposition submission
//! - estimate_routes: analysis, stored estimates, export, validation
//! - config_routes: effective configuration and rate table

use super::routes;
use super::ServerAppState;
use crate::commands::CommandError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for /api/invoke endpoint
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    /// Command name (e.g., "start_conversation", "analyze_conversation")
    pub cmd: String,
    /// Command arguments as JSON object
    #[serde(default)]
    pub args: Value,
}

/// Response body for /api/invoke endpoint and for every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeResponse {
    /// Whether the command succeeded
    pub success: bool,
    /// Result data (on success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error message (on failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error kind (on failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Structured error details (on failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error response shared by the proxy and the REST handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    kind: &'static str,
    details: Value,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// HTTP status for a command failure
pub fn status_for(err: &CommandError) -> StatusCode {
    match err {
        CommandError::Estimation(e) if !e.is_input_error() => StatusCode::INTERNAL_SERVER_ERROR,
        CommandError::Estimation(_) | CommandError::Transition(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CommandError::NotFound(_) => StatusCode::NOT_FOUND,
        CommandError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        CommandError::Config(_) | CommandError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        Self {
            status: status_for(&err),
            message: err.to_string(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        CommandError::InvalidArgument(format!("Invalid request body: {}", rejection.body_text()))
            .into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = InvokeResponse {
            success: false,
            data: None,
            error: Some(self.message),
            kind: Some(self.kind.to_string()),
            details: (!self.details.is_null()).then_some(self.details),
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Main Handler
// =============================================================================

/// Main invoke handler - routes commands to their implementations
pub async fn invoke_handler(
    State(state): State<ServerAppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let Json(req) = payload?;
    log::debug!("Invoke command: {} with args: {:?}", req.cmd, req.args);

    match routes::route_command(&req.cmd, req.args, &state).await {
        Ok(data) => Ok(Json(InvokeResponse {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
            details: None,
        })),
        Err(e) => {
            log::warn!("Command {} failed: {}", req.cmd, e);
            Err(e.into())
        }
    }
}
