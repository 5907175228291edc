//! REST endpoints under /api
//!
//! Thin wrappers over the command layer. Success bodies are the command result
//! itself; failures use the proxy's error body.

use super::proxy::ApiError;
use super::ServerAppState;
use crate::commands::{self, ChatReply, CommandError};
use crate::models::{ConversationRecord, StoredEstimate, TaskDecomposition};
use crate::utils::parse_date;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const API_MESSAGE: &str = "IT Project Planning Assistant API";

#[derive(Debug, Serialize, Deserialize)]
pub struct RootMessage {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub content: String,
}

/// Optional body of the analyze endpoint
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub start_date: Option<String>,
}

pub async fn root_handler() -> Json<RootMessage> {
    Json(RootMessage {
        message: API_MESSAGE.to_string(),
    })
}

pub async fn start_conversation_handler(
    State(state): State<ServerAppState>,
) -> Result<Json<ConversationRecord>, ApiError> {
    Ok(Json(commands::start_conversation(&state.conversations).await?))
}

pub async fn post_message_handler(
    State(state): State<ServerAppState>,
    Path(conversation_id): Path<String>,
    payload: Result<Json<MessageBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) = payload?;
    let reply = commands::post_message(&state.conversations, &conversation_id, body.content).await?;
    Ok(Json(reply))
}

pub async fn submit_decomposition_handler(
    State(state): State<ServerAppState>,
    Path(conversation_id): Path<String>,
    payload: Result<Json<TaskDecomposition>, JsonRejection>,
) -> Result<Json<ConversationRecord>, ApiError> {
    let Json(decomposition) = payload?;
    let record =
        commands::submit_decomposition(&state.conversations, &conversation_id, decomposition)
            .await?;
    Ok(Json(record))
}

pub async fn analyze_handler(
    State(state): State<ServerAppState>,
    Path(conversation_id): Path<String>,
    body: Bytes,
) -> Result<Json<StoredEstimate>, ApiError> {
    let body: AnalyzeBody = if body.iter().all(u8::is_ascii_whitespace) {
        AnalyzeBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            CommandError::InvalidArgument(format!("Invalid request body: {}", e))
        })?
    };
    let start_date = body
        .start_date
        .as_deref()
        .map(parse_date)
        .transpose()
        .map_err(CommandError::InvalidArgument)?;

    let stored = commands::analyze_conversation(
        &state.conversations,
        &state.estimates,
        &state.config,
        &conversation_id,
        start_date,
    )
    .await?;
    Ok(Json(stored))
}

pub async fn get_estimate_handler(
    State(state): State<ServerAppState>,
    Path(project_id): Path<String>,
) -> Result<Json<StoredEstimate>, ApiError> {
    Ok(Json(commands::get_estimate(&state.estimates, &project_id).await?))
}

pub async fn export_estimate_handler(
    State(state): State<ServerAppState>,
    Path(project_id): Path<String>,
) -> Result<Response, ApiError> {
    let csv = commands::export_estimate_csv(&state.estimates, &project_id).await?;
    let disposition = format!("attachment; filename=\"estimate-{}.csv\"", project_id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

pub async fn get_conversation_handler(
    State(state): State<ServerAppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationRecord>, ApiError> {
    Ok(Json(
        commands::get_conversation(&state.conversations, &conversation_id).await?,
    ))
}

pub async fn delete_conversation_handler(
    State(state): State<ServerAppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationRecord>, ApiError> {
    Ok(Json(
        commands::delete_conversation(&state.conversations, &state.estimates, &conversation_id)
            .await?,
    ))
}
