//! Estimate commands
//!
//! Run the engine for a conversation, read back stored estimates, and the
//! stateless estimate/validate entry points used by the CLI.

use super::{CommandError, CommandResult};
use crate::config::EstimatorConfig;
use crate::conversation::{ConversationStore, EstimateStore};
use crate::estimation::{self, pert, AnalysisRequest, DependencyGraph, DependencyStats};
use crate::models::{state_machine, ProjectEstimate, StoredEstimate, TaskDecomposition};
use crate::utils::generate_id;
use chrono::{NaiveDate, Utc};

fn request_for(
    config: &EstimatorConfig,
    project_id: String,
    decomposition: TaskDecomposition,
    start_date: Option<NaiveDate>,
) -> AnalysisRequest {
    AnalysisRequest::new(
        project_id,
        decomposition,
        start_date.unwrap_or_else(|| Utc::now().date_naive()),
    )
    .with_rates(config.rates.to_allocation())
    .with_parallel_threshold(config.analysis.parallel_threshold)
}

/// Run the engine off the async runtime
async fn run_analysis(request: AnalysisRequest) -> CommandResult<ProjectEstimate> {
    let result = tokio::task::spawn_blocking(move || estimation::analyze(&request))
        .await
        .map_err(|e| CommandError::Internal(format!("Analysis task failed: {}", e)))?;
    Ok(result?)
}

/// Analyze a conversation's decomposition and store the estimate.
///
/// The conversation stays locked for the whole run, so a second analysis of
/// the same conversation waits for the first to finish.
pub async fn analyze_conversation(
    conversations: &ConversationStore,
    estimates: &EstimateStore,
    config: &EstimatorConfig,
    conversation_id: &str,
    start_date: Option<NaiveDate>,
) -> CommandResult<StoredEstimate> {
    let handle = conversations
        .get(conversation_id)
        .ok_or_else(|| CommandError::not_found("Conversation", conversation_id))?;
    let mut record = handle.lock_owned().await;

    state_machine::ensure_analyzable(record.current_step, record.decomposition.is_some())?;
    let decomposition = record
        .decomposition
        .clone()
        .ok_or(crate::models::StateTransitionError::MissingDecomposition)?;

    let request = request_for(config, record.project_id.clone(), decomposition, start_date);
    let estimate = run_analysis(request).await.map_err(|e| {
        log::warn!("Analysis of conversation {} rejected: {}", conversation_id, e);
        e
    })?;

    let stored = StoredEstimate {
        id: generate_id(),
        conversation_id: conversation_id.to_string(),
        created_at: Utc::now(),
        estimate,
    };
    record.mark_analyzed(stored.id.clone())?;
    let stored = estimates.insert(stored);

    log::info!(
        "Stored estimate {} for project {}",
        stored.id,
        stored.estimate.project_id
    );
    Ok(StoredEstimate::clone(&stored))
}

/// Latest estimate for a project
pub async fn get_estimate(estimates: &EstimateStore, project_id: &str) -> CommandResult<StoredEstimate> {
    estimates
        .get(project_id)
        .map(|stored| StoredEstimate::clone(&stored))
        .ok_or_else(|| CommandError::not_found("Estimate for project", project_id))
}

/// Latest estimate for a project rendered as CSV
pub async fn export_estimate_csv(estimates: &EstimateStore, project_id: &str) -> CommandResult<String> {
    let stored = estimates
        .get(project_id)
        .ok_or_else(|| CommandError::not_found("Estimate for project", project_id))?;
    Ok(estimation::to_csv(&stored.estimate))
}

/// One-shot estimate of a decomposition without touching any store
pub async fn estimate_decomposition(
    config: &EstimatorConfig,
    project_id: Option<String>,
    decomposition: TaskDecomposition,
    start_date: Option<NaiveDate>,
) -> CommandResult<ProjectEstimate> {
    let project_id = project_id.unwrap_or_else(generate_id);
    run_analysis(request_for(config, project_id, decomposition, start_date)).await
}

/// Check a decomposition without costing it.
///
/// Runs the three-point checks and the graph checks and returns the graph's
/// shape on success.
pub async fn validate_decomposition(
    decomposition: TaskDecomposition,
) -> CommandResult<DependencyStats> {
    let invalid: Vec<_> = decomposition
        .tasks
        .iter()
        .filter_map(|task| pert::estimate_task(task).err())
        .flatten()
        .collect();
    if !invalid.is_empty() {
        return Err(estimation::EstimationError::InvalidEstimates(invalid).into());
    }

    let graph = DependencyGraph::build(&decomposition.tasks)?;
    Ok(graph.stats())
}
