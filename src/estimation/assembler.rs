//! Estimate assembly: the single entry point into the engine

use super::cost::{self, TaskCost};
use super::critical_path::{self, Schedule};
use super::dependency::DependencyGraph;
use super::error::{EstimationError, EstimationResult, InvalidEstimateError};
use super::pert::{self, TaskPert};
use crate::models::{
    EstimatedTask, ProjectEstimate, ResourceAllocation, Task, TaskDecomposition,
};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;

/// Task count at which PERT and cost work fans out across the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Relative tolerance when re-checking the cost rollup
const ROLLUP_TOLERANCE: f64 = 1e-9;

/// Everything one analysis needs. Owned so it can move onto a blocking thread.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub project_id: String,
    pub decomposition: TaskDecomposition,
    pub resource_allocation: ResourceAllocation,
    pub start_date: NaiveDate,
    pub parallel_threshold: usize,
}

impl AnalysisRequest {
    pub fn new(
        project_id: impl Into<String>,
        decomposition: TaskDecomposition,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            decomposition,
            resource_allocation: ResourceAllocation::default(),
            start_date,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn with_rates(mut self, rates: ResourceAllocation) -> Self {
        self.resource_allocation = rates;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

type TaskOutcome = Result<(TaskPert, TaskCost), Vec<InvalidEstimateError>>;

fn evaluate_task(task: &Task, rates: &ResourceAllocation) -> TaskOutcome {
    let pert = pert::estimate_task(task)?;
    let cost = cost::cost_task(task, &pert.expected_hours, rates);
    Ok((pert, cost))
}

/// Run the full pipeline: PERT, dependency graph, CPM, cost, assembly.
///
/// Either a complete estimate comes back or an error does; there is no
/// partial result.
pub fn analyze(request: &AnalysisRequest) -> EstimationResult<ProjectEstimate> {
    let estimate = run_pipeline(request).map_err(|e| {
        if !e.is_input_error() {
            log::error!("Estimate for project {} failed checks: {}", request.project_id, e);
        }
        e
    })?;

    log::info!(
        "Estimated project {}: {} tasks, {:.2} days, total {:.2}",
        estimate.project_id,
        estimate.tasks.len(),
        estimate.total_duration_days,
        estimate.total_with_contingency
    );
    Ok(estimate)
}

fn run_pipeline(request: &AnalysisRequest) -> EstimationResult<ProjectEstimate> {
    let tasks = &request.decomposition.tasks;
    let rates = &request.resource_allocation;

    let outcomes: Vec<TaskOutcome> = if tasks.len() >= request.parallel_threshold {
        log::debug!("Evaluating {} tasks in parallel", tasks.len());
        tasks.par_iter().map(|t| evaluate_task(t, rates)).collect()
    } else {
        tasks.iter().map(|t| evaluate_task(t, rates)).collect()
    };

    let mut invalid = Vec::new();
    let mut perts = Vec::with_capacity(tasks.len());
    let mut costs = Vec::with_capacity(tasks.len());
    for outcome in outcomes {
        match outcome {
            Ok((pert, cost)) => {
                perts.push(pert);
                costs.push(cost);
            }
            Err(errors) => invalid.extend(errors),
        }
    }
    if !invalid.is_empty() {
        return Err(EstimationError::InvalidEstimates(invalid));
    }

    let graph = DependencyGraph::build(tasks)?;
    let durations: Vec<f64> = perts.iter().map(|p| p.expected_days).collect();
    let schedule = critical_path::compute_schedule(&graph, &durations)?;

    let summary = cost::summarize(&costs);

    assemble(request, perts, costs, schedule, summary)
}

fn assemble(
    request: &AnalysisRequest,
    perts: Vec<TaskPert>,
    costs: Vec<TaskCost>,
    schedule: Schedule,
    summary: cost::CostSummary,
) -> EstimationResult<ProjectEstimate> {
    let tasks = &request.decomposition.tasks;

    if schedule.nodes.len() != tasks.len() {
        return Err(EstimationError::InternalConsistency(format!(
            "{} schedule nodes for {} tasks",
            schedule.nodes.len(),
            tasks.len()
        )));
    }

    if let Some(missing) = schedule
        .critical_path
        .iter()
        .find(|id| !tasks.iter().any(|t| &t.id == *id))
    {
        return Err(EstimationError::InternalConsistency(format!(
            "critical path references unknown task '{}'",
            missing
        )));
    }

    let rollup = summary.role_rollup();
    if (summary.base_cost - rollup).abs() > ROLLUP_TOLERANCE * summary.base_cost.abs().max(1.0) {
        return Err(EstimationError::InternalConsistency(format!(
            "base cost {} disagrees with role rollup {}",
            summary.base_cost, rollup
        )));
    }

    let end_date = request
        .start_date
        .checked_add_days(Days::new(schedule.project_finish.ceil() as u64))
        .ok_or(EstimationError::ScheduleOutOfRange {
            start_date: request.start_date,
            duration_days: schedule.project_finish,
        })?;

    let estimated_tasks = tasks
        .iter()
        .zip(perts)
        .zip(costs)
        .zip(&schedule.nodes)
        .map(|(((task, pert), cost), node)| EstimatedTask {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category,
            priority: task.priority,
            optimistic_days: task.optimistic_days,
            most_likely_days: task.most_likely_days,
            pessimistic_days: task.pessimistic_days,
            expected_days: pert.expected_days,
            risk: task.risk,
            dependencies: task.dependencies.clone(),
            roles: cost.roles,
            acceptance_criteria: task.acceptance_criteria.clone(),
            cost: cost.cost,
            schedule: *node,
        })
        .collect();

    Ok(ProjectEstimate {
        project_id: request.project_id.clone(),
        tasks: estimated_tasks,
        critical_path: schedule.critical_path,
        total_duration_days: schedule.project_finish,
        total_cost: summary.base_cost,
        contingency_fraction: summary.contingency_fraction,
        contingency_amount: summary.contingency_amount,
        total_with_contingency: summary.total_with_contingency,
        role_summary: summary.role_summary,
        start_date: request.start_date,
        end_date,
        resource_allocation: request.resource_allocation.clone(),
        project_summary: request.decomposition.project_summary.clone(),
    })
}
