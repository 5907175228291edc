//! Error taxonomy for the estimation pipeline

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// A three-point estimate that breaks the ordering or positivity rule
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("Task '{task_id}' has an invalid {field}: {constraint}")]
pub struct InvalidEstimateError {
    pub task_id: String,
    /// Offending field, e.g. `optimistic_days` or `roles[Architect].hours_pessimistic`
    pub field: String,
    /// Human-readable description of the violated constraint
    pub constraint: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("{}", join_invalid(.0))]
    InvalidEstimates(Vec<InvalidEstimateError>),

    #[error("Task ID '{0}' appears more than once")]
    DuplicateTaskId(String),

    #[error("Task '{task_id}' depends on non-existent task '{dependency_id}'")]
    UnknownDependency {
        task_id: String,
        dependency_id: String,
    },

    #[error("Cyclic dependency detected: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Schedule of {duration_days} days from {start_date} runs past the last representable date")]
    ScheduleOutOfRange {
        start_date: NaiveDate,
        duration_days: f64,
    },

    #[error("Internal consistency check failed: {0}")]
    InternalConsistency(String),
}

impl EstimationError {
    /// Short machine-readable kind for API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            EstimationError::InvalidEstimates(_) => "invalid_estimate",
            EstimationError::DuplicateTaskId(_) => "duplicate_task_id",
            EstimationError::UnknownDependency { .. } => "unknown_dependency",
            EstimationError::CyclicDependency { .. } => "cyclic_dependency",
            EstimationError::ScheduleOutOfRange { .. } => "schedule_out_of_range",
            EstimationError::InternalConsistency(_) => "internal_consistency",
        }
    }

    /// Whether the error points at bad input rather than an engine defect
    pub fn is_input_error(&self) -> bool {
        !matches!(self, EstimationError::InternalConsistency(_))
    }

    /// Structured payload for callers rendering their own message
    pub fn details(&self) -> serde_json::Value {
        match self {
            EstimationError::InvalidEstimates(errors) => serde_json::json!({ "tasks": errors }),
            EstimationError::DuplicateTaskId(id) => serde_json::json!({ "task_id": id }),
            EstimationError::UnknownDependency {
                task_id,
                dependency_id,
            } => serde_json::json!({ "task_id": task_id, "dependency_id": dependency_id }),
            EstimationError::CyclicDependency { cycle } => serde_json::json!({ "cycle": cycle }),
            EstimationError::ScheduleOutOfRange {
                start_date,
                duration_days,
            } => serde_json::json!({ "start_date": start_date, "duration_days": duration_days }),
            EstimationError::InternalConsistency(_) => serde_json::Value::Null,
        }
    }
}

impl From<InvalidEstimateError> for EstimationError {
    fn from(err: InvalidEstimateError) -> Self {
        EstimationError::InvalidEstimates(vec![err])
    }
}

fn join_invalid(errors: &[InvalidEstimateError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Render a cycle closed back on its first node
fn format_cycle(cycle: &[String]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(String::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first);
    }
    parts.join(" → ")
}

pub type EstimationResult<T> = Result<T, EstimationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_closes_loop() {
        let err = EstimationError::CyclicDependency {
            cycle: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency detected: A → B → A");
        assert_eq!(err.kind(), "cyclic_dependency");
    }

    #[test]
    fn test_invalid_estimates_join() {
        let err = EstimationError::InvalidEstimates(vec![
            InvalidEstimateError {
                task_id: "T1".to_string(),
                field: "optimistic_days".to_string(),
                constraint: "must be positive".to_string(),
            },
            InvalidEstimateError {
                task_id: "T2".to_string(),
                field: "most_likely_days".to_string(),
                constraint: "must not exceed pessimistic_days".to_string(),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("'T1'"));
        assert!(msg.contains("'T2'"));
        assert!(err.is_input_error());
        assert_eq!(err.details()["tasks"][1]["field"], "most_likely_days");
    }

    #[test]
    fn test_internal_consistency_is_not_input_error() {
        let err = EstimationError::InternalConsistency("boom".to_string());
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_out_of_range_schedule_is_input_error() {
        let err = EstimationError::ScheduleOutOfRange {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            duration_days: 1e8,
        };
        assert!(err.is_input_error());
        assert_eq!(err.kind(), "schedule_out_of_range");
        assert_eq!(err.details()["start_date"], "2025-01-01");
    }
}
