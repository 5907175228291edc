//! Critical path method (CPM) scheduling
//!
//! Forward pass for earliest times, backward pass for latest times, slack as
//! the difference. Zero-slack tasks make up the critical path.

use super::dependency::DependencyGraph;
use super::error::{EstimationError, EstimationResult};
use crate::models::ScheduleNode;
use std::collections::HashMap;

/// Slack below this fraction of the project length (at least one day) counts
/// as zero
pub const SLACK_TOLERANCE: f64 = 1e-9;

/// CPM result for one analysis
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Timing per task, parallel to the input task list
    pub nodes: Vec<ScheduleNode>,
    /// Zero-slack task IDs, earliest start ascending, ties by ID
    pub critical_path: Vec<String>,
    /// Maximum earliest finish over all tasks
    pub project_finish: f64,
}

/// Run both CPM passes.
///
/// `durations` holds the expected duration of each task, indexed like the
/// task list the graph was built from.
pub fn compute_schedule(graph: &DependencyGraph, durations: &[f64]) -> EstimationResult<Schedule> {
    if durations.len() != graph.len() {
        return Err(EstimationError::InternalConsistency(format!(
            "{} durations supplied for {} tasks",
            durations.len(),
            graph.len()
        )));
    }

    let order = graph.execution_order()?;
    log::debug!("CPM execution order: {:?}", order);

    let duration_of = |id: &str| -> EstimationResult<f64> {
        graph.position(id).map(|pos| durations[pos]).ok_or_else(|| {
            EstimationError::InternalConsistency(format!("task '{}' missing from graph index", id))
        })
    };

    // Forward pass
    let mut earliest: HashMap<&str, (f64, f64)> = HashMap::with_capacity(order.len());
    for id in &order {
        let start = graph
            .get_dependencies(id)
            .iter()
            .filter_map(|dep| earliest.get(dep.as_str()).map(|&(_, finish)| finish))
            .fold(0.0_f64, f64::max);
        let finish = start + duration_of(id)?;
        earliest.insert(id.as_str(), (start, finish));
    }

    let project_finish = earliest
        .values()
        .map(|&(_, finish)| finish)
        .fold(0.0_f64, f64::max);

    // Backward pass
    let mut latest: HashMap<&str, (f64, f64)> = HashMap::with_capacity(order.len());
    for id in order.iter().rev() {
        let finish = graph
            .get_dependents(id)
            .iter()
            .filter_map(|dep| latest.get(dep.as_str()).map(|&(start, _)| start))
            .fold(project_finish, f64::min);
        let start = finish - duration_of(id)?;
        latest.insert(id.as_str(), (start, finish));
    }

    let tolerance = SLACK_TOLERANCE * project_finish.max(1.0);
    let mut nodes = vec![None; graph.len()];
    let mut critical: Vec<(f64, &str)> = Vec::new();

    for id in &order {
        let (earliest_start, earliest_finish) = earliest[id.as_str()];
        let (latest_start, latest_finish) = latest[id.as_str()];

        let mut slack = latest_start - earliest_start;
        let is_critical = slack.abs() <= tolerance;
        if is_critical {
            slack = 0.0;
            critical.push((earliest_start, id.as_str()));
        }

        let position = graph.position(id).ok_or_else(|| {
            EstimationError::InternalConsistency(format!("task '{}' missing from graph index", id))
        })?;
        nodes[position] = Some(ScheduleNode {
            earliest_start,
            earliest_finish,
            latest_start,
            latest_finish,
            slack,
            critical: is_critical,
        });
    }

    let nodes = nodes
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            EstimationError::InternalConsistency(
                "schedule does not cover every task".to_string(),
            )
        })?;

    critical.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    let critical_path = critical.into_iter().map(|(_, id)| id.to_string()).collect();

    Ok(Schedule {
        nodes,
        critical_path,
        project_finish,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    fn task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, id, 1.0, 1.0, 1.0).with_dependencies(deps)
    }

    fn schedule(tasks: &[Task], durations: &[f64]) -> Schedule {
        let graph = DependencyGraph::build(tasks).unwrap();
        compute_schedule(&graph, durations).unwrap()
    }

    #[test]
    fn test_three_task_example() {
        let tasks = vec![task("A", &[]), task("B", &["A"]), task("C", &["A"])];
        let s = schedule(&tasks, &[2.0, 4.0, 1.0]);

        assert_eq!(s.nodes[0].earliest_finish, 2.0);
        assert_eq!(s.nodes[1].earliest_finish, 6.0);
        assert_eq!(s.nodes[2].earliest_finish, 3.0);
        assert_eq!(s.critical_path, vec!["A", "B"]);
        assert_eq!(s.project_finish, 6.0);

        // C can slip three days
        assert_eq!(s.nodes[2].latest_start, 5.0);
        assert_eq!(s.nodes[2].slack, 3.0);
        assert!(!s.nodes[2].critical);
    }

    #[test]
    fn test_diamond_picks_longer_branch() {
        let tasks = vec![
            task("start", &[]),
            task("fast", &["start"]),
            task("slow", &["start"]),
            task("end", &["fast", "slow"]),
        ];
        let s = schedule(&tasks, &[1.0, 2.0, 5.0, 1.0]);

        assert_eq!(s.critical_path, vec!["start", "slow", "end"]);
        assert_eq!(s.project_finish, 7.0);
        assert_eq!(s.nodes[1].slack, 3.0);
        assert_eq!(s.nodes[3].earliest_start, 6.0);
    }

    #[test]
    fn test_independent_chains() {
        let tasks = vec![
            task("x1", &[]),
            task("x2", &["x1"]),
            task("y1", &[]),
        ];
        let s = schedule(&tasks, &[3.0, 3.0, 4.0]);
        assert_eq!(s.critical_path, vec!["x1", "x2"]);
        assert_eq!(s.nodes[2].slack, 2.0);
        assert_eq!(s.nodes[2].latest_finish, 6.0);
    }

    #[test]
    fn test_equal_parallel_branches_are_both_critical() {
        let tasks = vec![task("A", &[]), task("C", &["A"]), task("B", &["A"])];
        let s = schedule(&tasks, &[1.0, 2.0, 2.0]);
        // Same earliest start, ordered by ID
        assert_eq!(s.critical_path, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_fractional_durations_keep_zero_slack() {
        let tasks = vec![task("A", &[]), task("B", &["A"]), task("C", &["B"])];
        let s = schedule(&tasks, &[0.1, 0.2, 0.3]);
        assert_eq!(s.critical_path, vec!["A", "B", "C"]);
        assert!(s.nodes.iter().all(|n| n.slack == 0.0));
    }

    #[test]
    fn test_long_chain_stays_critical() {
        let tasks = vec![
            task("T0", &[]),
            task("T1", &["T0"]),
            task("T2", &["T1"]),
            task("T3", &["T2"]),
        ];
        let s = schedule(
            &tasks,
            &[4_253_206.7, 3_189_904.93, 2_716_508.11, 2_600_000.0333],
        );

        assert_eq!(s.critical_path, vec!["T0", "T1", "T2", "T3"]);
        assert!(s.nodes.iter().all(|n| n.critical && n.slack == 0.0));
    }

    #[test]
    fn test_empty_schedule() {
        let s = schedule(&[], &[]);
        assert!(s.nodes.is_empty());
        assert!(s.critical_path.is_empty());
        assert_eq!(s.project_finish, 0.0);
    }

    #[test]
    fn test_duration_count_mismatch_is_internal_error() {
        let tasks = vec![task("A", &[])];
        let graph = DependencyGraph::build(&tasks).unwrap();
        assert!(matches!(
            compute_schedule(&graph, &[]),
            Err(EstimationError::InternalConsistency(_))
        ));
    }
}
