//! Resource allocation and cost aggregation

use crate::models::{EstimatedRole, ResourceAllocation, RoleSummary, Task};
use std::collections::BTreeMap;

/// Fixed contingency applied on top of the base cost
pub const CONTINGENCY_FRACTION: f64 = 0.15;

/// Costed role lines for one task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCost {
    pub roles: Vec<EstimatedRole>,
    pub cost: f64,
}

/// Project-level cost figures
#[derive(Debug, Clone, PartialEq)]
pub struct CostSummary {
    pub base_cost: f64,
    pub contingency_fraction: f64,
    pub contingency_amount: f64,
    pub total_with_contingency: f64,
    /// Sorted by role name
    pub role_summary: Vec<RoleSummary>,
}

impl CostSummary {
    /// Sum of the per-role costs, the figure `base_cost` must agree with
    pub fn role_rollup(&self) -> f64 {
        self.role_summary.iter().map(|r| r.cost).sum()
    }
}

/// Cost each role on a task.
///
/// `expected_hours` is parallel to `task.roles`. Roles missing from the rate
/// table are charged at the default rate and flagged.
pub fn cost_task(task: &Task, expected_hours: &[f64], rates: &ResourceAllocation) -> TaskCost {
    let roles: Vec<EstimatedRole> = task
        .roles
        .iter()
        .zip(expected_hours)
        .map(|(effort, &hours)| {
            let (rate, default_rate_applied) = rates.rate_for(&effort.role);
            if default_rate_applied {
                log::debug!(
                    "No rate for role '{}' on task {}, using default rate {}",
                    effort.role,
                    task.id,
                    rate
                );
            }
            let (optimistic, most_likely, pessimistic) = effort.three_point();
            EstimatedRole {
                role: effort.role.clone(),
                hours_optimistic: optimistic,
                hours_most_likely: most_likely,
                hours_pessimistic: pessimistic,
                expected_hours: hours,
                rate,
                cost: hours * rate,
                default_rate_applied,
            }
        })
        .collect();

    let cost = roles.iter().map(|r| r.cost).sum();
    TaskCost { roles, cost }
}

/// Roll task costs up into the project totals
pub fn summarize(task_costs: &[TaskCost]) -> CostSummary {
    // Input order keeps the floating point sum reproducible
    let base_cost: f64 = task_costs.iter().map(|t| t.cost).sum();

    let mut by_role: BTreeMap<&str, RoleSummary> = BTreeMap::new();
    for role in task_costs.iter().flat_map(|t| &t.roles) {
        let entry = by_role
            .entry(role.role.as_str())
            .or_insert_with(|| RoleSummary {
                role: role.role.clone(),
                expected_hours: 0.0,
                rate: role.rate,
                cost: 0.0,
                default_rate_applied: role.default_rate_applied,
            });
        entry.expected_hours += role.expected_hours;
        entry.cost += role.cost;
    }

    let contingency_amount = base_cost * CONTINGENCY_FRACTION;

    CostSummary {
        base_cost,
        contingency_fraction: CONTINGENCY_FRACTION,
        contingency_amount,
        total_with_contingency: base_cost + contingency_amount,
        role_summary: by_role.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleEffort;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_unknown_role_uses_default_rate() {
        let task = Task::new("T1", "Build", 1.0, 1.0, 1.0).with_role(RoleEffort::new("X", 40.0));
        let rates = ResourceAllocation::new(BTreeMap::new(), 1000.0);

        let costed = cost_task(&task, &[40.0], &rates);
        assert_eq!(costed.cost, 40_000.0);
        assert!(costed.roles[0].default_rate_applied);

        let summary = summarize(&[costed]);
        assert_eq!(summary.base_cost, 40_000.0);
        assert!(approx(summary.contingency_amount, 6_000.0));
        assert!(approx(summary.total_with_contingency, 46_000.0));
    }

    #[test]
    fn test_known_roles_priced_from_table() {
        let task = Task::new("T1", "API", 1.0, 2.0, 3.0)
            .with_role(RoleEffort::new("Senior Developer", 10.0))
            .with_role(RoleEffort::new("QA Engineer", 5.0));
        let rates = ResourceAllocation::default();

        let costed = cost_task(&task, &[10.0, 5.0], &rates);
        assert_eq!(costed.roles[0].cost, 15_000.0);
        assert_eq!(costed.roles[1].cost, 3_000.0);
        assert_eq!(costed.cost, 18_000.0);
        assert!(costed.roles.iter().all(|r| !r.default_rate_applied));
    }

    #[test]
    fn test_role_summary_aggregates_and_sorts() {
        let rates = ResourceAllocation::default();
        let a = Task::new("A", "A", 1.0, 1.0, 1.0)
            .with_role(RoleEffort::new("QA Engineer", 4.0))
            .with_role(RoleEffort::new("Architect", 2.0));
        let b = Task::new("B", "B", 1.0, 1.0, 1.0).with_role(RoleEffort::new("QA Engineer", 6.0));

        let summary = summarize(&[cost_task(&a, &[4.0, 2.0], &rates), cost_task(&b, &[6.0], &rates)]);
        let names: Vec<&str> = summary.role_summary.iter().map(|r| r.role.as_str()).collect();
        assert_eq!(names, vec!["Architect", "QA Engineer"]);
        assert_eq!(summary.role_summary[1].expected_hours, 10.0);
        assert_eq!(summary.role_summary[1].cost, 6_000.0);
        assert!(approx(summary.role_rollup(), summary.base_cost));
    }

    #[test]
    fn test_task_without_roles_costs_nothing() {
        let task = Task::new("T1", "Meeting", 1.0, 1.0, 1.0);
        let costed = cost_task(&task, &[], &ResourceAllocation::default());
        assert_eq!(costed.cost, 0.0);

        let summary = summarize(&[costed]);
        assert_eq!(summary.total_with_contingency, 0.0);
        assert!(summary.role_summary.is_empty());
    }
}
