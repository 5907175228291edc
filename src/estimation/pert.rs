//! Three-point (PERT) estimation
//!
//! `E = (O + 4M + P) / 6`, used for task durations in days and for role
//! effort in hours.

use super::error::InvalidEstimateError;
use crate::models::Task;

/// Expected value of a three-point estimate. Does not validate.
#[inline]
pub fn expected(optimistic: f64, most_likely: f64, pessimistic: f64) -> f64 {
    (optimistic + 4.0 * most_likely + pessimistic) / 6.0
}

/// Validate a three-point estimate and return its expected value.
///
/// `field_prefix` is prepended to the field names in errors, so
/// `"" + "optimistic_days"` or `"roles[QA Engineer]." + "hours_optimistic"`.
pub fn checked_expected(
    task_id: &str,
    field_prefix: &str,
    names: [&str; 3],
    values: (f64, f64, f64),
) -> Result<f64, InvalidEstimateError> {
    let (o, m, p) = values;
    let invalid = |field: &str, constraint: String| InvalidEstimateError {
        task_id: task_id.to_string(),
        field: format!("{}{}", field_prefix, field),
        constraint,
    };

    for (name, value) in names.into_iter().zip([o, m, p]) {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(
                name,
                format!("must be a positive number, got {}", value),
            ));
        }
    }
    if o > m {
        return Err(invalid(
            names[0],
            format!("{} must not exceed {} {}", o, names[1], m),
        ));
    }
    if m > p {
        return Err(invalid(
            names[1],
            format!("{} must not exceed {} {}", m, names[2], p),
        ));
    }

    Ok(expected(o, m, p))
}

const DAY_FIELDS: [&str; 3] = ["optimistic_days", "most_likely_days", "pessimistic_days"];
const HOUR_FIELDS: [&str; 3] = ["hours_optimistic", "hours_most_likely", "hours_pessimistic"];

/// PERT figures for one task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPert {
    pub expected_days: f64,
    /// Expected hours per role, parallel to `Task::roles`
    pub expected_hours: Vec<f64>,
}

/// Validate a task's day and hour estimates and compute the expectations.
/// Every violation found on the task is returned.
pub fn estimate_task(task: &Task) -> Result<TaskPert, Vec<InvalidEstimateError>> {
    let mut errors = Vec::new();

    let expected_days = match checked_expected(
        &task.id,
        "",
        DAY_FIELDS,
        (
            task.optimistic_days,
            task.most_likely_days,
            task.pessimistic_days,
        ),
    ) {
        Ok(e) => e,
        Err(e) => {
            errors.push(e);
            0.0
        }
    };

    let mut expected_hours = Vec::with_capacity(task.roles.len());
    for role in &task.roles {
        let prefix = format!("roles[{}].", role.role);
        match checked_expected(&task.id, &prefix, HOUR_FIELDS, role.three_point()) {
            Ok(e) => expected_hours.push(e),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(TaskPert {
            expected_days,
            expected_hours,
        })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleEffort;

    #[test]
    fn test_expected_formula() {
        assert_eq!(expected(1.0, 2.0, 3.0), 2.0);
        assert_eq!(expected(2.0, 4.0, 6.0), 4.0);
        assert_eq!(expected(1.0, 1.0, 1.0), 1.0);
        assert!((expected(5.0, 10.0, 20.0) - 65.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_ordering_violation_names_field() {
        let task = Task::new("T1", "Bad", 5.0, 3.0, 8.0);
        let errors = estimate_task(&task).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].task_id, "T1");
        assert_eq!(errors[0].field, "optimistic_days");
    }

    #[test]
    fn test_pessimistic_below_most_likely() {
        let task = Task::new("T1", "Bad", 1.0, 3.0, 2.0);
        let errors = estimate_task(&task).unwrap_err();
        assert_eq!(errors[0].field, "most_likely_days");
    }

    #[test]
    fn test_non_positive_rejected() {
        let task = Task::new("T9", "Zero", 0.0, 1.0, 2.0);
        let errors = estimate_task(&task).unwrap_err();
        assert_eq!(errors[0].field, "optimistic_days");
        assert!(errors[0].constraint.contains("positive"));

        let task = Task::new("T9", "NaN", 1.0, f64::NAN, 2.0);
        assert!(estimate_task(&task).is_err());
    }

    #[test]
    fn test_role_hours_validated_and_estimated() {
        let task = Task::new("T1", "Mixed", 1.0, 2.0, 3.0)
            .with_role(RoleEffort::new("Architect", 8.0).with_range(4.0, 18.0))
            .with_role(RoleEffort::new("QA Engineer", 10.0).with_range(12.0, 14.0));

        let errors = estimate_task(&task).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "roles[QA Engineer].hours_optimistic");

        let task = Task::new("T1", "Ok", 1.0, 2.0, 3.0)
            .with_role(RoleEffort::new("Architect", 8.0).with_range(4.0, 18.0))
            .with_role(RoleEffort::new("QA Engineer", 40.0));
        let pert = estimate_task(&task).unwrap();
        assert_eq!(pert.expected_days, 2.0);
        assert_eq!(pert.expected_hours, vec![9.0, 40.0]);
    }
}
