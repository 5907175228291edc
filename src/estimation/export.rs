//! CSV projection of a finished estimate

use crate::models::ProjectEstimate;

const HEADER: [&str; 16] = [
    "id",
    "title",
    "category",
    "priority",
    "risk",
    "optimistic_days",
    "most_likely_days",
    "pessimistic_days",
    "expected_days",
    "earliest_start",
    "earliest_finish",
    "slack",
    "critical",
    "dependencies",
    "roles",
    "cost",
];

/// Quote a field when it contains a delimiter, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    let line = fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

/// Render one row per task followed by the totals rows
pub fn to_csv(estimate: &ProjectEstimate) -> String {
    let mut out = String::new();
    push_row(&mut out, &HEADER);

    for task in &estimate.tasks {
        let roles = task
            .roles
            .iter()
            .map(|r| format!("{}:{}", r.role, r.expected_hours))
            .collect::<Vec<_>>()
            .join(";");

        push_row(
            &mut out,
            &[
                task.id.clone(),
                task.title.clone(),
                task.category.to_string(),
                task.priority.to_string(),
                task.risk.to_string(),
                task.optimistic_days.to_string(),
                task.most_likely_days.to_string(),
                task.pessimistic_days.to_string(),
                task.expected_days.to_string(),
                task.schedule.earliest_start.to_string(),
                task.schedule.earliest_finish.to_string(),
                task.schedule.slack.to_string(),
                task.schedule.critical.to_string(),
                task.dependencies.join(";"),
                roles,
                task.cost.to_string(),
            ],
        );
    }

    let totals = [
        ("total_cost", estimate.total_cost),
        ("contingency_amount", estimate.contingency_amount),
        ("total_with_contingency", estimate.total_with_contingency),
        ("total_duration_days", estimate.total_duration_days),
    ];
    for (label, value) in totals {
        push_row(&mut out, &[label.to_string(), value.to_string()]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::{analyze, AnalysisRequest};
    use crate::models::{RoleEffort, Task, TaskDecomposition};
    use chrono::NaiveDate;

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_one_row_per_task_plus_totals() {
        let decomposition = TaskDecomposition {
            tasks: vec![
                Task::new("A", "Design, review", 1.0, 2.0, 3.0)
                    .with_role(RoleEffort::new("Architect", 8.0)),
                Task::new("B", "Build", 2.0, 4.0, 6.0)
                    .with_dependencies(&["A"])
                    .with_role(RoleEffort::new("Mid Developer", 16.0))
                    .with_role(RoleEffort::new("QA Engineer", 4.0)),
            ],
            project_summary: None,
        };
        let request = AnalysisRequest::new(
            "proj-1",
            decomposition,
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        );
        let csv = to_csv(&analyze(&request).unwrap());
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();

        // header + 2 tasks + 4 totals
        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("id,title,category"));
        assert!(lines[1].starts_with("A,\"Design, review\",General"));
        assert!(lines[2].contains("Mid Developer:16;QA Engineer:4"));
        assert_eq!(lines[6], "total_duration_days,6");
    }
}
