// Data models for task decompositions and the estimates built from them

pub mod conversation;
pub mod state_machine;

pub use conversation::{ChatMessage, ConversationRecord, MessageRole, RequirementsContext};
pub use state_machine::{ConversationStep, StateTransitionError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Classification Enums
// ============================================================================

/// Work category of a task. Unrecognised labels fold into `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskCategory {
    Planning,
    FrontendDevelopment,
    BackendDevelopment,
    DatabaseDesign,
    Security,
    Deployment,
    Testing,
    Documentation,
    General,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Planning => "Planning",
            TaskCategory::FrontendDevelopment => "Frontend Development",
            TaskCategory::BackendDevelopment => "Backend Development",
            TaskCategory::DatabaseDesign => "Database Design",
            TaskCategory::Security => "Security",
            TaskCategory::Deployment => "Deployment",
            TaskCategory::Testing => "Testing",
            TaskCategory::Documentation => "Documentation",
            TaskCategory::General => "General",
        }
    }

    /// Lenient parse used for decomposer output
    pub fn parse_lenient(s: &str) -> Self {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "planning" | "projectplanning" | "analysis" => TaskCategory::Planning,
            "frontenddevelopment" | "frontend" => TaskCategory::FrontendDevelopment,
            "backenddevelopment" | "backend" => TaskCategory::BackendDevelopment,
            "databasedesign" | "database" => TaskCategory::DatabaseDesign,
            "security" => TaskCategory::Security,
            "deployment" | "devops" => TaskCategory::Deployment,
            "testing" | "qa" | "qualityassurance" => TaskCategory::Testing,
            "documentation" | "projectmanagement" => TaskCategory::Documentation,
            _ => TaskCategory::General,
        }
    }
}

impl Default for TaskCategory {
    fn default() -> Self {
        TaskCategory::General
    }
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for TaskCategory {
    fn from(s: String) -> Self {
        TaskCategory::parse_lenient(&s)
    }
}

impl From<TaskCategory> for String {
    fn from(category: TaskCategory) -> Self {
        category.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw risk rating carried on each task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Medium
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Decomposition Input
// ============================================================================

/// Hours one role spends on a task.
/// Missing optimistic/pessimistic hours collapse onto the most-likely value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleEffort {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_optimistic: Option<f64>,
    pub hours_most_likely: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_pessimistic: Option<f64>,
}

impl RoleEffort {
    pub fn new(role: impl Into<String>, hours_most_likely: f64) -> Self {
        Self {
            role: role.into(),
            hours_optimistic: None,
            hours_most_likely,
            hours_pessimistic: None,
        }
    }

    pub fn with_range(mut self, optimistic: f64, pessimistic: f64) -> Self {
        self.hours_optimistic = Some(optimistic);
        self.hours_pessimistic = Some(pessimistic);
        self
    }

    /// (optimistic, most likely, pessimistic) hours
    pub fn three_point(&self) -> (f64, f64, f64) {
        (
            self.hours_optimistic.unwrap_or(self.hours_most_likely),
            self.hours_most_likely,
            self.hours_pessimistic.unwrap_or(self.hours_most_likely),
        )
    }
}

/// An atomic unit of work as produced by the task decomposer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default)]
    pub priority: Priority,
    pub optimistic_days: f64,
    pub most_likely_days: f64,
    pub pessimistic_days: f64,
    #[serde(default)]
    pub risk: RiskLevel,
    /// IDs of tasks that must finish before this one starts
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub roles: Vec<RoleEffort>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        optimistic_days: f64,
        most_likely_days: f64,
        pessimistic_days: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            category: TaskCategory::General,
            priority: Priority::Medium,
            optimistic_days,
            most_likely_days,
            pessimistic_days,
            risk: RiskLevel::Medium,
            dependencies: Vec::new(),
            roles: Vec::new(),
            acceptance_criteria: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
        self.dependencies = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_role(mut self, role: RoleEffort) -> Self {
        self.roles.push(role);
        self
    }
}

/// Summary block the decomposer may attach; carried through untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_estimated_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_assessment: Option<String>,
    #[serde(default)]
    pub key_risks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_team_size: Option<String>,
    #[serde(default)]
    pub critical_success_factors: Vec<String>,
}

/// Normalized task-decomposition document handed to the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDecomposition {
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_summary: Option<ProjectSummary>,
}

// ============================================================================
// Rates
// ============================================================================

/// Fallback hourly rate for roles missing from the table
pub const DEFAULT_FALLBACK_RATE: f64 = 1000.0;

/// Hourly rate per role, read-only for the duration of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub rates: BTreeMap<String, f64>,
    #[serde(default = "default_fallback_rate")]
    pub default_rate: f64,
}

fn default_fallback_rate() -> f64 {
    DEFAULT_FALLBACK_RATE
}

impl ResourceAllocation {
    pub fn new(rates: BTreeMap<String, f64>, default_rate: f64) -> Self {
        Self {
            rates,
            default_rate,
        }
    }

    /// Look up a role's rate. The flag is true when the default rate was used.
    pub fn rate_for(&self, role: &str) -> (f64, bool) {
        match self.rates.get(role) {
            Some(rate) => (*rate, false),
            None => (self.default_rate, true),
        }
    }

    /// Check every rate is a positive finite number
    pub fn validate(&self) -> Result<(), String> {
        if !(self.default_rate.is_finite() && self.default_rate > 0.0) {
            return Err(format!(
                "default_rate must be a positive number, got {}",
                self.default_rate
            ));
        }
        for (role, rate) in &self.rates {
            if !(rate.is_finite() && *rate > 0.0) {
                return Err(format!(
                    "rate for role '{}' must be a positive number, got {}",
                    role, rate
                ));
            }
        }
        Ok(())
    }
}

impl Default for ResourceAllocation {
    /// Standard hourly rates (INR)
    fn default() -> Self {
        let rates = [
            ("Junior Developer", 400.0),
            ("Mid Developer", 800.0),
            ("Senior Developer", 1500.0),
            ("Architect", 2500.0),
            ("QA Engineer", 600.0),
            ("Project Manager", 1800.0),
            ("UI/UX Designer", 1200.0),
            ("DevOps Engineer", 1800.0),
        ]
        .into_iter()
        .map(|(role, rate)| (role.to_string(), rate))
        .collect();

        Self {
            rates,
            default_rate: DEFAULT_FALLBACK_RATE,
        }
    }
}

// ============================================================================
// Estimate Output
// ============================================================================

/// CPM timing for one task, in days from project start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleNode {
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    pub slack: f64,
    pub critical: bool,
}

/// A role line with its PERT hours and cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedRole {
    pub role: String,
    pub hours_optimistic: f64,
    pub hours_most_likely: f64,
    pub hours_pessimistic: f64,
    pub expected_hours: f64,
    pub rate: f64,
    pub cost: f64,
    /// True when the role was missing from the rate table
    pub default_rate_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub priority: Priority,
    pub optimistic_days: f64,
    pub most_likely_days: f64,
    pub pessimistic_days: f64,
    pub expected_days: f64,
    pub risk: RiskLevel,
    pub dependencies: Vec<String>,
    pub roles: Vec<EstimatedRole>,
    pub acceptance_criteria: Vec<String>,
    pub cost: f64,
    pub schedule: ScheduleNode,
}

/// Hours and cost for one role across the whole project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub role: String,
    pub expected_hours: f64,
    pub rate: f64,
    pub cost: f64,
    pub default_rate_applied: bool,
}

/// Fully resolved estimate for one analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEstimate {
    pub project_id: String,
    pub tasks: Vec<EstimatedTask>,
    /// Zero-slack task IDs ordered by earliest start, then ID
    pub critical_path: Vec<String>,
    pub total_duration_days: f64,
    /// Base cost before contingency
    pub total_cost: f64,
    pub contingency_fraction: f64,
    pub contingency_amount: f64,
    pub total_with_contingency: f64,
    pub role_summary: Vec<RoleSummary>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub resource_allocation: ResourceAllocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_summary: Option<ProjectSummary>,
}

impl ProjectEstimate {
    pub fn task(&self, id: &str) -> Option<&EstimatedTask> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// An estimate as kept by the estimate store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEstimate {
    pub id: String,
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
    pub estimate: ProjectEstimate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parses_original_labels() {
        let json = r#"["Frontend Development", "Database Design", "Deployment", "Mystery"]"#;
        let parsed: Vec<TaskCategory> = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            vec![
                TaskCategory::FrontendDevelopment,
                TaskCategory::DatabaseDesign,
                TaskCategory::Deployment,
                TaskCategory::General,
            ]
        );
        assert_eq!(
            serde_json::to_string(&TaskCategory::BackendDevelopment).unwrap(),
            "\"Backend Development\""
        );
    }

    #[test]
    fn test_task_defaults_when_fields_missing() {
        let json = r#"{
            "id": "T1",
            "title": "Schema design",
            "optimistic_days": 1,
            "most_likely_days": 2,
            "pessimistic_days": 4,
            "roles": [{"role": "Architect", "hours_most_likely": 16}]
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.category, TaskCategory::General);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.risk, RiskLevel::Medium);
        assert!(task.dependencies.is_empty());
        assert_eq!(task.roles[0].three_point(), (16.0, 16.0, 16.0));
    }

    #[test]
    fn test_priority_accepts_capitalized() {
        let p: Priority = serde_json::from_str("\"High\"").unwrap();
        assert_eq!(p, Priority::High);
        let r: RiskLevel = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(r, RiskLevel::Low);
    }

    #[test]
    fn test_rate_lookup_falls_back() {
        let rates = ResourceAllocation::default();
        assert_eq!(rates.rate_for("Architect"), (2500.0, false));
        assert_eq!(rates.rate_for("Astronaut"), (DEFAULT_FALLBACK_RATE, true));
    }

    #[test]
    fn test_rate_validation() {
        let mut rates = ResourceAllocation::default();
        assert!(rates.validate().is_ok());
        rates.rates.insert("Intern".to_string(), 0.0);
        assert!(rates.validate().unwrap_err().contains("Intern"));
    }
}
