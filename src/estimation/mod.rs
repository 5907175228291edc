//! Estimation Engine - PERT/CPM estimation and scheduling
//!
//! Turns a decomposed task list into a time- and cost-bounded plan.
//!
//! ## Pipeline
//!
//! 1. **PERT** - expected duration per task, expected hours per role
//! 2. **Dependency graph** - duplicate, unknown-id and cycle checks
//! 3. **Critical path** - forward/backward passes, slack, zero-slack tasks
//! 4. **Cost** - role rates with fallback, task and project totals, contingency
//! 5. **Assembly** - consistency checks and the final `ProjectEstimate`
//!
//! The engine is synchronous and keeps no state between calls. Per-task PERT
//! and cost work fans out on rayon above a task-count threshold; the graph
//! build and CPM passes run on the calling thread.

pub mod assembler;
pub mod cost;
pub mod critical_path;
pub mod dependency;
pub mod error;
pub mod export;
pub mod pert;


pub use assembler::{analyze, AnalysisRequest, DEFAULT_PARALLEL_THRESHOLD};
pub use cost::{CostSummary, CONTINGENCY_FRACTION};
pub use critical_path::{Schedule, SLACK_TOLERANCE};
pub use dependency::{DependencyGraph, DependencyStats};
pub use error::{EstimationError, EstimationResult, InvalidEstimateError};
pub use export::to_csv;
