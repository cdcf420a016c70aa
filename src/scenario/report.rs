//! Data structures for scenario results

use crate::contract::shape::ShapeViolation;
use serde::Serialize;
use std::fmt;

/// Steps of the CRUD scenario, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ListAll,
    FilterByField,
    GetExisting,
    GetMissing,
    Create,
    Update,
    Delete,
    ValidateRejection,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::ListAll,
        Step::FilterByField,
        Step::GetExisting,
        Step::GetMissing,
        Step::Create,
        Step::Update,
        Step::Delete,
        Step::ValidateRejection,
    ];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::ListAll => "List all",
            Step::FilterByField => "Filter by field",
            Step::GetExisting => "Get existing",
            Step::GetMissing => "Get missing",
            Step::Create => "Create",
            Step::Update => "Update",
            Step::Delete => "Delete",
            Step::ValidateRejection => "Validate rejection",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    /// Not run because an earlier step failed in fail-fast mode
    Skipped,
    /// Capability not offered by the backend
    Pending,
}

/// Outcome of a single scenario step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub status: StepStatus,
    pub requests: Vec<String>,
    pub http_status: Option<u16>,
    pub elapsed_ms: u64,
    pub failures: Vec<String>,
    pub shape_violations: Vec<ShapeViolation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StepReport {
    pub fn skipped(step: Step) -> Self {
        Self::bare(step, StepStatus::Skipped, None)
    }

    pub fn pending(step: Step, note: &str) -> Self {
        Self::bare(step, StepStatus::Pending, Some(note.to_string()))
    }

    fn bare(step: Step, status: StepStatus, note: Option<String>) -> Self {
        Self {
            step,
            status,
            requests: Vec::new(),
            http_status: None,
            elapsed_ms: 0,
            failures: Vec::new(),
            shape_violations: Vec::new(),
            body_excerpt: None,
            note,
        }
    }
}

/// All step outcomes for one resource
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub resource: String,
    pub passed: bool,
    /// Set when a precondition failed and no step could run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    pub steps: Vec<StepReport>,
}

impl ScenarioResult {
    pub fn finished(resource: &str, steps: Vec<StepReport>) -> Self {
        let passed = steps.iter().all(|s| s.status != StepStatus::Failed);
        Self {
            resource: resource.to_string(),
            passed,
            aborted: None,
            steps,
        }
    }

    pub fn aborted(resource: &str, reason: String) -> Self {
        Self {
            resource: resource.to_string(),
            passed: false,
            aborted: Some(reason),
            steps: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn step(&self, step: Step) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }

    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// Complete run report across resources
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub crudcheck_version: String,
    pub base_url: String,
    pub passed: bool,
    pub resources: Vec<ScenarioResult>,
}

impl RunReport {
    pub fn new(base_url: &str, resources: Vec<ScenarioResult>) -> Self {
        Self {
            crudcheck_version: env!("CARGO_PKG_VERSION").to_string(),
            base_url: base_url.to_string(),
            passed: resources.iter().all(|r| r.passed),
            resources,
        }
    }
}
