//! Task data model for the simulated project.
//!
//! Tasks are the atomic units of work that workers advance day by day. A
//! task is either pending or completed; partial progress is advisory only.

use serde::{Deserialize, Serialize};

/// Identifier of a task, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task status within a run.
///
/// There is no persisted in-progress state: a task that was worked on but
/// not finished stays `Pending` and carries its progress separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A single task in the project graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for this task.
    pub id: TaskId,
    /// Human-readable name for the task.
    pub name: String,
    /// Estimated duration in days.
    #[serde(default = "default_duration")]
    pub duration_estimate: f64,
    /// Tasks that must be completed before this one becomes eligible.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    /// Current status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Advisory progress, 0 to 100.
    #[serde(default)]
    pub progress_percent: u8,
}

fn default_duration() -> f64 {
    1.0
}

impl Task {
    /// Create a pending task with no dependencies and a one-day estimate.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: TaskId::from(id),
            name: name.to_string(),
            duration_estimate: default_duration(),
            dependencies: Vec::new(),
            status: TaskStatus::Pending,
            progress_percent: 0,
        }
    }

    /// Builder-style helper to set dependencies.
    pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
        self.dependencies = deps.iter().map(|d| TaskId::from(*d)).collect();
        self
    }

    /// Builder-style helper to set the duration estimate.
    pub fn with_duration(mut self, days: f64) -> Self {
        self.duration_estimate = days;
        self
    }

    /// Mark the task completed. Re-applying has no further effect.
    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.progress_percent = 100;
    }

    /// Record advisory progress, clamped to 0..=100.
    pub fn set_progress(&mut self, percent: u8) {
        if self.is_completed() {
            return;
        }
        self.progress_percent = percent.min(100);
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}
