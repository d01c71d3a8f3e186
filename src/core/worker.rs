//! Worker (simulated team member) data model.

use serde::{Deserialize, Serialize};

use super::task::TaskId;

/// Identifier of a worker, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub String);

impl WorkerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A worker that executes its assigned tasks.
///
/// Workers are fixed for the duration of a run; edits go through the
/// metadata overlay before the first day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub display_name: String,
    #[serde(default)]
    pub role_category: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Ordered, duplicate-free list of assigned tasks.
    #[serde(default)]
    pub assigned_task_ids: Vec<TaskId>,
}

impl Worker {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: WorkerId::from(id),
            display_name: display_name.to_string(),
            role_category: String::new(),
            capabilities: Vec::new(),
            assigned_task_ids: Vec::new(),
        }
    }

    /// Builder-style helper to assign tasks.
    pub fn with_tasks(mut self, task_ids: &[&str]) -> Self {
        for id in task_ids {
            self.assign(TaskId::from(*id));
        }
        self
    }

    /// Append a task assignment unless already present.
    pub fn assign(&mut self, task_id: TaskId) {
        if !self.assigned_task_ids.contains(&task_id) {
            self.assigned_task_ids.push(task_id);
        }
    }

    pub fn is_assigned(&self, task_id: &TaskId) -> bool {
        self.assigned_task_ids.contains(task_id)
    }
}
