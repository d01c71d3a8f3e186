//! User edits applied to the task and worker sets before a run.
//!
//! An overlay records removals, field overrides, manual assignments and
//! forced completions. It is applied once, in a fixed order:
//! removals, overrides, manual assignment, forced completion.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{Task, TaskId, TaskStatus, Worker, WorkerId};
use crate::{slog_debug, slog_warn};

/// Field name to new value.
pub type FieldOverrides = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MetadataOverlay {
    pub removed_worker_ids: Vec<WorkerId>,
    pub removed_task_ids: Vec<TaskId>,
    pub worker_field_overrides: BTreeMap<WorkerId, FieldOverrides>,
    pub task_field_overrides: BTreeMap<TaskId, FieldOverrides>,
    /// Task to worker. When non-empty, replaces every worker's assignments.
    pub manual_assignments: BTreeMap<TaskId, WorkerId>,
    pub forced_completed_task_ids: Vec<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of applying an overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOutcome {
    pub tasks: Vec<Task>,
    pub workers: Vec<Worker>,
    /// The overlay as applied, for audit.
    pub overlay: MetadataOverlay,
    /// Manual assignments that named a missing task or worker.
    pub dropped_assignments: Vec<(TaskId, WorkerId)>,
}

impl MetadataOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.removed_worker_ids.is_empty()
            && self.removed_task_ids.is_empty()
            && self.worker_field_overrides.is_empty()
            && self.task_field_overrides.is_empty()
            && self.manual_assignments.is_empty()
            && self.forced_completed_task_ids.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    pub fn remove_worker(&mut self, id: impl Into<WorkerId>) {
        let id = id.into();
        if !self.removed_worker_ids.contains(&id) {
            self.removed_worker_ids.push(id);
            self.touch();
        }
    }

    pub fn remove_task(&mut self, id: impl Into<TaskId>) {
        let id = id.into();
        if !self.removed_task_ids.contains(&id) {
            self.removed_task_ids.push(id);
            self.touch();
        }
    }

    /// Set the overrides for a worker, replacing any previous ones.
    pub fn override_worker(&mut self, id: impl Into<WorkerId>, fields: FieldOverrides) {
        self.worker_field_overrides.insert(id.into(), fields);
        self.touch();
    }

    /// Set the overrides for a task, replacing any previous ones.
    pub fn override_task(&mut self, id: impl Into<TaskId>, fields: FieldOverrides) {
        self.task_field_overrides.insert(id.into(), fields);
        self.touch();
    }

    pub fn assign(&mut self, task: impl Into<TaskId>, worker: impl Into<WorkerId>) {
        self.manual_assignments.insert(task.into(), worker.into());
        self.touch();
    }

    pub fn force_complete(&mut self, id: impl Into<TaskId>) {
        let id = id.into();
        if !self.forced_completed_task_ids.contains(&id) {
            self.forced_completed_task_ids.push(id);
            self.touch();
        }
    }

    /// Apply the overlay to `tasks` and `workers`.
    ///
    /// Removing a task also drops it from worker assignments and from the
    /// remaining tasks' dependencies. Conflicts (overrides or assignments
    /// naming something that is gone) are skipped with a warning.
    pub fn apply(&self, tasks: Vec<Task>, workers: Vec<Worker>) -> OverlayOutcome {
        let (mut tasks, mut workers) = self.apply_removals(tasks, workers);
        self.apply_overrides(&mut tasks, &mut workers);
        let dropped_assignments = self.apply_assignments(&tasks, &mut workers);
        self.apply_completions(&mut tasks);

        slog_debug!(
            "Overlay applied: {} tasks, {} workers, {} dropped assignment(s)",
            tasks.len(),
            workers.len(),
            dropped_assignments.len()
        );

        OverlayOutcome {
            tasks,
            workers,
            overlay: self.clone(),
            dropped_assignments,
        }
    }

    fn apply_removals(&self, tasks: Vec<Task>, workers: Vec<Worker>) -> (Vec<Task>, Vec<Worker>) {
        let removed = &self.removed_task_ids;
        let mut tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|t| !removed.contains(&t.id))
            .collect();
        for task in &mut tasks {
            task.dependencies.retain(|d| !removed.contains(d));
        }

        let mut workers: Vec<Worker> = workers
            .into_iter()
            .filter(|w| !self.removed_worker_ids.contains(&w.id))
            .collect();
        for worker in &mut workers {
            worker.assigned_task_ids.retain(|t| !removed.contains(t));
        }
        (tasks, workers)
    }

    fn apply_overrides(&self, tasks: &mut [Task], workers: &mut [Worker]) {
        for (id, fields) in &self.task_field_overrides {
            match tasks.iter_mut().find(|t| &t.id == id) {
                Some(task) => override_task_fields(task, fields),
                None => slog_warn!("Overlay: override for missing task {} skipped", id),
            }
        }
        for (id, fields) in &self.worker_field_overrides {
            match workers.iter_mut().find(|w| &w.id == id) {
                Some(worker) => override_worker_fields(worker, fields),
                None => slog_warn!("Overlay: override for missing worker {} skipped", id),
            }
        }
    }

    fn apply_assignments(&self, tasks: &[Task], workers: &mut [Worker]) -> Vec<(TaskId, WorkerId)> {
        let mut dropped = Vec::new();
        if self.manual_assignments.is_empty() {
            return dropped;
        }

        for worker in workers.iter_mut() {
            worker.assigned_task_ids.clear();
        }
        for (task_id, worker_id) in &self.manual_assignments {
            let task_exists = tasks.iter().any(|t| &t.id == task_id);
            let worker = workers.iter_mut().find(|w| &w.id == worker_id);
            match (task_exists, worker) {
                (true, Some(worker)) => worker.assign(task_id.clone()),
                _ => {
                    slog_warn!(
                        "Overlay: assignment of {} to {} dropped, task or worker missing",
                        task_id,
                        worker_id
                    );
                    dropped.push((task_id.clone(), worker_id.clone()));
                }
            }
        }
        dropped
    }

    fn apply_completions(&self, tasks: &mut [Task]) {
        for id in &self.forced_completed_task_ids {
            match tasks.iter_mut().find(|t| &t.id == id) {
                Some(task) => task.complete(),
                None => slog_warn!("Overlay: forced completion of missing task {} skipped", id),
            }
        }
    }
}

fn parse_field<T: DeserializeOwned>(owner: &str, field: &str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            slog_warn!("Overlay: bad value for {}.{} skipped: {}", owner, field, e);
            None
        }
    }
}

fn override_task_fields(task: &mut Task, fields: &FieldOverrides) {
    let owner = task.id.to_string();
    for (field, value) in fields {
        match field.as_str() {
            "name" => {
                if let Some(v) = parse_field(&owner, field, value) {
                    task.name = v;
                }
            }
            "duration_estimate" => {
                if let Some(v) = parse_field(&owner, field, value) {
                    task.duration_estimate = v;
                }
            }
            "dependencies" => {
                if let Some(v) = parse_field(&owner, field, value) {
                    task.dependencies = v;
                }
            }
            "progress_percent" => {
                if let Some(v) = parse_field::<u8>(&owner, field, value) {
                    task.progress_percent = v.min(100);
                }
            }
            "status" => {
                if let Some(v) = parse_field::<TaskStatus>(&owner, field, value) {
                    match v {
                        TaskStatus::Completed => task.complete(),
                        TaskStatus::Pending => {
                            task.status = TaskStatus::Pending;
                            if task.progress_percent >= 100 {
                                task.progress_percent = 0;
                            }
                        }
                    }
                }
            }
            other => slog_warn!("Overlay: unknown task field {}.{} skipped", owner, other),
        }
    }
}

fn override_worker_fields(worker: &mut Worker, fields: &FieldOverrides) {
    let owner = worker.id.to_string();
    for (field, value) in fields {
        match field.as_str() {
            "display_name" => {
                if let Some(v) = parse_field(&owner, field, value) {
                    worker.display_name = v;
                }
            }
            "role_category" => {
                if let Some(v) = parse_field(&owner, field, value) {
                    worker.role_category = v;
                }
            }
            "capabilities" => {
                if let Some(v) = parse_field(&owner, field, value) {
                    worker.capabilities = v;
                }
            }
            "assigned_task_ids" => {
                if let Some(ids) = parse_field::<Vec<TaskId>>(&owner, field, value) {
                    worker.assigned_task_ids.clear();
                    for id in ids {
                        worker.assign(id);
                    }
                }
            }
            other => slog_warn!("Overlay: unknown worker field {}.{} skipped", owner, other),
        }
    }
}
