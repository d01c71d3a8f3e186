//! Day orchestrator: drives each worker through its eligible tasks.

use serde::{Deserialize, Serialize};

use crate::core::{Task, TaskId, Worker, WorkerId};
use crate::error::{Error, Result};
use crate::generation::{DayOutcome, WorkGenerator, WorkRequest};
use crate::{slog_debug, slog_warn};

/// One worker's raw outcome for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerDayLog {
    pub day: u32,
    pub worker_id: WorkerId,
    pub worker_name: String,
    /// Tasks the worker was asked to work on.
    pub task_ids: Vec<TaskId>,
    pub outcome: DayOutcome,
    /// Set when the generator call failed; the outcome is then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl WorkerDayLog {
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Context text handed to the generator.
pub fn build_context(tasks: &[Task]) -> String {
    let completed = tasks.iter().filter(|t| t.is_completed()).count();
    format!("Completed tasks: {}/{}", completed, tasks.len())
}

/// Run one day for every worker, in input order.
///
/// `eligible` is the day's eligible set computed at day start; tasks a
/// worker completes today do not unlock dependents until the next day.
/// Idle workers (no eligible assigned task) produce no log. A failed
/// generator call gives that worker an empty outcome with a failure marker;
/// only a fatal generator error aborts the day.
pub async fn run_day(
    day: u32,
    eligible: &[TaskId],
    tasks: &mut [Task],
    workers: &[Worker],
    generator: &dyn WorkGenerator,
) -> Result<Vec<WorkerDayLog>> {
    let mut logs = Vec::new();

    for worker in workers {
        let worker_tasks: Vec<Task> = eligible
            .iter()
            .filter(|id| worker.is_assigned(id))
            .filter_map(|id| tasks.iter().find(|t| &t.id == id).cloned())
            .collect();

        if worker_tasks.is_empty() {
            slog_debug!("day {}: worker {} idle", day, worker.id);
            continue;
        }

        let context = build_context(tasks);
        let request = WorkRequest {
            day,
            worker,
            tasks: &worker_tasks,
            context: &context,
        };
        let task_ids: Vec<TaskId> = worker_tasks.iter().map(|t| t.id.clone()).collect();

        let log = match generator.generate_day_outcome(request).await {
            Ok(mut outcome) => {
                outcome.completed_tasks.retain(|result| {
                    let known = task_ids.contains(&result.task_id);
                    if !known {
                        slog_warn!(
                            "day {}: worker {} reported unassigned task {}, ignoring",
                            day,
                            worker.id,
                            result.task_id
                        );
                    }
                    known
                });
                apply_outcome(tasks, &outcome);
                WorkerDayLog {
                    day,
                    worker_id: worker.id.clone(),
                    worker_name: worker.display_name.clone(),
                    task_ids,
                    outcome,
                    failure: None,
                }
            }
            Err(e) if e.is_fatal() => {
                return Err(Error::RunFailure {
                    day,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                slog_warn!("day {}: worker {} generation failed: {}", day, worker.id, e);
                WorkerDayLog {
                    day,
                    worker_id: worker.id.clone(),
                    worker_name: worker.display_name.clone(),
                    task_ids,
                    outcome: DayOutcome::default(),
                    failure: Some(e.to_string()),
                }
            }
        };
        logs.push(log);
    }

    Ok(logs)
}

fn apply_outcome(tasks: &mut [Task], outcome: &DayOutcome) {
    for result in &outcome.completed_tasks {
        let Some(task) = tasks.iter_mut().find(|t| t.id == result.task_id) else {
            continue;
        };
        task.set_progress(result.effective_progress());
        if result.is_completed() {
            task.complete();
        }
    }
}
