//! Per-day roll-up of execution records.

use serde::{Deserialize, Serialize};

use crate::core::{
    EnvironmentEvent, EventKind, ExecutionLogEntry, ExtraKey, OutcomeStatus, TaskId, WorkerId,
};

/// Heuristics used to estimate work hours and efficiency per worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPolicy {
    pub hours_per_task: f64,
    pub base_efficiency: f64,
    pub efficiency_per_task: f64,
    pub max_efficiency: f64,
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            hours_per_task: 2.0,
            base_efficiency: 85.0,
            efficiency_per_task: 2.0,
            max_efficiency: 100.0,
        }
    }
}

impl SummaryPolicy {
    pub fn work_hours(&self, tasks: usize) -> f64 {
        self.hours_per_task * tasks as f64
    }

    pub fn efficiency(&self, tasks: usize) -> f64 {
        (self.base_efficiency + self.efficiency_per_task * tasks as f64).min(self.max_efficiency)
    }
}

/// A task a worker reported on during the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecution {
    pub task_id: TaskId,
    pub task_name: String,
    pub status: OutcomeStatus,
    pub progress_percent: u8,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub timestamp_label: String,
    pub from_worker_id: WorkerId,
    pub from_name: String,
    pub counterpart: String,
    pub topic: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub tasks_executed: Vec<TaskExecution>,
    pub communications: Vec<Communication>,
    pub work_hours: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub day: u32,
    pub tasks_started_count: usize,
    pub tasks_completed_count: usize,
    pub worker_summaries: Vec<WorkerSummary>,
    /// Cross-worker messages in time order.
    pub communications: Vec<Communication>,
    pub environment_events: Vec<EnvironmentEvent>,
    pub overall_progress_percent: f64,
}

impl DailySummary {
    /// True when anything started or completed on this day.
    pub fn is_active(&self) -> bool {
        self.tasks_started_count > 0 || self.tasks_completed_count > 0
    }
}

/// Minutes since midnight of the `HH:MM` tail of a timestamp label.
fn clock_minutes(label: &str) -> u32 {
    let clock = label.rsplit(' ').next().unwrap_or(label);
    let mut parts = clock.splitn(2, ':');
    let hours = parts.next().and_then(|h| h.trim().parse::<u32>().ok());
    let minutes = parts.next().and_then(|m| m.trim().parse::<u32>().ok());
    match (hours, minutes) {
        (Some(h), Some(m)) => h
            .checked_mul(60)
            .and_then(|total| total.checked_add(m))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Summarize `day` with the default policy.
pub fn summarize(
    day: u32,
    entries: &[ExecutionLogEntry],
    env_events: &[EnvironmentEvent],
) -> DailySummary {
    summarize_with(day, entries, env_events, &SummaryPolicy::default())
}

/// Summarize `day`; entries and events from other days are ignored.
pub fn summarize_with(
    day: u32,
    entries: &[ExecutionLogEntry],
    env_events: &[EnvironmentEvent],
    policy: &SummaryPolicy,
) -> DailySummary {
    let mut started = 0;
    let mut completed = 0;
    let mut workers: Vec<WorkerSummary> = Vec::new();
    let mut communications = Vec::new();

    for entry in entries.iter().filter(|e| e.day == day) {
        match entry.event_kind {
            EventKind::TaskStart => started += 1,
            EventKind::TaskComplete if entry.status == Some(OutcomeStatus::Completed) => {
                completed += 1
            }
            _ => {}
        }

        let Some(worker_id) = entry.worker_id.as_ref() else {
            continue;
        };
        let worker_name = entry.extra(ExtraKey::WorkerName).unwrap_or(worker_id.as_str());
        let index = match workers.iter().position(|w| &w.worker_id == worker_id) {
            Some(i) => i,
            None => {
                workers.push(WorkerSummary {
                    worker_id: worker_id.clone(),
                    worker_name: worker_name.to_string(),
                    tasks_executed: Vec::new(),
                    communications: Vec::new(),
                    work_hours: 0.0,
                    efficiency: 0.0,
                });
                workers.len() - 1
            }
        };
        let summary = &mut workers[index];

        match entry.event_kind {
            EventKind::TaskComplete | EventKind::TaskProgress => {
                if entry.extra(ExtraKey::Failed).is_some() {
                    continue;
                }
                if let Some(task_id) = entry.task_id.clone() {
                    summary.tasks_executed.push(TaskExecution {
                        task_id,
                        task_name: entry.extra(ExtraKey::TaskName).unwrap_or_default().to_string(),
                        status: entry.status.unwrap_or_default(),
                        progress_percent: entry.progress_percent.unwrap_or(0),
                        output: entry.extra(ExtraKey::Output).unwrap_or_default().to_string(),
                    });
                }
            }
            EventKind::Discussion => {
                let communication = Communication {
                    timestamp_label: entry.timestamp_label.clone(),
                    from_worker_id: worker_id.clone(),
                    from_name: worker_name.to_string(),
                    counterpart: entry.extra(ExtraKey::Counterpart).unwrap_or_default().to_string(),
                    topic: entry.extra(ExtraKey::Topic).unwrap_or_default().to_string(),
                    content: entry.content.clone(),
                };
                summary.communications.push(communication.clone());
                communications.push(communication);
            }
            _ => {}
        }
    }

    for worker in &mut workers {
        let n = worker.tasks_executed.len();
        worker.work_hours = policy.work_hours(n);
        worker.efficiency = policy.efficiency(n);
    }

    communications.sort_by_key(|c| clock_minutes(&c.timestamp_label));

    let overall_progress_percent = if started == 0 {
        0.0
    } else {
        (completed as f64 / started as f64 * 100.0 * 100.0).round() / 100.0
    };

    DailySummary {
        day,
        tasks_started_count: started,
        tasks_completed_count: completed,
        worker_summaries: workers,
        communications,
        environment_events: env_events.iter().filter(|e| e.day == day).cloned().collect(),
        overall_progress_percent,
    }
}
