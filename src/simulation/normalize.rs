//! Flattens raw day outcomes into uniformly shaped log entries.

use std::collections::BTreeMap;

use crate::core::record::timestamp_label;
use crate::core::{
    EnvironmentEvent, EventKind, ExecutionLogEntry, ExtraKey, OutcomeStatus, Task, TaskId,
};

use super::orchestrator::WorkerDayLog;

const FAILURE_CLOCK: &str = "18:00";

fn task_name<'a>(tasks: &'a [Task], id: &'a TaskId) -> &'a str {
    tasks
        .iter()
        .find(|t| &t.id == id)
        .map(|t| t.name.as_str())
        .unwrap_or(id.as_str())
}

/// One `environment_event` entry per event, without worker or task.
pub fn environment_entries(events: &[EnvironmentEvent]) -> Vec<ExecutionLogEntry> {
    events
        .iter()
        .map(|event| {
            let mut extra = BTreeMap::new();
            extra.insert(ExtraKey::EventId, event.id.clone());
            extra.insert(ExtraKey::Category, event.category.to_string());
            extra.insert(ExtraKey::Severity, event.severity.to_string());
            extra.insert(ExtraKey::DelayDays, event.delay_days.to_string());
            extra.insert(
                ExtraKey::AffectedTasks,
                event
                    .affected_task_ids
                    .iter()
                    .map(TaskId::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
            );
            ExecutionLogEntry {
                day: event.day,
                timestamp_label: event.timestamp_label.clone(),
                event_kind: EventKind::EnvironmentEvent,
                worker_id: None,
                task_id: None,
                content: format!("[{}] {}", event.category.label(), event.description),
                status: None,
                progress_percent: None,
                participants: Vec::new(),
                extra,
            }
        })
        .collect()
}

/// Entries for one worker's day: a start and an end entry per task result,
/// then one entry per discussion.
///
/// A failed worker gets one `task_progress` entry per requested task carrying
/// the `failed` key, so the failure stays visible in the log.
pub fn worker_entries(log: &WorkerDayLog, tasks: &[Task]) -> Vec<ExecutionLogEntry> {
    let base_extra = || {
        let mut extra = BTreeMap::new();
        extra.insert(ExtraKey::WorkerName, log.worker_name.clone());
        extra
    };
    let mut entries = Vec::new();

    if let Some(reason) = &log.failure {
        for id in &log.task_ids {
            let mut extra = base_extra();
            extra.insert(ExtraKey::TaskName, task_name(tasks, id).to_string());
            extra.insert(ExtraKey::Failed, reason.clone());
            entries.push(ExecutionLogEntry {
                day: log.day,
                timestamp_label: timestamp_label(log.day, FAILURE_CLOCK),
                event_kind: EventKind::TaskProgress,
                worker_id: Some(log.worker_id.clone()),
                task_id: Some(id.clone()),
                content: format!("Simulation failed: {}", reason),
                status: Some(OutcomeStatus::InProgress),
                progress_percent: tasks.iter().find(|t| &t.id == id).map(|t| t.progress_percent),
                participants: Vec::new(),
                extra,
            });
        }
        return entries;
    }

    for result in &log.outcome.completed_tasks {
        let name = task_name(tasks, &result.task_id);

        let mut extra = base_extra();
        extra.insert(ExtraKey::TaskName, name.to_string());
        entries.push(ExecutionLogEntry {
            day: log.day,
            timestamp_label: timestamp_label(log.day, &result.start_time_label),
            event_kind: EventKind::TaskStart,
            worker_id: Some(log.worker_id.clone()),
            task_id: Some(result.task_id.clone()),
            content: format!("Started task: {}", name),
            status: Some(OutcomeStatus::InProgress),
            progress_percent: Some(0),
            participants: Vec::new(),
            extra: extra.clone(),
        });

        let (event_kind, content) = if result.is_completed() {
            (EventKind::TaskComplete, format!("Completed task: {}", name))
        } else {
            (EventKind::TaskProgress, format!("Worked on task: {}", name))
        };
        extra.insert(ExtraKey::Output, result.output_text.clone());
        entries.push(ExecutionLogEntry {
            day: log.day,
            timestamp_label: timestamp_label(log.day, &result.end_time_label),
            event_kind,
            worker_id: Some(log.worker_id.clone()),
            task_id: Some(result.task_id.clone()),
            content,
            status: Some(result.status),
            progress_percent: Some(result.effective_progress()),
            participants: Vec::new(),
            extra,
        });
    }

    for discussion in &log.outcome.discussions {
        let mut extra = base_extra();
        extra.insert(ExtraKey::Topic, discussion.topic.clone());
        extra.insert(ExtraKey::Counterpart, discussion.with_worker_id.clone());
        entries.push(ExecutionLogEntry {
            day: log.day,
            timestamp_label: timestamp_label(log.day, &discussion.time_label),
            event_kind: EventKind::Discussion,
            worker_id: Some(log.worker_id.clone()),
            task_id: None,
            content: discussion.content.clone(),
            status: None,
            progress_percent: None,
            participants: vec![
                log.worker_id.to_string(),
                discussion.with_worker_id.clone(),
            ],
            extra,
        });
    }

    entries
}

/// All entries of a day: environment events first, then workers in the
/// order of `logs`.
pub fn normalize_day(
    events: &[EnvironmentEvent],
    logs: &[WorkerDayLog],
    tasks: &[Task],
) -> Vec<ExecutionLogEntry> {
    let mut entries = environment_entries(events);
    for log in logs {
        entries.extend(worker_entries(log, tasks));
    }
    entries
}
