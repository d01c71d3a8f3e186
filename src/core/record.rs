//! Output records produced by a run: execution log entries and
//! environment events. Both are append-only once produced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::task::TaskId;
use super::worker::WorkerId;

/// Status a worker reports for a task at the end of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    #[default]
    InProgress,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Completed => write!(f, "completed"),
            OutcomeStatus::InProgress => write!(f, "in_progress"),
        }
    }
}

/// Kind of an execution log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskStart,
    TaskComplete,
    TaskProgress,
    Discussion,
    EnvironmentEvent,
}

/// Recognized keys of an entry's `extra` bag.
///
/// - task entries: `worker_name`, `task_name`, `output` (end entry only)
/// - discussion entries: `worker_name`, `topic`, `counterpart`
/// - environment entries: `event_id`, `category`, `severity`, `delay_days`,
///   `affected_tasks` (comma separated)
/// - `failed` marks entries derived from a failed generator call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraKey {
    WorkerName,
    TaskName,
    Output,
    Topic,
    Counterpart,
    EventId,
    Category,
    Severity,
    DelayDays,
    AffectedTasks,
    Failed,
}

/// One timestamped, uniformly shaped record of what happened during a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub day: u32,
    /// `"{day}d HH:MM"`.
    pub timestamp_label: String,
    pub event_kind: EventKind,
    pub worker_id: Option<WorkerId>,
    pub task_id: Option<TaskId>,
    pub content: String,
    pub status: Option<OutcomeStatus>,
    pub progress_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<ExtraKey, String>,
}

impl ExecutionLogEntry {
    pub fn extra(&self, key: ExtraKey) -> Option<&str> {
        self.extra.get(&key).map(String::as_str)
    }
}

/// Format a day-relative timestamp label.
pub fn timestamp_label(day: u32, clock: &str) -> String {
    format!("{}d {}", day, clock)
}

/// Category of an environment disruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Technical,
    Resource,
    Communication,
    External,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::Technical,
        EventCategory::Resource,
        EventCategory::Communication,
        EventCategory::External,
    ];

    /// Inclusive delay range in days.
    pub fn delay_range(&self) -> (f64, f64) {
        match self {
            EventCategory::Technical => (0.5, 2.0),
            EventCategory::Resource => (1.0, 3.0),
            EventCategory::Communication => (0.5, 1.5),
            EventCategory::External => (1.0, 5.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Technical => "Technical issue",
            EventCategory::Resource => "Resource issue",
            EventCategory::Communication => "Communication issue",
            EventCategory::External => "External factor",
        }
    }

    /// Catalog of causes the injector draws from.
    pub fn causes(&self) -> &'static [&'static str] {
        match self {
            EventCategory::Technical => &[
                "Dependency version conflict needs resolving",
                "Third-party API is unstable",
                "Severe performance bottleneck needs optimization",
                "Code review found a security vulnerability",
                "Test environment database failure",
                "Build is broken and needs investigation",
                "Memory leak needs to be handled",
                "Cross-browser compatibility problem",
            ],
            EventCategory::Resource => &[
                "Core developer called in sick",
                "Product manager on an unplanned trip",
                "Customer escalated an urgent request",
                "Server hardware failure",
                "Test environment unavailable",
                "Designer overloaded, delivery slips",
                "Operations team running a system upgrade",
                "Key equipment under maintenance",
            ],
            EventCategory::Communication => &[
                "Requirement specification is ambiguous",
                "Design mockups delivered late",
                "Cross-team coordination is stalled",
                "Customer feedback is delayed",
                "Requirement change needs re-estimation",
                "Meeting conflict postponed a discussion",
                "Decision maker unavailable",
                "Outdated documentation caused a misunderstanding",
            ],
            EventCategory::External => &[
                "Public holiday",
                "Scheduled power maintenance",
                "Network outage",
                "Office building access problem",
                "Extreme weather disrupts work",
                "Policy change requires plan adjustment",
                "Partner delivery slipped",
                "Third-party provider maintenance window",
            ],
        }
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Technical => write!(f, "technical"),
            EventCategory::Resource => write!(f, "resource"),
            EventCategory::Communication => write!(f, "communication"),
            EventCategory::External => write!(f, "external"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// `high` above 2 days, `medium` above 1 day, otherwise `low`.
    pub fn from_delay(delay_days: f64) -> Self {
        if delay_days > 2.0 {
            Severity::High
        } else if delay_days > 1.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// A disruption drawn by the environment injector. Advisory only: it never
/// changes task status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentEvent {
    /// `ENV-{day}-{n}` where n is the position in the injector history.
    pub id: String,
    pub day: u32,
    pub timestamp_label: String,
    pub category: EventCategory,
    pub description: String,
    pub delay_days: f64,
    pub severity: Severity,
    pub affected_task_ids: Vec<TaskId>,
}
