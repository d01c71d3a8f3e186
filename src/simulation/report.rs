//! Run outputs: the batch report and the stream protocol units.

use serde::{Deserialize, Serialize};

use crate::core::{EnvironmentEvent, ExecutionLogEntry, TaskId};
use crate::overlay::MetadataOverlay;

use super::environment::EnvironmentSummary;
use super::orchestrator::WorkerDayLog;
use super::summary::DailySummary;

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SimulationReport {
    /// Number of detailed log entries.
    pub total_logs: usize,
    /// Raw per-worker outcomes.
    pub logs: Vec<WorkerDayLog>,
    pub detailed_logs: Vec<ExecutionLogEntry>,
    /// Only days on which something started or completed.
    pub daily_summaries: Vec<DailySummary>,
    pub env_events: Vec<EnvironmentEvent>,
    /// Absent when the environment injector is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_summary: Option<EnvironmentSummary>,
    /// The overlay applied before the run, echoed for audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<MetadataOverlay>,
}

/// One unit of the streaming protocol.
///
/// Per day: `day_start`, `env_event` (only when events occurred),
/// `agent_work`, `day_summary`. A run ends with exactly one `complete` or
/// one `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamUnit {
    DayStart {
        day: u32,
        eligible_task_ids: Vec<TaskId>,
    },
    EnvEvent {
        day: u32,
        events: Vec<EnvironmentEvent>,
    },
    AgentWork {
        day: u32,
        logs: Vec<ExecutionLogEntry>,
        outcomes: Vec<WorkerDayLog>,
    },
    DaySummary {
        day: u32,
        /// Completed tasks over the whole run so far.
        completed_tasks: usize,
        total_tasks: usize,
        env_events_today: usize,
        summary: DailySummary,
    },
    Complete(Box<SimulationReport>),
    Error {
        day: Option<u32>,
        message: String,
    },
}

impl StreamUnit {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamUnit::Complete(_) | StreamUnit::Error { .. })
    }

    /// Day the unit belongs to; `None` for `complete`.
    pub fn day(&self) -> Option<u32> {
        match self {
            StreamUnit::DayStart { day, .. }
            | StreamUnit::EnvEvent { day, .. }
            | StreamUnit::AgentWork { day, .. }
            | StreamUnit::DaySummary { day, .. } => Some(*day),
            StreamUnit::Complete(_) => None,
            StreamUnit::Error { day, .. } => *day,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamUnit::DayStart { .. } => "day_start",
            StreamUnit::EnvEvent { .. } => "env_event",
            StreamUnit::AgentWork { .. } => "agent_work",
            StreamUnit::DaySummary { .. } => "day_summary",
            StreamUnit::Complete(_) => "complete",
            StreamUnit::Error { .. } => "error",
        }
    }
}
