//! Work generation: the capability that decides what a worker does on a day.
//!
//! The simulation only depends on the [`WorkGenerator`] trait. Two
//! implementations ship with the crate:
//! - [`CommandGenerator`] shells out to an external model CLI and parses its
//!   JSON answer
//! - [`HeuristicGenerator`] advances tasks by their duration estimate, for
//!   offline runs

mod command;
mod heuristic;

pub use command::{parse_outcome, render_prompt, CommandGenerator};
pub use heuristic::HeuristicGenerator;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::core::{OutcomeStatus, Task, TaskId, Worker};

/// Everything a generator gets to know about one worker's day.
#[derive(Debug, Clone, Copy)]
pub struct WorkRequest<'a> {
    pub day: u32,
    pub worker: &'a Worker,
    /// The worker's assigned tasks that are eligible today, in processing order.
    pub tasks: &'a [Task],
    /// Free-text project context.
    pub context: &'a str,
}

/// Errors a generator may report.
///
/// Everything except [`GenerationError::Fatal`] is recovered per worker: the
/// worker gets an empty outcome with a failure marker and the day goes on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("generator failed: {0}")]
    Failed(String),

    #[error("malformed generator output: {0}")]
    Malformed(String),

    #[error("generator timed out after {0:?}")]
    Timeout(Duration),

    /// The generator cannot serve any further request.
    #[error("generator unavailable: {0}")]
    Fatal(String),
}

impl GenerationError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, GenerationError::Fatal(_))
    }
}

#[async_trait]
pub trait WorkGenerator: Send + Sync {
    async fn generate_day_outcome(
        &self,
        request: WorkRequest<'_>,
    ) -> std::result::Result<DayOutcome, GenerationError>;
}

/// Structured result of one worker's day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DayOutcome {
    /// Results for tasks worked on today, finished or not.
    #[serde(default)]
    pub completed_tasks: Vec<TaskResult>,
    #[serde(default)]
    pub discussions: Vec<Discussion>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    #[serde(default = "default_start", alias = "start_time")]
    pub start_time_label: String,
    #[serde(default = "default_end", alias = "end_time")]
    pub end_time_label: String,
    #[serde(default, alias = "output")]
    pub output_text: String,
    #[serde(default)]
    pub status: OutcomeStatus,
    #[serde(
        default,
        alias = "progress_percentage",
        deserialize_with = "deserialize_percent"
    )]
    pub progress_percent: Option<u8>,
}

impl TaskResult {
    pub fn is_completed(&self) -> bool {
        self.status == OutcomeStatus::Completed
    }

    /// Reported progress, or 100/0 by status when the generator left it out.
    pub fn effective_progress(&self) -> u8 {
        match self.progress_percent {
            Some(p) => p,
            None if self.is_completed() => 100,
            None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    #[serde(default = "default_discussion_time", alias = "time")]
    pub time_label: String,
    /// Counterpart of the conversation; a worker id or a role name.
    #[serde(default = "default_counterpart", alias = "with_role")]
    pub with_worker_id: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub content: String,
}

fn default_start() -> String {
    "09:00".to_string()
}

fn default_end() -> String {
    "18:00".to_string()
}

fn default_discussion_time() -> String {
    "12:00".to_string()
}

fn default_counterpart() -> String {
    "team".to_string()
}

/// Accept any JSON number (models like `87.5`) and clamp into 0..=100.
fn deserialize_percent<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| v.round().clamp(0.0, 100.0) as u8))
}
