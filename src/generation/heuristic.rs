//! Offline generator that needs no external model.

use async_trait::async_trait;

use super::{DayOutcome, GenerationError, TaskResult, WorkGenerator, WorkRequest};
use crate::core::OutcomeStatus;

const DAY_START_MINUTES: u32 = 9 * 60;

/// Advances each task by `100 / duration_estimate` percent per day.
///
/// The worker's hours are split evenly across today's tasks, back to back
/// from 09:00. Output is fully determined by the request.
#[derive(Debug, Clone)]
pub struct HeuristicGenerator {
    working_hours_per_day: f64,
}

impl HeuristicGenerator {
    pub fn new(working_hours_per_day: f64) -> Self {
        Self {
            working_hours_per_day,
        }
    }
}

impl Default for HeuristicGenerator {
    fn default() -> Self {
        Self::new(8.0)
    }
}

fn clock(minutes: u32) -> String {
    format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60)
}

#[async_trait]
impl WorkGenerator for HeuristicGenerator {
    async fn generate_day_outcome(
        &self,
        request: WorkRequest<'_>,
    ) -> std::result::Result<DayOutcome, GenerationError> {
        if request.tasks.is_empty() {
            return Ok(DayOutcome::default());
        }

        let slot = (self.working_hours_per_day * 60.0 / request.tasks.len() as f64).max(1.0) as u32;
        let mut cursor = DAY_START_MINUTES;
        let mut results = Vec::with_capacity(request.tasks.len());

        for task in request.tasks {
            let daily_gain = 100.0 / task.duration_estimate.max(1.0);
            let progress = (f64::from(task.progress_percent) + daily_gain).round().min(100.0) as u8;
            let status = if progress >= 100 {
                OutcomeStatus::Completed
            } else {
                OutcomeStatus::InProgress
            };
            let output_text = match status {
                OutcomeStatus::Completed => format!("Finished {}", task.name),
                OutcomeStatus::InProgress => format!("Advanced {} to {}%", task.name, progress),
            };

            results.push(TaskResult {
                task_id: task.id.clone(),
                start_time_label: clock(cursor),
                end_time_label: clock(cursor.saturating_add(slot)),
                output_text,
                status,
                progress_percent: Some(progress),
            });
            cursor = cursor.saturating_add(slot);
        }

        let finished = results.iter().filter(|r| r.is_completed()).count();
        Ok(DayOutcome {
            notes: format!(
                "{} worked on {} task(s), finished {}",
                request.worker.display_name,
                results.len(),
                finished
            ),
            completed_tasks: results,
            discussions: Vec::new(),
        })
    }
}
