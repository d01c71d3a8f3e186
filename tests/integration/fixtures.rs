//! Test fixtures for integration tests.
//!
//! Provides:
//! - Scripted generators (always complete, fail for some workers, fatal)
//! - Predefined task and worker sets
//! - Config helpers

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use daysim::core::{OutcomeStatus, Task, Worker};
use daysim::generation::{
    DayOutcome, Discussion, GenerationError, TaskResult, WorkGenerator, WorkRequest,
};
use daysim::{Simulation, SimulationConfig};

/// Completes every requested task, optionally failing for some
/// (worker, day) pairs.
#[derive(Default)]
pub struct ScriptedGenerator {
    /// `(worker_id, day)` pairs that fail; day 0 matches every day.
    failures: HashSet<(String, u32)>,
    /// Day on which any call fails fatally.
    fatal_day: Option<u32>,
    /// Add one discussion per call.
    discuss: bool,
    calls: Mutex<Vec<(u32, String, Vec<String>)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, worker: &str, day: u32) -> Self {
        self.failures.insert((worker.to_string(), day));
        self
    }

    pub fn fatal_on(mut self, day: u32) -> Self {
        self.fatal_day = Some(day);
        self
    }

    pub fn with_discussions(mut self) -> Self {
        self.discuss = true;
        self
    }

    /// Recorded `(day, worker, task ids)` calls.
    pub fn calls(&self) -> Vec<(u32, String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkGenerator for ScriptedGenerator {
    async fn generate_day_outcome(
        &self,
        request: WorkRequest<'_>,
    ) -> Result<DayOutcome, GenerationError> {
        let worker = request.worker.id.to_string();
        self.calls.lock().unwrap().push((
            request.day,
            worker.clone(),
            request.tasks.iter().map(|t| t.id.to_string()).collect(),
        ));

        if self.fatal_day == Some(request.day) {
            return Err(GenerationError::Fatal("generator gone".into()));
        }
        if self.failures.contains(&(worker.clone(), request.day))
            || self.failures.contains(&(worker.clone(), 0))
        {
            return Err(GenerationError::Malformed("no JSON in output".into()));
        }

        let completed_tasks = request
            .tasks
            .iter()
            .enumerate()
            .map(|(i, task)| TaskResult {
                task_id: task.id.clone(),
                start_time_label: format!("{:02}:00", 9 + 2 * i),
                end_time_label: format!("{:02}:00", 10 + 2 * i),
                output_text: format!("{} delivered", task.name),
                status: OutcomeStatus::Completed,
                progress_percent: Some(100),
            })
            .collect();
        let discussions = if self.discuss {
            vec![Discussion {
                time_label: "16:00".into(),
                with_worker_id: "team".into(),
                topic: "status".into(),
                content: format!("{} shared progress", request.worker.display_name),
            }]
        } else {
            Vec::new()
        };

        Ok(DayOutcome {
            completed_tasks,
            discussions,
            notes: "scripted".into(),
        })
    }
}

/// Create `count` independent tasks named `T1..Tn`.
pub fn independent_tasks(count: usize) -> Vec<Task> {
    (1..=count)
        .map(|i| Task::new(&format!("T{}", i), &format!("Task {}", i)))
        .collect()
}

/// A -> B -> C, all assigned to one worker.
pub fn chain_project() -> (Vec<Task>, Vec<Worker>) {
    (
        vec![
            Task::new("A", "Design"),
            Task::new("B", "Build").with_dependencies(&["A"]),
            Task::new("C", "Ship").with_dependencies(&["B"]),
        ],
        vec![Worker::new("W1", "Alice").with_tasks(&["A", "B", "C"])],
    )
}

/// Two workers with two independent tasks each.
pub fn two_worker_project() -> (Vec<Task>, Vec<Worker>) {
    (
        independent_tasks(4),
        vec![
            Worker::new("W1", "Alice").with_tasks(&["T1", "T2"]),
            Worker::new("W2", "Bob").with_tasks(&["T3", "T4"]),
        ],
    )
}

pub fn config(days: u32, probability: f64) -> SimulationConfig {
    SimulationConfig {
        total_days: days,
        environment_event_probability: probability,
        seed: Some(42),
        ..Default::default()
    }
}

pub fn simulation(
    (tasks, workers): (Vec<Task>, Vec<Worker>),
    config: SimulationConfig,
    generator: Arc<ScriptedGenerator>,
) -> Simulation {
    Simulation::new(tasks, workers, config, generator).expect("valid inputs")
}
