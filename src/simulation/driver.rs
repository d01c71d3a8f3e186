//! The simulation driver: a pull-based stepper over days.
//!
//! Each call to [`Simulation::next_unit`] advances the run by one stream
//! unit. Batch mode ([`Simulation::run`]) and streaming mode
//! ([`Simulation::into_stream`], [`Simulation::spawn`]) are both built on
//! that single stepping function, so they always agree.

use std::sync::Arc;

use futures::stream::{self, Stream};

use crate::config::SimulationConfig;
use crate::core::{
    eligible_tasks, processing_order, validate, EnvironmentEvent, ExecutionLogEntry, Task, TaskId,
    Worker,
};
use crate::error::{Error, Result};
use crate::generation::WorkGenerator;
use crate::overlay::MetadataOverlay;
use crate::{slog, slog_debug, slog_error};

use super::environment::EnvironmentInjector;
use super::normalize::normalize_day;
use super::orchestrator::{run_day, WorkerDayLog};
use super::report::{SimulationReport, StreamUnit};
use super::state::{RunId, RunLifecycle, RunStatus};
use super::summary::{summarize_with, DailySummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    DayStart,
    Environment,
    Work,
    Summary,
    Finish,
    Done,
}

/// Output of the day in flight. Merged into the run totals only once the
/// day summary is produced.
#[derive(Debug, Default)]
struct DayDraft {
    eligible: Vec<TaskId>,
    env_events: Vec<EnvironmentEvent>,
    outcomes: Vec<WorkerDayLog>,
    entries: Vec<ExecutionLogEntry>,
}

#[derive(Debug, Default)]
struct Totals {
    logs: Vec<WorkerDayLog>,
    detailed_logs: Vec<ExecutionLogEntry>,
    summaries: Vec<DailySummary>,
    env_events: Vec<EnvironmentEvent>,
}

/// A single simulation run and all of its mutable state.
///
/// Runs are independent values; several may execute concurrently.
pub struct Simulation {
    id: RunId,
    config: SimulationConfig,
    generator: Arc<dyn WorkGenerator>,
    injector: EnvironmentInjector,
    lifecycle: RunLifecycle,
    overlay: Option<MetadataOverlay>,
    /// Tasks in processing order.
    tasks: Vec<Task>,
    workers: Vec<Worker>,
    /// Last day started; 0 before the first day.
    day: u32,
    /// Task state at the start of the day in flight.
    checkpoint: Vec<Task>,
    draft: DayDraft,
    totals: Totals,
    phase: Phase,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("id", &self.id)
            .field("status", &self.lifecycle.status())
            .field("day", &self.day)
            .field("total_days", &self.config.total_days)
            .field("tasks", &self.tasks.len())
            .field("workers", &self.workers.len())
            .finish()
    }
}

impl Simulation {
    /// Validate inputs and prepare a run.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for empty inputs, unknown dependencies
    /// or a dependency cycle, and `InvalidConfig` for a bad config. No day
    /// runs in either case.
    pub fn new(
        tasks: Vec<Task>,
        workers: Vec<Worker>,
        config: SimulationConfig,
        generator: Arc<dyn WorkGenerator>,
    ) -> Result<Self> {
        config.validate()?;
        validate(&tasks, &workers)?;

        let tasks = processing_order(&tasks);
        let id = RunId::new();
        slog!(
            "Run {} prepared: {} tasks, {} workers, {} days",
            id.short(),
            tasks.len(),
            workers.len(),
            config.total_days
        );

        Ok(Self {
            id,
            injector: EnvironmentInjector::new(config.seed),
            config,
            generator,
            lifecycle: RunLifecycle::new(),
            overlay: None,
            checkpoint: Vec::new(),
            tasks,
            workers,
            day: 0,
            draft: DayDraft::default(),
            totals: Totals::default(),
            phase: Phase::DayStart,
        })
    }

    /// Apply `overlay` to the inputs, then prepare a run as [`Simulation::new`].
    pub fn with_overlay(
        tasks: Vec<Task>,
        workers: Vec<Worker>,
        overlay: MetadataOverlay,
        config: SimulationConfig,
        generator: Arc<dyn WorkGenerator>,
    ) -> Result<Self> {
        let applied = overlay.apply(tasks, workers);
        let mut simulation = Self::new(applied.tasks, applied.workers, config, generator)?;
        simulation.overlay = Some(applied.overlay);
        Ok(simulation)
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn status(&self) -> RunStatus {
        self.lifecycle.status()
    }

    pub fn lifecycle(&self) -> &RunLifecycle {
        &self.lifecycle
    }

    /// Current task state, in processing order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// Last day started, 0 before the run begins.
    pub fn current_day(&self) -> u32 {
        self.day
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// True between days (or before the first one).
    pub fn at_day_boundary(&self) -> bool {
        self.phase == Phase::DayStart
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Pause a running simulation. Only allowed between days.
    pub fn pause(&mut self) -> Result<()> {
        if !self.at_day_boundary() {
            return Err(Error::InvalidRunTransition {
                from: format!("{} (mid-day {})", self.status(), self.day),
                to: RunStatus::Paused.to_string(),
            });
        }
        self.lifecycle.transition(RunStatus::Paused)?;
        slog!("Run {} paused after day {}", self.id.short(), self.day);
        Ok(())
    }

    /// Resume a paused simulation at the next unprocessed day.
    pub fn resume(&mut self) -> Result<()> {
        self.lifecycle.transition(RunStatus::Running)?;
        slog!("Run {} resumed at day {}", self.id.short(), self.day + 1);
        Ok(())
    }

    /// Hard stop. Any day in flight is discarded; completed days are kept.
    pub fn stop(&mut self) -> SimulationReport {
        if !self.status().is_terminal() {
            self.abort_day();
            if self.lifecycle.transition(RunStatus::Cancelled).is_ok() {
                slog!(
                    "Run {} cancelled, {} day(s) kept",
                    self.id.short(),
                    self.totals.summaries.len()
                );
            }
            self.phase = Phase::Done;
        }
        self.partial_report()
    }

    /// Report over the days completed so far.
    pub fn partial_report(&self) -> SimulationReport {
        SimulationReport {
            total_logs: self.totals.detailed_logs.len(),
            logs: self.totals.logs.clone(),
            detailed_logs: self.totals.detailed_logs.clone(),
            daily_summaries: self
                .totals
                .summaries
                .iter()
                .filter(|s| s.is_active())
                .cloned()
                .collect(),
            env_events: self.totals.env_events.clone(),
            env_summary: self
                .config
                .enable_environment_agent
                .then(|| self.injector.summary()),
            overlay: self.overlay.clone(),
        }
    }

    /// Produce the next stream unit.
    ///
    /// Returns `None` once the run has ended, or while it is paused.
    pub async fn next_unit(&mut self) -> Option<StreamUnit> {
        if self.status() == RunStatus::Paused {
            return None;
        }

        loop {
            match self.phase {
                Phase::Done => return None,
                Phase::DayStart => {
                    if self.status() == RunStatus::Idle {
                        if let Err(e) = self.lifecycle.transition(RunStatus::Running) {
                            return Some(self.fail(e));
                        }
                        slog!("Run {} started", self.id.short());
                    }
                    if self.day >= self.config.total_days {
                        self.phase = Phase::Finish;
                        continue;
                    }
                    return Some(self.start_day());
                }
                Phase::Environment => {
                    self.phase = Phase::Work;
                    if let Some(unit) = self.inject_environment() {
                        return Some(unit);
                    }
                }
                Phase::Work => return Some(self.work().await),
                Phase::Summary => return Some(self.summarize_day()),
                Phase::Finish => return Some(self.finish()),
            }
        }
    }

    /// Run to completion and return the full report.
    ///
    /// # Errors
    ///
    /// Returns `RunFailure` if a day fails; [`Simulation::partial_report`]
    /// still holds the days completed before it.
    pub async fn run(&mut self) -> Result<SimulationReport> {
        loop {
            match self.next_unit().await {
                Some(StreamUnit::Complete(report)) => return Ok(*report),
                Some(StreamUnit::Error { day, message }) => {
                    return Err(Error::RunFailure {
                        day: day.unwrap_or(self.day),
                        message,
                    })
                }
                Some(_) => {}
                None => {
                    return Err(Error::InvalidRunTransition {
                        from: self.status().to_string(),
                        to: RunStatus::Completed.to_string(),
                    })
                }
            }
        }
    }

    /// Consume the simulation as a stream of units.
    pub fn into_stream(self) -> impl Stream<Item = StreamUnit> {
        stream::unfold(self, |mut simulation| async move {
            let unit = simulation.next_unit().await?;
            Some((unit, simulation))
        })
    }

    fn start_day(&mut self) -> StreamUnit {
        self.day += 1;
        self.checkpoint = self.tasks.clone();
        let eligible: Vec<TaskId> = eligible_tasks(self.day, &self.tasks)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        slog!(
            "Run {} day {}/{}: {} eligible task(s)",
            self.id.short(),
            self.day,
            self.config.total_days,
            eligible.len()
        );

        self.draft = DayDraft {
            eligible: eligible.clone(),
            ..Default::default()
        };
        self.phase = Phase::Environment;
        StreamUnit::DayStart {
            day: self.day,
            eligible_task_ids: eligible,
        }
    }

    fn inject_environment(&mut self) -> Option<StreamUnit> {
        if !self.config.enable_environment_agent {
            return None;
        }
        let eligible: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| self.draft.eligible.contains(&t.id))
            .collect();
        let events = self.injector.inject(
            self.day,
            &eligible,
            self.config.environment_event_probability,
            &self.config.enabled_categories,
        );
        if events.is_empty() {
            return None;
        }
        self.draft.env_events = events.clone();
        Some(StreamUnit::EnvEvent {
            day: self.day,
            events,
        })
    }

    async fn work(&mut self) -> StreamUnit {
        let outcomes = match run_day(
            self.day,
            &self.draft.eligible,
            &mut self.tasks,
            &self.workers,
            self.generator.as_ref(),
        )
        .await
        {
            Ok(outcomes) => outcomes,
            Err(e) => return self.fail(e),
        };

        let entries = normalize_day(&self.draft.env_events, &outcomes, &self.tasks);
        slog_debug!(
            "day {}: {} worker log(s), {} entries",
            self.day,
            outcomes.len(),
            entries.len()
        );
        self.draft.outcomes = outcomes.clone();
        self.draft.entries = entries.clone();
        self.phase = Phase::Summary;
        StreamUnit::AgentWork {
            day: self.day,
            logs: entries,
            outcomes,
        }
    }

    fn summarize_day(&mut self) -> StreamUnit {
        let draft = std::mem::take(&mut self.draft);
        let summary = summarize_with(
            self.day,
            &draft.entries,
            &draft.env_events,
            &self.config.summary_policy,
        );

        let env_events_today = draft.env_events.len();
        self.totals.logs.extend(draft.outcomes);
        self.totals.detailed_logs.extend(draft.entries);
        self.totals.env_events.extend(draft.env_events);
        self.totals.summaries.push(summary.clone());
        self.checkpoint.clear();
        self.phase = Phase::DayStart;

        StreamUnit::DaySummary {
            day: self.day,
            completed_tasks: self.tasks.iter().filter(|t| t.is_completed()).count(),
            total_tasks: self.tasks.len(),
            env_events_today,
            summary,
        }
    }

    fn finish(&mut self) -> StreamUnit {
        self.phase = Phase::Done;
        if let Err(e) = self.lifecycle.transition(RunStatus::Completed) {
            return self.fail(e);
        }
        let report = self.partial_report();
        slog!(
            "Run {} completed: {} days, {} entries, {} env events",
            self.id.short(),
            self.day,
            report.total_logs,
            report.env_events.len()
        );
        StreamUnit::Complete(Box::new(report))
    }

    fn fail(&mut self, error: Error) -> StreamUnit {
        let day = match &error {
            Error::RunFailure { day, .. } => *day,
            _ => self.day,
        };
        let message = match error {
            Error::RunFailure { message, .. } => message,
            other => other.to_string(),
        };
        slog_error!("Run {} failed on day {}: {}", self.id.short(), day, message);

        self.abort_day();
        // Failed is only reachable from running; a failure before start is
        // recorded as a cancellation.
        if self.lifecycle.transition(RunStatus::Failed).is_err() {
            let _ = self.lifecycle.transition(RunStatus::Cancelled);
        }
        self.phase = Phase::Done;
        StreamUnit::Error {
            day: (day > 0).then_some(day),
            message,
        }
    }

    /// Roll back the day in flight, if any.
    fn abort_day(&mut self) {
        if self.phase == Phase::DayStart || self.phase == Phase::Done || self.day == 0 {
            return;
        }
        if !self.checkpoint.is_empty() {
            self.tasks = std::mem::take(&mut self.checkpoint);
        }
        self.injector.discard_from(self.day);
        self.draft = DayDraft::default();
        slog_debug!("day {} discarded", self.day);
    }
}
