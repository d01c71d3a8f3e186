//! Running a simulation on its own task with external control.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::slog_debug;

use super::driver::Simulation;
use super::report::{SimulationReport, StreamUnit};
use super::state::{RunId, RunStatus};

enum Step {
    Cancelled,
    Unit(Option<StreamUnit>),
}

/// Control handle for a spawned run.
#[derive(Debug)]
pub struct RunHandle {
    id: RunId,
    pause_tx: watch::Sender<bool>,
    cancel: CancellationToken,
    task: JoinHandle<SimulationReport>,
}

impl RunHandle {
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Request a pause. Takes effect at the next day boundary.
    pub fn pause(&self) {
        let _ = self.pause_tx.send(true);
    }

    pub fn resume(&self) {
        let _ = self.pause_tx.send(false);
    }

    /// Hard stop. The day in flight is discarded.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end and return the report of its completed days.
    pub async fn join(self) -> Result<SimulationReport> {
        self.task
            .await
            .map_err(|e| Error::TaskJoin(e.to_string()))
    }
}

impl Simulation {
    /// Run on a tokio task, sending units through a channel of capacity 1.
    ///
    /// The run waits for the consumer, so at most one unit is produced
    /// ahead of what has been received. Dropping the receiver stops the run.
    pub fn spawn(self) -> (RunHandle, mpsc::Receiver<StreamUnit>) {
        let (tx, rx) = mpsc::channel(1);
        let (pause_tx, pause_rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        let id = self.id();

        let task = tokio::spawn(drive(self, tx, pause_rx, cancel.clone()));

        (
            RunHandle {
                id,
                pause_tx,
                cancel,
                task,
            },
            rx,
        )
    }
}

async fn drive(
    mut simulation: Simulation,
    tx: mpsc::Sender<StreamUnit>,
    mut pause_rx: watch::Receiver<bool>,
    cancel: CancellationToken,
) -> SimulationReport {
    loop {
        let pause_requested = *pause_rx.borrow();
        if pause_requested
            && simulation.status() == RunStatus::Running
            && simulation.at_day_boundary()
            && simulation.pause().is_ok()
        {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return simulation.stop(),
                    changed = pause_rx.changed() => {
                        let still_paused = changed.is_ok() && *pause_rx.borrow();
                        if !still_paused {
                            break;
                        }
                    }
                }
            }
            if let Err(e) = simulation.resume() {
                slog_debug!("resume failed: {}", e);
            }
        }

        let step = tokio::select! {
            biased;
            _ = cancel.cancelled() => Step::Cancelled,
            unit = simulation.next_unit() => Step::Unit(unit),
        };

        let unit = match step {
            Step::Cancelled => return simulation.stop(),
            Step::Unit(None) => return simulation.partial_report(),
            Step::Unit(Some(unit)) => unit,
        };

        let terminal = unit.is_terminal();
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            result = tx.send(unit) => result.is_ok(),
        };
        if !sent {
            slog_debug!("run {} stopped while sending", simulation.id().short());
            return simulation.stop();
        }
        if terminal {
            return simulation.partial_report();
        }
    }
}
