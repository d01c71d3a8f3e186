//! Day-by-day simulation: environment injection, day orchestration, log
//! normalization, daily summaries and the driver tying them together.

pub mod driver;
pub mod environment;
pub mod handle;
pub mod normalize;
pub mod orchestrator;
pub mod report;
pub mod state;
pub mod summary;

pub use driver::Simulation;
pub use environment::{DelayStats, EnvironmentInjector, EnvironmentSummary};
pub use handle::RunHandle;
pub use normalize::{environment_entries, normalize_day, worker_entries};
pub use orchestrator::{build_context, run_day, WorkerDayLog};
pub use report::{SimulationReport, StreamUnit};
pub use state::{RunId, RunLifecycle, RunStatus, StatusChange};
pub use summary::{
    summarize, summarize_with, Communication, DailySummary, SummaryPolicy, TaskExecution,
    WorkerSummary,
};
