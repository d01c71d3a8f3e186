use thiserror::Error;

use crate::core::TaskId;

/// Violations of the input contract, detected before any day runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("task set is empty")]
    EmptyTasks,

    #[error("worker set is empty")]
    EmptyWorkers,

    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),

    #[error("task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("dependency cycle detected at task: {0}")]
    DependencyCycle(TaskId),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid run transition from {from} to {to}")]
    InvalidRunTransition { from: String, to: String },

    #[error("Run failed on day {day}: {message}")]
    RunFailure { day: u32, message: String },

    #[error("Task join error: {0}")]
    TaskJoin(String),

    #[error("No home directory")]
    NoHomeDir,
}

pub type Result<T> = std::result::Result<T, Error>;
