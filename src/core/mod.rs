//! Core domain models for the simulation.
//!
//! This module contains the input data (tasks, workers), the dependency
//! graph used for validation and eligibility, and the output records.

pub mod dag;
pub mod record;
pub mod task;
pub mod worker;

pub use dag::{eligible_tasks, processing_order, validate, TaskGraph};
pub use record::{
    EnvironmentEvent, EventCategory, EventKind, ExecutionLogEntry, ExtraKey, OutcomeStatus,
    Severity,
};
pub use task::{Task, TaskId, TaskStatus};
pub use worker::{Worker, WorkerId};
