//! Run lifecycle with transition validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Unique identifier of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 characters of the UUID, for log lines.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Status of a run.
///
/// ```text
/// idle -> running <-> paused
///         running -> completed | failed | cancelled
///         paused  -> cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Paused => "paused",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: RunStatus,
    pub at: DateTime<Utc>,
}

/// Tracks the run status and every status it went through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLifecycle {
    status: RunStatus,
    history: Vec<StatusChange>,
}

impl Default for RunLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLifecycle {
    pub fn new() -> Self {
        Self {
            status: RunStatus::Idle,
            history: vec![StatusChange {
                status: RunStatus::Idle,
                at: Utc::now(),
            }],
        }
    }

    pub fn can_transition(&self, target: RunStatus) -> bool {
        matches!(
            (self.status, target),
            (RunStatus::Idle, RunStatus::Running)
                | (RunStatus::Idle, RunStatus::Cancelled)
                | (RunStatus::Running, RunStatus::Paused)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
                | (RunStatus::Running, RunStatus::Cancelled)
                | (RunStatus::Paused, RunStatus::Running)
                | (RunStatus::Paused, RunStatus::Cancelled)
        )
    }

    pub fn transition(&mut self, target: RunStatus) -> Result<()> {
        if !self.can_transition(target) {
            return Err(Error::InvalidRunTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        self.history.push(StatusChange {
            status: target,
            at: Utc::now(),
        });
        Ok(())
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }
}
