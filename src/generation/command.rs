//! External command generator.
//!
//! Runs a model CLI non-interactively with a rendered prompt as the last
//! argument and parses the JSON day outcome from its stdout.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use super::{DayOutcome, GenerationError, WorkGenerator, WorkRequest};
use crate::config::{GeneratorConfig, DEFAULT_GENERATOR_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::{slog_debug, slog_trace};

/// Matches a Markdown code fence, optionally tagged `json`.
static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());

const PROMPT_TEMPLATE: &str = r#"You are simulating the real execution of a project.

Current day: day {day}
Current role: {name} ({role})
Capabilities: {capabilities}

Tasks assigned for today:
{tasks}

Project context:
{context}

Simulate this role's working day and answer with JSON only:
{
    "completed_tasks": [
        {
            "task_id": "T001",
            "start_time": "09:00",
            "end_time": "12:00",
            "output": "description of the deliverable",
            "status": "completed or in_progress",
            "progress_percentage": 100
        }
    ],
    "discussions": [
        {
            "time": "10:30",
            "with_role": "another role",
            "topic": "topic",
            "content": "what was discussed"
        }
    ],
    "notes": "summary of the day"
}

Rules:
1. Working hours are usually 09:00-18:00
2. Spread time according to each task's duration estimate
3. Simulate realistic collaboration between roles
4. Output JSON only
"#;

/// Render the generator prompt for one worker's day.
pub fn render_prompt(request: &WorkRequest<'_>) -> String {
    let tasks = serde_json::to_string_pretty(request.tasks).unwrap_or_else(|_| "[]".to_string());
    let capabilities = if request.worker.capabilities.is_empty() {
        "general".to_string()
    } else {
        request.worker.capabilities.join(", ")
    };
    let role = if request.worker.role_category.is_empty() {
        "member"
    } else {
        request.worker.role_category.as_str()
    };

    PROMPT_TEMPLATE
        .replace("{day}", &request.day.to_string())
        .replace("{name}", &request.worker.display_name)
        .replace("{role}", role)
        .replace("{capabilities}", &capabilities)
        .replace("{tasks}", &tasks)
        .replace("{context}", request.context)
}

/// Parse a day outcome from raw model output.
///
/// The JSON may be wrapped in a Markdown code fence.
pub fn parse_outcome(raw: &str) -> std::result::Result<DayOutcome, GenerationError> {
    let body = CODE_FENCE_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| raw.trim());

    serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))
}

/// Generator backed by an external command.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    /// Path to the executable.
    binary: PathBuf,
    /// Fixed arguments placed before the prompt.
    args: Vec<String>,
    timeout: Duration,
}

impl CommandGenerator {
    /// Build a generator from a whitespace-separated command line.
    ///
    /// The executable is resolved through `PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command line is empty or the executable
    /// cannot be found.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| Error::InvalidConfig("generator command is empty".to_string()))?;
        let binary = which::which(&program).map_err(|_| {
            Error::InvalidConfig(format!("generator executable not found: {}", program))
        })?;
        Ok(Self {
            binary,
            args: parts.collect(),
            timeout: Duration::from_secs(DEFAULT_GENERATOR_TIMEOUT_SECS),
        })
    }

    /// Build a generator from the `[generator]` config section.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let command = config
            .command
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("no generator command configured".to_string()))?;
        Ok(Self::from_command_line(command)?.with_timeout(Duration::from_secs(config.timeout_secs)))
    }

    /// Create a generator with a specific binary path, skipping `PATH` lookup.
    pub fn with_binary(binary: PathBuf, args: Vec<String>) -> Self {
        Self {
            binary,
            args,
            timeout: Duration::from_secs(DEFAULT_GENERATOR_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl WorkGenerator for CommandGenerator {
    async fn generate_day_outcome(
        &self,
        request: WorkRequest<'_>,
    ) -> std::result::Result<DayOutcome, GenerationError> {
        let prompt = render_prompt(&request);
        slog_debug!(
            "CommandGenerator: day={} worker={} tasks={}",
            request.day,
            request.worker.id,
            request.tasks.len()
        );

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.binary)
                .args(&self.args)
                .arg(&prompt)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| GenerationError::Timeout(self.timeout))?
        .map_err(|e| GenerationError::Failed(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        slog_trace!("CommandGenerator stdout: {}", stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                format!(
                    "command exited with code {}",
                    output.status.code().unwrap_or(-1)
                )
            } else {
                stderr.trim().to_string()
            };
            return Err(GenerationError::Failed(message));
        }

        parse_outcome(&stdout)
    }
}
