//! JSON input files: the project (tasks and workers) and an optional overlay.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Task, Worker};
use crate::overlay::MetadataOverlay;
use crate::{slog_debug, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Project {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub workers: Vec<Worker>,
}

impl Project {
    pub fn load(path: &Path) -> Result<Self> {
        let project: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        slog_debug!(
            "Project loaded from {}: {} tasks, {} workers",
            path.display(),
            project.tasks.len(),
            project.workers.len()
        );
        Ok(project)
    }
}

pub fn load_overlay(path: &Path) -> Result<MetadataOverlay> {
    let overlay: MetadataOverlay = serde_json::from_str(&fs::read_to_string(path)?)?;
    slog_debug!("Overlay loaded from {}", path.display());
    Ok(overlay)
}
