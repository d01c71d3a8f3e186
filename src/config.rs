use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::EventCategory;
use crate::simulation::SummaryPolicy;
use crate::{slog_debug, Error, Result};

/// Default timeout for one external generator call (5 minutes).
pub const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 300;

/// Parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of days to simulate, at least 1.
    pub total_days: u32,
    /// Whether the environment injector runs at all.
    pub enable_environment_agent: bool,
    /// Chance of a disruption on a non-idle day, 0.0 to 1.0.
    pub environment_event_probability: f64,
    pub working_hours_per_day: f64,
    /// Seed for the environment RNG; `None` draws from OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Categories the injector may draw from.
    pub enabled_categories: Vec<EventCategory>,
    pub summary_policy: SummaryPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            total_days: 30,
            enable_environment_agent: true,
            environment_event_probability: 0.2,
            working_hours_per_day: 8.0,
            seed: None,
            enabled_categories: EventCategory::ALL.to_vec(),
            summary_policy: SummaryPolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_days(total_days: u32) -> Self {
        Self {
            total_days,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_days == 0 {
            return Err(Error::InvalidConfig(
                "total_days must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.environment_event_probability) {
            return Err(Error::InvalidConfig(format!(
                "environment_event_probability must be within [0, 1], got {}",
                self.environment_event_probability
            )));
        }
        if !(self.working_hours_per_day > 0.0 && self.working_hours_per_day <= 24.0) {
            return Err(Error::InvalidConfig(format!(
                "working_hours_per_day must be within (0, 24], got {}",
                self.working_hours_per_day
            )));
        }
        Ok(())
    }
}

/// Settings for the external command generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Command line used to generate a worker's day. The rendered prompt is
    /// appended as the last argument. `None` selects the offline generator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: DEFAULT_GENERATOR_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Config {
    pub fn daysim_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".daysim"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::daysim_dir()?.join("daysim.toml"))
    }

    /// Load the user config, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        slog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            slog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        slog_debug!(
            "Config loaded: days={}, probability={}, command={:?}",
            config.simulation.total_days,
            config.simulation.environment_event_probability,
            config.generator.command
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        Self::ensure_dirs()?;
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        fs::write(path, toml::to_string_pretty(self)?)?;
        slog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn ensure_dirs() -> Result<()> {
        let dir = Self::daysim_dir()?;
        if !dir.exists() {
            slog_debug!("Creating daysim directory: {}", dir.display());
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
