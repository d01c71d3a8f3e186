pub mod config;
pub mod core;
pub mod error;
pub mod generation;
pub mod log;
pub mod overlay;
pub mod project;
pub mod simulation;

pub use config::{Config, GeneratorConfig, SimulationConfig};
pub use error::{Error, PreconditionError, Result};
pub use overlay::{MetadataOverlay, OverlayOutcome};
pub use project::Project;
pub use simulation::{RunHandle, RunStatus, Simulation, SimulationReport, StreamUnit};
