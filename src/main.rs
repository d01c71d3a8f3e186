use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use daysim::core::validate;
use daysim::generation::{CommandGenerator, HeuristicGenerator, WorkGenerator};
use daysim::project::{load_overlay, Project};
use daysim::{slog, slog_error, Config, Result, Simulation, SimulationConfig, StreamUnit};

/// daysim - day-by-day simulation of a project's task graph
#[derive(Parser, Debug)]
#[command(name = "daysim")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    DAYSIM_DEBUG=1      Enable debug logging (alternative to --debug)\n    DAYSIM_DEBUG=trace  Enable trace logging (alternative to --trace)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.daysim/daysim.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Also log raw generator output
    #[arg(long, global = true)]
    pub trace: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Simulate a project and print the result as JSON
    Run {
        /// Project file with `tasks` and `workers`
        project: PathBuf,

        /// Overlay file applied before the first day
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Number of days to simulate
        #[arg(long)]
        days: Option<u32>,

        /// Chance of an environment event per non-idle day
        #[arg(long)]
        probability: Option<f64>,

        /// Seed for reproducible environment events
        #[arg(long)]
        seed: Option<u64>,

        /// Disable environment events
        #[arg(long)]
        no_env: bool,

        /// Generator command line; the prompt is appended as last argument
        #[arg(long)]
        generator: Option<String>,

        /// Print one JSON unit per line as the run progresses
        #[arg(long)]
        stream: bool,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a project (and overlay) without running it
    Validate {
        project: PathBuf,

        #[arg(long)]
        overlay: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        /// Write the effective configuration to ~/.daysim/daysim.toml
        #[arg(long)]
        save: bool,
    },
}

/// Options of the `run` command that override the config file.
#[derive(Debug, Clone, Default, PartialEq)]
struct RunOverrides {
    days: Option<u32>,
    probability: Option<f64>,
    seed: Option<u64>,
    no_env: bool,
    generator: Option<String>,
}

impl RunOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(days) = self.days {
            config.simulation.total_days = days;
        }
        if let Some(p) = self.probability {
            config.simulation.environment_event_probability = p;
        }
        if self.seed.is_some() {
            config.simulation.seed = self.seed;
        }
        if self.no_env {
            config.simulation.enable_environment_agent = false;
        }
        if self.generator.is_some() {
            config.generator.command = self.generator.clone();
        }
    }
}

/// The run failure carried by a streamed `error` unit.
fn stream_failure(unit: &StreamUnit) -> Option<daysim::Error> {
    match unit {
        StreamUnit::Error { day, message } => Some(daysim::Error::RunFailure {
            day: day.unwrap_or(0),
            message: message.clone(),
        }),
        _ => None,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_level = std::env::var("DAYSIM_DEBUG").ok();
    let level = daysim::log::resolve_level(cli.debug, cli.trace, env_level.as_deref());
    daysim::log::init(level);
    slog!("daysim starting (log level {})", level.as_str());

    match cli.command {
        Command::Run {
            project,
            overlay,
            days,
            probability,
            seed,
            no_env,
            generator,
            stream,
            output,
        } => {
            let overrides = RunOverrides {
                days,
                probability,
                seed,
                no_env,
                generator,
            };
            run_project(project, overlay, overrides, stream, output)
        }
        Command::Validate { project, overlay } => run_validate(project, overlay),
        Command::Config { save } => run_config(save),
    }
}

fn build_generator(config: &Config) -> Result<Arc<dyn WorkGenerator>> {
    if config.generator.command.is_some() {
        let generator = CommandGenerator::from_config(&config.generator)?;
        slog!("Using command generator: {}", generator.binary().display());
        Ok(Arc::new(generator))
    } else {
        slog!("Using heuristic generator");
        Ok(Arc::new(HeuristicGenerator::new(
            config.simulation.working_hours_per_day,
        )))
    }
}

fn build_simulation(
    project: PathBuf,
    overlay: Option<PathBuf>,
    config: SimulationConfig,
    generator: Arc<dyn WorkGenerator>,
) -> Result<Simulation> {
    let Project { tasks, workers } = Project::load(&project)?;
    match overlay {
        Some(path) => {
            let overlay = load_overlay(&path)?;
            Simulation::with_overlay(tasks, workers, overlay, config, generator)
        }
        None => Simulation::new(tasks, workers, config, generator),
    }
}

fn run_project(
    project: PathBuf,
    overlay: Option<PathBuf>,
    overrides: RunOverrides,
    stream: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    slog!(
        "Run command: project={}, overlay={:?}, stream={}",
        project.display(),
        overlay,
        stream
    );

    let mut config = Config::load()?;
    overrides.apply(&mut config);
    let generator = build_generator(&config)?;
    let mut simulation = build_simulation(project, overlay, config.simulation, generator)?;

    let rt = tokio::runtime::Runtime::new()?;

    if stream {
        return rt.block_on(async {
            let (handle, mut rx) = simulation.spawn();
            let mut failure = None;
            while let Some(unit) = rx.recv().await {
                println!("{}", serde_json::to_string(&unit)?);
                failure = failure.or_else(|| stream_failure(&unit));
            }
            handle.join().await?;
            match failure {
                Some(e) => {
                    slog_error!("Run failed: {}", e);
                    Err(e)
                }
                None => Ok(()),
            }
        });
    }

    let report = match rt.block_on(simulation.run()) {
        Ok(report) => report,
        Err(e) => {
            slog_error!("Run failed: {}", e);
            let partial = simulation.partial_report();
            eprintln!(
                "{} ({} day(s) completed before the failure)",
                e,
                partial.daily_summaries.len()
            );
            return Err(e);
        }
    };

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            fs::write(&path, json)?;
            println!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_validate(project: PathBuf, overlay: Option<PathBuf>) -> Result<()> {
    slog!("Validate command: project={}", project.display());
    let Project {
        mut tasks,
        mut workers,
    } = Project::load(&project)?;

    if let Some(path) = overlay {
        let applied = load_overlay(&path)?.apply(tasks, workers);
        for (task, worker) in &applied.dropped_assignments {
            println!("  dropped assignment: {} -> {}", task, worker);
        }
        tasks = applied.tasks;
        workers = applied.workers;
    }

    validate(&tasks, &workers)?;
    println!(
        "OK: {} tasks, {} workers, dependency graph is acyclic",
        tasks.len(),
        workers.len()
    );
    Ok(())
}

fn run_config(save: bool) -> Result<()> {
    let config = Config::load()?;
    config.simulation.validate()?;
    print!("{}", toml::to_string_pretty(&config)?);
    if save {
        config.save()?;
        println!("# saved to {}", Config::config_path()?.display());
    }
    Ok(())
}
