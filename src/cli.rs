//! Command line and bootstrap shared by the windowed and headless binaries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::simulation::evolution::{Checkpoint, NeuroEvolution};
use crate::simulation::params::Config;
use crate::simulation::reporting::{Checkpointer, StdOutReporter};

/// Evolve Flappy Bird controllers.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// Path to a JSON config file. Defaults are used when omitted.
    pub config: Option<PathBuf>,

    /// Maximum number of generations to run.
    #[arg(long, default_value_t = 5000)]
    pub generations: u32,

    /// Seed for both the obstacle course and the engine (overrides the config).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for periodic checkpoints.
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Resume from a checkpoint file.
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Write the effective config to this path and exit.
    #[arg(long)]
    pub dump_config: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file (or defaults) and applies command line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(seed) = self.seed {
            config.simulation.seed = Some(seed);
            config.evolution.seed = Some(seed);
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Creates the engine, restoring a checkpoint when asked, with logging and
    /// checkpoint reporters attached.
    pub fn build_engine(&self, config: &Config) -> Result<NeuroEvolution> {
        let mut engine = match &self.resume {
            Some(path) => {
                let checkpoint = Checkpoint::load_from_file(path)
                    .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
                info!(
                    path = %path.display(),
                    generation = checkpoint.generation,
                    saved_at = %checkpoint.saved_at,
                    "Resuming from checkpoint",
                );
                NeuroEvolution::restore(checkpoint, config.evolution.clone())?
            }
            None => NeuroEvolution::new(config.evolution.clone())?,
        };

        engine.add_reporter(StdOutReporter { show_best: true });
        if config.evolution.checkpoint_interval > 0 {
            engine.add_reporter(Checkpointer::new(
                config.evolution.checkpoint_interval,
                self.checkpoint_dir.clone(),
            ));
        }
        Ok(engine)
    }
}

/// Installs the `tracing` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_flag_overrides_both_seeds() {
        let cli = Cli::parse_from(["train", "--seed", "7"]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.evolution.seed, Some(7));
    }

    #[test]
    fn config_path_is_positional() {
        let cli = Cli::parse_from(["train", "flappy.json", "--generations", "3"]);
        assert_eq!(cli.config, Some(PathBuf::from("flappy.json")));
        assert_eq!(cli.generations, 3);
        assert!(cli.resume.is_none());
    }
}
