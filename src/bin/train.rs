//! Headless trainer: runs evolution without a window and logs progress.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use flappy_evo::cli::{Cli, init_tracing};
use flappy_evo::simulation::evaluator::fitness_fn;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.load_config()?;

    if let Some(path) = &cli.dump_config {
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!(path = %path.display(), "Wrote config");
        return Ok(());
    }

    let mut engine = cli.build_engine(&config)?;
    info!(
        population = config.evolution.population_size,
        layers = ?config.evolution.layer_sizes(),
        seed = engine.seed(),
        generations = cli.generations,
        "Starting headless training",
    );

    let winner = engine.run(fitness_fn(&config.simulation, None), cli.generations)?;

    match winner {
        Some(genome) => info!(id = genome.id, fitness = genome.fitness, "Training finished"),
        None => warn!("Training finished without evaluating any genome"),
    }
    Ok(())
}
