//! Generation reporters: logging, fitness history and checkpoints.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::SimResult;
use super::evolution::{GenerationStats, Genome, NeuroEvolution};

/// Observer of the generation loop. All hooks default to doing nothing.
pub trait Reporter: Send {
    /// Called before a generation is evaluated.
    fn start_generation(&mut self, _generation: u32) {}

    /// Called once a generation's fitness is known, before breeding.
    fn post_evaluate(&mut self, _stats: &GenerationStats, _population: &NeuroEvolution) {}

    /// Called after the next generation has been bred.
    fn end_generation(&mut self, _population: &NeuroEvolution) -> SimResult<()> {
        Ok(())
    }
}

/// Logs one line per generation.
#[derive(Debug, Default)]
pub struct StdOutReporter {
    /// Also log the best genome's id.
    pub show_best: bool,
}

impl Reporter for StdOutReporter {
    fn start_generation(&mut self, generation: u32) {
        tracing::debug!(generation, "Running generation");
    }

    fn post_evaluate(&mut self, stats: &GenerationStats, population: &NeuroEvolution) {
        info!(
            generation = stats.generation,
            population = stats.population_size,
            best = stats.best_fitness,
            mean = stats.mean_fitness,
            stdev = stats.stdev_fitness,
            elapsed_ms = stats.elapsed_ms,
            "Generation evaluated",
        );
        if self.show_best
            && let Some(best) = population.best()
        {
            info!(id = best.id, fitness = best.fitness, "Best genome so far");
        }
    }
}

/// Fitness history of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Per-generation stats, oldest first.
    pub generations: VecDeque<GenerationStats>,
    /// Best genome ever evaluated.
    pub best_genome: Option<Genome>,
    /// Maximum number of generations kept.
    pub max_history: usize,
}

impl Statistics {
    /// Creates an empty history keeping at most `max_history` generations.
    pub fn with_capacity(max_history: usize) -> Self {
        Self {
            generations: VecDeque::with_capacity(max_history),
            best_genome: None,
            max_history,
        }
    }

    /// Appends a generation, dropping the oldest beyond the cap.
    pub fn record(&mut self, stats: GenerationStats, best: Option<&Genome>) {
        self.generations.push_back(stats);
        if self.generations.len() > self.max_history {
            self.generations.pop_front();
        }
        if let Some(best) = best {
            self.best_genome = Some(best.clone());
        }
    }

    /// `(generation, best fitness)` points.
    pub fn best_fitness(&self) -> Vec<[f64; 2]> {
        self.generations
            .iter()
            .map(|s| [f64::from(s.generation), s.best_fitness])
            .collect()
    }

    /// `(generation, mean fitness)` points.
    pub fn mean_fitness(&self) -> Vec<[f64; 2]> {
        self.generations
            .iter()
            .map(|s| [f64::from(s.generation), s.mean_fitness])
            .collect()
    }

    /// Stats of the latest generation.
    pub fn latest(&self) -> Option<&GenerationStats> {
        self.generations.back()
    }
}

/// Records every generation into a [`Statistics`] shared with other threads.
#[derive(Debug, Clone)]
pub struct StatisticsReporter {
    shared: Arc<Mutex<Statistics>>,
}

impl StatisticsReporter {
    /// Creates a reporter with its own history.
    pub fn new(max_history: usize) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Statistics::with_capacity(max_history))),
        }
    }

    /// Handle for readers, e.g. the stats panel.
    pub fn handle(&self) -> Arc<Mutex<Statistics>> {
        Arc::clone(&self.shared)
    }
}

impl Reporter for StatisticsReporter {
    fn post_evaluate(&mut self, stats: &GenerationStats, population: &NeuroEvolution) {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(stats.clone(), population.best());
    }
}

/// Writes a checkpoint every `interval` generations.
#[derive(Debug, Clone)]
pub struct Checkpointer {
    interval: u32,
    directory: PathBuf,
}

impl Checkpointer {
    /// Saves into `directory` as `checkpoint-<generation>.json`.
    pub fn new(interval: u32, directory: impl Into<PathBuf>) -> Self {
        Self {
            interval,
            directory: directory.into(),
        }
    }

    /// File name used for a generation.
    pub fn path_for(&self, generation: u32) -> PathBuf {
        self.directory.join(format!("checkpoint-{generation}.json"))
    }
}

impl Reporter for Checkpointer {
    fn end_generation(&mut self, population: &NeuroEvolution) -> SimResult<()> {
        use super::evolution::Population;

        let generation = population.generation();
        if self.interval == 0 || generation % self.interval != 0 {
            return Ok(());
        }

        std::fs::create_dir_all(&self.directory)?;
        let path = self.path_for(generation);
        population.checkpoint().save_to_file(&path)?;
        info!(generation, path = %path.display(), "Saved checkpoint");
        Ok(())
    }
}
