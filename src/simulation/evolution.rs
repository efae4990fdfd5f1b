//! Generation loop, selection and breeding.
//!
//! The game only talks to the engine through [`Population::evaluate`]: the engine hands
//! a fitness callback its genomes once per generation, reads back the fitness values and
//! breeds the next generation. [`NeuroEvolution`] is a small fixed-topology engine
//! (elitism, truncation selection, weighted crossover, uniform mutation) over [`Brain`]s.

use std::ops::ControlFlow;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::brain::Brain;
use super::error::{SimError, SimResult};
use super::params::{EvolutionParams, generation_seed};
use super::reporting::Reporter;

/// One member of the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Unique id, never reused within a run.
    pub id: u64,
    /// Decision function.
    pub brain: Brain,
    /// Fitness from the last evaluation.
    pub fitness: f64,
}

/// Fitness statistics of one evaluated generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number, starting at 0.
    pub generation: u32,
    /// Number of genomes evaluated.
    pub population_size: usize,
    /// Highest fitness.
    pub best_fitness: f64,
    /// Mean fitness.
    pub mean_fitness: f64,
    /// Population standard deviation of the fitness.
    pub stdev_fitness: f64,
    /// Id of the best genome.
    pub best_id: u64,
    /// Wall time of the evaluation in milliseconds.
    pub elapsed_ms: f64,
}

impl GenerationStats {
    fn from_genomes(generation: u32, genomes: &[Genome], elapsed_ms: f64) -> Option<Self> {
        let best = genomes
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))?;
        let n = genomes.len() as f64;
        // summation rounding can push the mean of equal values one ulp past the best
        let mean = (genomes.iter().map(|g| g.fitness).sum::<f64>() / n).min(best.fitness);
        let variance = genomes
            .iter()
            .map(|g| (g.fitness - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            generation,
            population_size: genomes.len(),
            best_fitness: best.fitness,
            mean_fitness: mean,
            stdev_fitness: variance.sqrt(),
            best_id: best.id,
            elapsed_ms,
        })
    }
}

/// An evolutionary engine seen from the game's side.
pub trait Population {
    /// Generation about to be evaluated.
    fn generation(&self) -> u32;

    /// Evaluates the current generation with `fitness_fn` and breeds the next one.
    ///
    /// `fitness_fn` receives the generation number and every genome; it must write each
    /// genome's fitness. Returning `Break` means the evaluation was cut short: nothing is
    /// bred and `Ok(None)` is returned.
    fn evaluate<F>(&mut self, fitness_fn: F) -> SimResult<Option<GenerationStats>>
    where
        F: FnOnce(u32, &mut [Genome]) -> SimResult<ControlFlow<()>>;
}

/// Fixed-topology neuroevolution over MLP brains.
pub struct NeuroEvolution {
    params: EvolutionParams,
    seed: u64,
    generation: u32,
    next_id: u64,
    genomes: Vec<Genome>,
    best: Option<Genome>,
    reporters: Vec<Box<dyn Reporter>>,
}

impl std::fmt::Debug for NeuroEvolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeuroEvolution")
            .field("seed", &self.seed)
            .field("generation", &self.generation)
            .field("population", &self.genomes.len())
            .field("reporters", &self.reporters.len())
            .finish_non_exhaustive()
    }
}

impl NeuroEvolution {
    /// Creates a random initial population.
    pub fn new(params: EvolutionParams) -> SimResult<Self> {
        params.validate()?;
        let seed = params.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        let layer_sizes = params.layer_sizes();

        let genomes = (0..params.population_size as u64)
            .map(|id| Genome {
                id,
                brain: Brain::new(&layer_sizes, params.init_scale, &mut rng),
                fitness: 0.0,
            })
            .collect();

        Ok(Self {
            next_id: params.population_size as u64,
            params,
            seed,
            generation: 0,
            genomes,
            best: None,
            reporters: Vec::new(),
        })
    }

    /// Resumes from a checkpoint, continuing with `params`.
    ///
    /// Selection settings may change between runs; the network shape may not.
    pub fn restore(checkpoint: Checkpoint, params: EvolutionParams) -> SimResult<Self> {
        params.validate()?;
        let expected = params.layer_sizes();
        if let Some(found) = checkpoint
            .genomes
            .iter()
            .map(|genome| genome.brain.layer_sizes())
            .find(|sizes| *sizes != expected)
        {
            return Err(SimError::CheckpointMismatch { expected, found });
        }
        if checkpoint.genomes.is_empty() {
            return Err(SimError::EmptyPopulation);
        }

        Ok(Self {
            params,
            seed: checkpoint.seed,
            generation: checkpoint.generation,
            next_id: checkpoint.next_id,
            genomes: checkpoint.genomes,
            best: checkpoint.best,
            reporters: Vec::new(),
        })
    }

    /// Registers a reporter notified after every generation.
    pub fn add_reporter<R: Reporter + 'static>(&mut self, reporter: R) {
        self.reporters.push(Box::new(reporter));
    }

    /// Runs up to `generations` generations.
    ///
    /// Stops early when the best fitness reaches the configured threshold or when the
    /// fitness callback breaks. Returns the best genome seen so far.
    pub fn run<F>(&mut self, mut fitness_fn: F, generations: u32) -> SimResult<Option<Genome>>
    where
        F: FnMut(u32, &mut [Genome]) -> SimResult<ControlFlow<()>>,
    {
        for _ in 0..generations {
            let Some(stats) = self.evaluate(&mut fitness_fn)? else {
                break;
            };

            if let Some(threshold) = self.params.fitness_threshold
                && stats.best_fitness >= threshold
            {
                tracing::info!(
                    generation = stats.generation,
                    best = stats.best_fitness,
                    threshold,
                    "Fitness threshold reached",
                );
                break;
            }
        }
        Ok(self.best.clone())
    }

    /// Current genomes, in breeding order.
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Best genome evaluated so far.
    pub fn best(&self) -> Option<&Genome> {
        self.best.as_ref()
    }

    /// Seed the run was started with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Captures everything needed to resume this run.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            generation: self.generation,
            seed: self.seed,
            next_id: self.next_id,
            saved_at: Utc::now(),
            genomes: self.genomes.clone(),
            best: self.best.clone(),
        }
    }

    fn generation_rng(&self) -> StdRng {
        StdRng::seed_from_u64(generation_seed(self.seed, self.generation))
    }

    /// Replaces the evaluated population with the next generation.
    fn reproduce(&mut self) {
        let mut rng = self.generation_rng();
        let size = self.params.population_size;

        self.genomes
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let survivors = ((self.genomes.len() as f32 * self.params.survival_threshold).ceil()
            as usize)
            .clamp(1, self.genomes.len());
        let elites = self.params.elitism.min(survivors).min(size);

        let mut next: Vec<Genome> = self.genomes[..elites]
            .iter()
            .map(|genome| Genome {
                fitness: 0.0,
                ..genome.clone()
            })
            .collect();

        let seeds: Vec<u64> = (elites..size).map(|_| rng.random()).collect();
        let parents = &self.genomes[..survivors];
        let crossover_rate = self.params.crossover_rate;
        let mutation_scale = self.params.mutation_scale;

        let children: Vec<Brain> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let parent1 = &parents[rng.random_range(0..parents.len())];

                let mut brain = if parents.len() >= 2 && rng.random::<f32>() < crossover_rate {
                    let mut index = rng.random_range(0..parents.len());
                    while parents[index].id == parent1.id {
                        index = rng.random_range(0..parents.len());
                    }
                    let weight = rng.random::<f32>();
                    Brain::crossover_weighted(&parent1.brain, &parents[index].brain, weight)
                } else {
                    parent1.brain.clone()
                };

                brain.mutate(mutation_scale, &mut rng);
                brain
            })
            .collect();

        for brain in children {
            next.push(Genome {
                id: self.next_id,
                brain,
                fitness: 0.0,
            });
            self.next_id += 1;
        }

        self.genomes = next;
    }

    fn notify<F>(&mut self, mut call: F) -> SimResult<()>
    where
        F: FnMut(&mut dyn Reporter, &NeuroEvolution) -> SimResult<()>,
    {
        let mut reporters = std::mem::take(&mut self.reporters);
        let result = reporters
            .iter_mut()
            .try_for_each(|reporter| call(reporter.as_mut(), self));
        self.reporters = reporters;
        result
    }
}

impl Population for NeuroEvolution {
    fn generation(&self) -> u32 {
        self.generation
    }

    fn evaluate<F>(&mut self, fitness_fn: F) -> SimResult<Option<GenerationStats>>
    where
        F: FnOnce(u32, &mut [Genome]) -> SimResult<ControlFlow<()>>,
    {
        if self.genomes.is_empty() {
            return Err(SimError::EmptyPopulation);
        }

        let generation = self.generation;
        self.notify(|reporter, _| {
            reporter.start_generation(generation);
            Ok(())
        })?;

        let started = Instant::now();
        if fitness_fn(generation, self.genomes.as_mut_slice())?.is_break() {
            tracing::warn!(generation, "Evaluation interrupted, generation discarded");
            return Ok(None);
        }
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let stats = GenerationStats::from_genomes(generation, &self.genomes, elapsed_ms)
            .ok_or(SimError::EmptyPopulation)?;

        if let Some(champion) = self.genomes.iter().find(|g| g.id == stats.best_id)
            && self
                .best
                .as_ref()
                .is_none_or(|best| champion.fitness > best.fitness)
        {
            self.best = Some(champion.clone());
        }

        self.notify(|reporter, population| {
            reporter.post_evaluate(&stats, population);
            Ok(())
        })?;

        self.reproduce();
        self.generation += 1;

        self.notify(|reporter, population| reporter.end_generation(population))?;

        Ok(Some(stats))
    }
}

/// Serialized state of a run, written by the checkpoint reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Generation the stored genomes belong to (not yet evaluated).
    pub generation: u32,
    /// Seed of the run; per-generation randomness is derived from it.
    pub seed: u64,
    /// Next unused genome id.
    pub next_id: u64,
    /// When the checkpoint was written.
    pub saved_at: DateTime<Utc>,
    /// Population of `generation`.
    pub genomes: Vec<Genome>,
    /// Best genome evaluated before the checkpoint.
    pub best: Option<Genome>,
}

impl Checkpoint {
    /// Saves the checkpoint to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SimResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads a checkpoint from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let checkpoint = serde_json::from_str(&json)?;
        Ok(checkpoint)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn small_params() -> EvolutionParams {
        EvolutionParams {
            population_size: 10,
            hidden_layers: vec![4],
            elitism: 2,
            survival_threshold: 0.3,
            fitness_threshold: None,
            seed: Some(42),
            ..EvolutionParams::default()
        }
    }

    /// Fitness = genome id, so later genomes always look better.
    fn score_by_id(_: u32, genomes: &mut [Genome]) -> SimResult<ControlFlow<()>> {
        for genome in genomes.iter_mut() {
            genome.fitness = genome.id as f64;
        }
        Ok(ControlFlow::Continue(()))
    }

    #[test]
    fn initial_population_has_requested_shape() {
        let engine = NeuroEvolution::new(small_params()).unwrap();
        assert_eq!(engine.genomes().len(), 10);
        assert_eq!(engine.generation(), 0);
        for genome in engine.genomes() {
            assert_eq!(genome.brain.layer_sizes(), vec![3, 4, 1]);
        }
    }

    #[test]
    fn evaluate_reports_stats_and_breeds() {
        let mut engine = NeuroEvolution::new(small_params()).unwrap();

        let stats = engine.evaluate(score_by_id).unwrap().unwrap();

        assert_eq!(stats.generation, 0);
        assert_eq!(stats.population_size, 10);
        assert_eq!(stats.best_fitness, 9.0);
        assert_eq!(stats.best_id, 9);
        assert!((stats.mean_fitness - 4.5).abs() < 1e-12);

        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.genomes().len(), 10);
        // elites survive unchanged, children get fresh ids
        assert_eq!(engine.genomes()[0].id, 9);
        assert_eq!(engine.genomes()[1].id, 8);
        assert!(engine.genomes()[2..].iter().all(|g| g.id >= 10));
        assert_eq!(engine.best().unwrap().id, 9);
    }

    #[test]
    fn mean_never_exceeds_best_for_equal_fitness() {
        for value in [26.900_000_000_000_254, 0.1, 2.7 - 10.0, 1e-3] {
            for size in 1..=64_u64 {
                let genomes: Vec<Genome> = (0..size)
                    .map(|id| Genome {
                        id,
                        brain: Brain::new(&[3, 1], 1.0, &mut StdRng::seed_from_u64(id)),
                        fitness: value,
                    })
                    .collect();

                let stats = GenerationStats::from_genomes(0, &genomes, 0.0).unwrap();

                assert!(stats.mean_fitness <= stats.best_fitness, "{value} x {size}");
                assert!(stats.stdev_fitness >= 0.0);
            }
        }
    }

    #[test]
    fn interrupted_generation_is_discarded() {
        let mut engine = NeuroEvolution::new(small_params()).unwrap();
        let before = engine.genomes().to_vec();

        let result = engine
            .evaluate(|_, _| Ok(ControlFlow::Break(())))
            .unwrap();

        assert!(result.is_none());
        assert_eq!(engine.generation(), 0);
        assert_eq!(engine.genomes(), before.as_slice());
    }

    #[test]
    fn fitness_errors_propagate() {
        let mut engine = NeuroEvolution::new(small_params()).unwrap();
        let result = engine.evaluate(|_, _| Err(SimError::EmptyPolicyOutput));
        assert!(matches!(result, Err(SimError::EmptyPolicyOutput)));
    }

    #[test]
    fn same_seed_breeds_same_population() {
        let mut a = NeuroEvolution::new(small_params()).unwrap();
        let mut b = NeuroEvolution::new(small_params()).unwrap();
        a.run(score_by_id, 3).unwrap();
        b.run(score_by_id, 3).unwrap();
        assert_eq!(a.genomes(), b.genomes());
    }

    #[test]
    fn run_stops_at_fitness_threshold() {
        let params = EvolutionParams {
            fitness_threshold: Some(5.0),
            ..small_params()
        };
        let mut engine = NeuroEvolution::new(params).unwrap();

        let best = engine.run(score_by_id, 50).unwrap().unwrap();

        assert_eq!(engine.generation(), 1);
        assert_eq!(best.fitness, 9.0);
    }

    #[test]
    fn checkpoint_restores_population() {
        let mut engine = NeuroEvolution::new(small_params()).unwrap();
        engine.run(score_by_id, 2).unwrap();

        let checkpoint = engine.checkpoint();
        let restored = NeuroEvolution::restore(checkpoint, small_params()).unwrap();

        assert_eq!(restored.generation(), 2);
        assert_eq!(restored.genomes(), engine.genomes());
        assert_eq!(restored.seed(), engine.seed());
    }

    #[test]
    fn checkpoint_with_other_shape_is_rejected() {
        let engine = NeuroEvolution::new(small_params()).unwrap();
        let params = EvolutionParams {
            hidden_layers: vec![8],
            ..small_params()
        };

        let result = NeuroEvolution::restore(engine.checkpoint(), params);

        assert!(matches!(result, Err(SimError::CheckpointMismatch { .. })));
    }
}
