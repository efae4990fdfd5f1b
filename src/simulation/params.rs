//! Simulation and evolution parameters.
//!
//! All values are process-wide constants for a run. They are loaded once from a JSON
//! file (or taken from [`Default`]) and never change while evolution is running.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::error::{SimError, SimResult};

/// Size of the observation vector fed to every policy.
pub const OBSERVATION_SIZE: usize = 3;

/// Mixes the generation number into a run seed.
const GENERATION_SEED_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seed for one generation of a seeded run.
pub fn generation_seed(seed: u64, generation: u32) -> u64 {
    seed ^ u64::from(generation).wrapping_mul(GENERATION_SEED_PRIME)
}

/// Physics, scoring and display parameters for the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Width of the visible area.
    pub screen_width: f32,
    /// Height of the visible area. The y axis grows downward.
    pub screen_height: f32,
    /// Velocity added to every agent each tick.
    pub gravity: f32,
    /// Velocity set by a jump. Negative means upward.
    pub jump_velocity: f32,
    /// Side length of the agent's square bounding box.
    pub agent_size: f32,
    /// Fixed horizontal position of every agent.
    pub agent_start_x: f32,
    /// Vertical position agents start from.
    pub agent_start_y: f32,
    /// Vertical size of the passable gap in each obstacle.
    pub gap_size: f32,
    /// Minimum distance between a gap and the top or bottom of the screen.
    pub gap_margin: f32,
    /// Width of both barriers of an obstacle.
    pub obstacle_width: f32,
    /// Distance an obstacle moves left per tick.
    pub obstacle_speed: f32,
    /// Fitness added to every surviving agent per tick.
    pub survival_reward: f64,
    /// Fitness removed from an agent when it crashes.
    pub crash_penalty: f64,
    /// An evaluation ends once the score exceeds this value.
    pub score_cap: u32,
    /// Frame rate used to pace rendered runs. Headless runs ignore it.
    pub fps: f32,
    /// Seed for obstacle placement. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            screen_width: 500.0,
            screen_height: 500.0,
            gravity: 1.0,
            jump_velocity: -3.0,
            agent_size: 32.0,
            agent_start_x: 100.0,
            agent_start_y: 100.0,
            gap_size: 64.0,
            gap_margin: 10.0,
            obstacle_width: 32.0,
            obstacle_speed: 1.0,
            survival_reward: 0.1,
            crash_penalty: 10.0,
            score_cap: 300,
            fps: 240.0,
            seed: None,
        }
    }
}

impl Params {
    /// Lowest and highest (exclusive) value an obstacle's `gap_top` may take.
    pub fn gap_range(&self) -> (f32, f32) {
        (
            self.gap_margin,
            self.screen_height - self.gap_size - self.gap_margin,
        )
    }

    /// Random source for one generation's obstacle course.
    ///
    /// Derived from [`Params::seed`] and the generation number, so a resumed run plays
    /// the same courses as an uninterrupted one. Without a seed every call is fresh.
    pub fn course_rng(&self, generation: u32) -> StdRng {
        let seed = self.seed.map_or_else(
            || rand::rng().random(),
            |seed| generation_seed(seed, generation),
        );
        StdRng::seed_from_u64(seed)
    }

    /// Checks that the values describe a playable game.
    pub fn validate(&self) -> SimResult<()> {
        if self.screen_width <= 0.0 || self.screen_height <= 0.0 {
            return Err(SimError::InvalidParams(format!(
                "screen must be positive, got {}x{}",
                self.screen_width, self.screen_height
            )));
        }
        if self.agent_size <= 0.0 || self.obstacle_width <= 0.0 {
            return Err(SimError::InvalidParams(
                "agent_size and obstacle_width must be positive".to_string(),
            ));
        }
        if self.gap_size <= 0.0 {
            return Err(SimError::InvalidParams(format!(
                "gap_size must be positive, got {}",
                self.gap_size
            )));
        }
        if self.agent_start_x < 0.0 || self.agent_start_x > self.screen_width - self.agent_size {
            return Err(SimError::InvalidParams(format!(
                "agent_start_x must lie in [0, {}], got {}",
                self.screen_width - self.agent_size,
                self.agent_start_x
            )));
        }
        if self.agent_start_y < 0.0 || self.agent_start_y > self.screen_height - self.agent_size {
            return Err(SimError::InvalidParams(format!(
                "agent_start_y must lie in [0, {}], got {}",
                self.screen_height - self.agent_size,
                self.agent_start_y
            )));
        }
        let (low, high) = self.gap_range();
        if low.ceil() >= high.ceil() {
            return Err(SimError::InvalidParams(format!(
                "gap range [{low}, {high}) is empty"
            )));
        }
        if self.obstacle_speed <= 0.0 {
            return Err(SimError::InvalidParams(
                "obstacle_speed must be positive".to_string(),
            ));
        }
        if self.fps <= 0.0 {
            return Err(SimError::InvalidParams("fps must be positive".to_string()));
        }
        Ok(())
    }
}

/// Parameters of the evolution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionParams {
    /// Number of genomes per generation.
    pub population_size: usize,
    /// Hidden layer sizes between the 3 inputs and the single output.
    pub hidden_layers: Vec<usize>,
    /// Range of the initial uniform weight distribution.
    pub init_scale: f32,
    /// Range of the uniform noise added on mutation.
    pub mutation_scale: f32,
    /// Number of best genomes copied unchanged into the next generation.
    pub elitism: usize,
    /// Fraction of the population allowed to reproduce.
    pub survival_threshold: f32,
    /// Probability that a child is bred from two parents instead of one.
    pub crossover_rate: f32,
    /// Stop early once the best fitness reaches this value.
    pub fitness_threshold: Option<f64>,
    /// Write a checkpoint every this many generations. `0` disables checkpointing.
    pub checkpoint_interval: u32,
    /// Seed for the engine's random source. `None` draws a fresh seed.
    pub seed: Option<u64>,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            hidden_layers: vec![6],
            init_scale: 1.0,
            mutation_scale: 0.2,
            elitism: 2,
            survival_threshold: 0.2,
            crossover_rate: 0.5,
            fitness_threshold: Some(100.0),
            checkpoint_interval: 0,
            seed: None,
        }
    }
}

impl EvolutionParams {
    /// Full layer sizes of every brain: inputs, hidden layers, one output.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(OBSERVATION_SIZE);
        sizes.extend(self.hidden_layers.iter().copied());
        sizes.push(1);
        sizes
    }

    /// Checks that the engine can breed with these values.
    pub fn validate(&self) -> SimResult<()> {
        if self.population_size == 0 {
            return Err(SimError::InvalidParams(
                "population_size must be at least 1".to_string(),
            ));
        }
        if self.hidden_layers.contains(&0) {
            return Err(SimError::InvalidParams(
                "hidden layers cannot be empty".to_string(),
            ));
        }
        if self.init_scale <= 0.0 || self.mutation_scale <= 0.0 {
            return Err(SimError::InvalidParams(
                "init_scale and mutation_scale must be positive".to_string(),
            ));
        }
        if !(self.survival_threshold > 0.0 && self.survival_threshold <= 1.0) {
            return Err(SimError::InvalidParams(format!(
                "survival_threshold must be in (0, 1], got {}",
                self.survival_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(SimError::InvalidParams(format!(
                "crossover_rate must be in [0, 1], got {}",
                self.crossover_rate
            )));
        }
        Ok(())
    }
}

/// Everything a run needs, as stored in the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Game parameters.
    pub simulation: Params,
    /// Engine parameters.
    pub evolution: EvolutionParams,
}

impl Config {
    /// Loads and validates a config from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the config as pretty-printed JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SimResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validates both parameter groups.
    pub fn validate(&self) -> SimResult<()> {
        self.simulation.validate()?;
        self.evolution.validate()
    }
}
