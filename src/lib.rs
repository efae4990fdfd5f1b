//! # Flappy Evo - Neuroevolution for a side-scroller
//!
//! Evolves controllers for a Flappy Bird style game. A population of neural network
//! policies plays the same course simultaneously; each candidate's survival time becomes
//! its fitness, and an evolution engine breeds the next generation from the best.
//!
//! ## Features
//!
//! - Deterministic per-tick physics (constant gravity, jump impulse)
//! - Scrolling obstacles with randomised gaps and inclusive collision tests
//! - Fitness shaping: survival reward per tick, crash penalty
//! - MLP brains evolved by elitism, crossover and mutation
//! - Headless training or a macroquad window with live fitness plots
//! - JSON configuration and checkpoints
//!
//! ## Core Modules
//!
//! - [`simulation::arena`] - One tick of the game
//! - [`simulation::evaluator`] - One generation's fitness evaluation
//! - [`simulation::policy`] - Observation and jump decision
//! - [`simulation::evolution`] - Generation loop and breeding
//! - [`cli`] - Command line shared by both binaries

pub mod cli;

/// Core simulation logic and data structures.
pub mod simulation {
    /// The controlled avatar and its kinematics.
    pub mod agent;
    /// Per-tick game logic over candidates and obstacles.
    pub mod arena;
    /// Neural network implementation for candidate brains.
    pub mod brain;
    /// Library error type.
    pub mod error;
    /// Fitness evaluation of a generation.
    pub mod evaluator;
    /// Evolution engine and the [`evolution::Population`] trait.
    pub mod evolution;
    /// Scrolling obstacles.
    pub mod obstacle;
    /// Simulation and evolution parameters.
    pub mod params;
    /// Observation building and jump decisions.
    pub mod policy;
    /// Read-only scene views for renderers.
    pub mod render;
    /// Generation reporters (logging, statistics, checkpoints).
    pub mod reporting;
}
