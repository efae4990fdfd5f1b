//! Error type shared by the simulation, the evaluator and the evolution engine.
//!
//! Crashes and eliminations are simulation outcomes, not errors. Only real faults
//! (I/O, malformed files, bad configuration, broken decision functions) end up here.

use thiserror::Error;

/// Faults raised by the library.
#[derive(Error, Debug)]
pub enum SimError {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A config or checkpoint file could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A decision function produced an empty output vector.
    #[error("Policy returned an empty output vector")]
    EmptyPolicyOutput,

    /// The engine was asked to run with no genomes.
    #[error("Population is empty")]
    EmptyPopulation,

    /// A checkpoint was written with a network shape the current config cannot use.
    #[error("Checkpoint mismatch: expected layers {expected:?}, found {found:?}")]
    CheckpointMismatch {
        /// Layer sizes required by the current configuration.
        expected: Vec<usize>,
        /// Layer sizes stored in the checkpoint.
        found: Vec<usize>,
    },
}

/// Result alias used across the crate.
pub type SimResult<T> = Result<T, SimError>;
