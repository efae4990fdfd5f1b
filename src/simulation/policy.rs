//! Bridge between the game state and a candidate's decision function.

use ndarray::Array1;

use super::agent::Agent;
use super::error::{SimError, SimResult};
use super::obstacle::Obstacle;

/// Output values above this threshold mean "jump".
pub const JUMP_THRESHOLD: f32 = 0.5;

/// A decision function: maps an observation vector to an action vector.
///
/// Only the first output element is read. Implemented by evolved brains and by plain
/// closures, which keeps scripted controllers cheap to write in tests.
pub trait Policy {
    /// Runs the decision function on one observation.
    fn activate(&self, inputs: &Array1<f32>) -> Array1<f32>;
}

impl<F> Policy for F
where
    F: Fn(&Array1<f32>) -> Array1<f32>,
{
    fn activate(&self, inputs: &Array1<f32>) -> Array1<f32> {
        self(inputs)
    }
}

/// Builds the observation for an agent steering towards `target`.
///
/// Layout: `[y, |y - gap_top|, |y - gap_bottom|]`.
pub fn observe(agent: &Agent, target: &Obstacle) -> Array1<f32> {
    Array1::from_vec(vec![
        agent.y,
        (agent.y - target.gap_top).abs(),
        (agent.y - target.gap_bottom).abs(),
    ])
}

/// Asks the policy whether the agent should jump this tick.
pub fn decide<P: Policy + ?Sized>(policy: &P, agent: &Agent, target: &Obstacle) -> SimResult<bool> {
    let output = policy.activate(&observe(agent, target));
    let first = output.first().copied().ok_or(SimError::EmptyPolicyOutput)?;
    Ok(first > JUMP_THRESHOLD)
}
