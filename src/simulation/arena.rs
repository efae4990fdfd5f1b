//! Per-tick game logic.
//!
//! The arena owns one evaluation's state: the live candidates, the obstacles and the
//! score. Each live candidate is a single record holding its agent, its decision
//! function and a borrowed fitness accumulator, keyed by a stable [`CandidateId`].
//! Eliminating a candidate removes exactly one record, so the three can never drift apart.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::error::SimResult;
use super::obstacle::Obstacle;
use super::params::Params;
use super::policy::{self, Policy};
use super::render::Scene;

/// Stable identifier of a candidate within one evaluation (its position in the input).
pub type CandidateId = usize;

/// One live candidate.
#[derive(Debug)]
pub struct Candidate<'a, P: ?Sized> {
    /// The candidate's avatar.
    pub agent: Agent,
    /// The candidate's decision function, owned by the evolution engine.
    pub policy: &'a P,
    /// The candidate's fitness accumulator, owned by the evolution engine.
    pub fitness: &'a mut f64,
}

/// Why an evaluation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Every agent was eliminated.
    Extinct,
    /// The score went past the cap. Survivors keep their fitness, no penalty.
    ScoreCap,
    /// The render sink asked to stop.
    Interrupted,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Candidates removed this tick, in elimination order.
    pub eliminated: Vec<CandidateId>,
    /// Whether an obstacle was passed (and a new one spawned) this tick.
    pub passed: bool,
}

/// State of one evaluation.
#[derive(Debug)]
pub struct Arena<'a, P: ?Sized> {
    candidates: BTreeMap<CandidateId, Candidate<'a, P>>,
    obstacles: Vec<Obstacle>,
    score: u32,
    tick: u64,
}

impl<'a, P: Policy + ?Sized> Arena<'a, P> {
    /// Creates an empty arena with one freshly generated obstacle.
    pub fn new<R: Rng>(params: &Params, rng: &mut R) -> Self {
        Self::with_obstacles(vec![Obstacle::new(params, rng)])
    }

    /// Creates an empty arena with the given obstacles.
    pub fn with_obstacles(obstacles: Vec<Obstacle>) -> Self {
        Self {
            candidates: BTreeMap::new(),
            obstacles,
            score: 0,
            tick: 0,
        }
    }

    /// Adds a candidate with an agent at the start position.
    pub fn insert(&mut self, policy: &'a P, fitness: &'a mut f64, params: &Params) -> CandidateId {
        self.insert_agent(Agent::at_start(params), policy, fitness)
    }

    /// Adds a candidate with a specific agent state.
    pub fn insert_agent(&mut self, agent: Agent, policy: &'a P, fitness: &'a mut f64) -> CandidateId {
        let id = self
            .candidates
            .last_key_value()
            .map_or(0, |(&last, _)| last + 1);
        self.candidates.insert(
            id,
            Candidate {
                agent,
                policy,
                fitness,
            },
        );
        id
    }

    /// Index of the obstacle the agents steer by.
    ///
    /// The nearest obstacle, unless the lead agent is already past its right edge and a
    /// second one exists.
    pub fn target_index(&self) -> usize {
        match self.candidates.values().next() {
            Some(lead) if self.obstacles.len() >= 2 && lead.agent.x > self.obstacles[0].right() => 1,
            _ => 0,
        }
    }

    /// Runs one tick.
    ///
    /// Errors only when a decision function misbehaves; the tick is then abandoned.
    pub fn step<R: Rng>(&mut self, params: &Params, rng: &mut R) -> SimResult<TickReport> {
        let target = self.target_index();
        let mut report = TickReport::default();

        for candidate in self.candidates.values_mut() {
            candidate.agent.advance(params);
            *candidate.fitness += params.survival_reward;

            if let Some(obstacle) = self.obstacles.get(target)
                && policy::decide(candidate.policy, &candidate.agent, obstacle)?
            {
                candidate.agent.jump(params);
            }
        }

        for obstacle in &mut self.obstacles {
            self.candidates.retain(|&id, candidate| {
                if obstacle.overlaps(&candidate.agent) || candidate.agent.is_below_screen(params) {
                    *candidate.fitness -= params.crash_penalty;
                    report.eliminated.push(id);
                    return false;
                }

                if !obstacle.passed && obstacle.x < candidate.agent.x {
                    obstacle.passed = true;
                    report.passed = true;
                }
                true
            });

            obstacle.advance(params);
        }

        if report.passed {
            self.score += 1;
            self.obstacles.push(Obstacle::new(params, rng));
        }

        self.obstacles.retain(|obstacle| !obstacle.is_off_screen());
        self.tick += 1;

        Ok(report)
    }

    /// Whether the evaluation is over, and why.
    pub fn termination(&self, params: &Params) -> Option<Termination> {
        if self.score > params.score_cap {
            Some(Termination::ScoreCap)
        } else if self.candidates.is_empty() {
            Some(Termination::Extinct)
        } else {
            None
        }
    }

    /// Read-only view for renderers.
    pub fn scene(&self, generation: u32) -> Scene<'_> {
        Scene {
            generation,
            tick: self.tick,
            score: self.score,
            agents: self.candidates.values().map(|c| &c.agent).collect(),
            obstacles: &self.obstacles,
        }
    }

    /// Obstacles currently on screen, oldest first.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Agent of a live candidate.
    pub fn agent(&self, id: CandidateId) -> Option<&Agent> {
        self.candidates.get(&id).map(|c| &c.agent)
    }

    /// Current fitness of a live candidate.
    pub fn fitness(&self, id: CandidateId) -> Option<f64> {
        self.candidates.get(&id).map(|c| *c.fitness)
    }

    /// Ids of the live candidates, in order.
    pub fn live_ids(&self) -> impl Iterator<Item = CandidateId> + '_ {
        self.candidates.keys().copied()
    }

    /// Number of live candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether every candidate has been eliminated.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Obstacles passed so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Ticks executed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }
}
