//! Fitness evaluation of one generation.
//!
//! This is the callback the evolution engine runs once per generation: every candidate
//! plays the same course at the same time and its accumulated reward becomes its fitness.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::arena::{Arena, CandidateId, Termination};
use super::error::SimResult;
use super::evolution::Genome;
use super::params::Params;
use super::policy::Policy;
use super::render::RenderSink;

/// Outcome of one evaluation, used for logging and inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Obstacles passed.
    pub score: u32,
    /// Why the evaluation stopped.
    pub termination: Termination,
    /// Tick (1-based) at which each eliminated candidate crashed.
    pub eliminated_at: BTreeMap<CandidateId, u64>,
}

impl EvaluationSummary {
    /// Number of candidates still alive at the end.
    pub fn survivors(&self, candidates: usize) -> usize {
        candidates - self.eliminated_at.len()
    }
}

/// Plays one game with every candidate and writes their fitness.
///
/// Each accumulator is zeroed first, then only ever changed through the reference the
/// caller handed in. Candidates are numbered by their position in `candidates`.
pub fn evaluate<'a, P, I, R>(
    candidates: I,
    params: &Params,
    generation: u32,
    rng: &mut R,
    mut sink: Option<&mut (dyn RenderSink + '_)>,
) -> SimResult<EvaluationSummary>
where
    P: Policy + ?Sized + 'a,
    I: IntoIterator<Item = (&'a P, &'a mut f64)>,
    R: Rng,
{
    let mut arena = Arena::new(params, rng);
    for (policy, fitness) in candidates {
        *fitness = 0.0;
        arena.insert(policy, fitness, params);
    }
    let total = arena.len();
    let mut eliminated_at = BTreeMap::new();

    let termination = loop {
        if let Some(termination) = arena.termination(params) {
            break termination;
        }

        let report = arena.step(params, rng)?;
        for id in report.eliminated {
            eliminated_at.insert(id, arena.tick());
        }

        if let Some(sink) = sink.as_deref_mut()
            && sink.render(&arena.scene(generation)).is_break()
        {
            break Termination::Interrupted;
        }
    };

    let summary = EvaluationSummary {
        ticks: arena.tick(),
        score: arena.score(),
        termination,
        eliminated_at,
    };

    debug!(
        generation,
        candidates = total,
        ticks = summary.ticks,
        score = summary.score,
        survivors = summary.survivors(total),
        termination = ?summary.termination,
        "Evaluation finished",
    );

    Ok(summary)
}

/// Evaluates a slice of genomes with their brains as decision functions.
pub fn evaluate_genomes<R: Rng>(
    genomes: &mut [Genome],
    params: &Params,
    generation: u32,
    rng: &mut R,
    sink: Option<&mut (dyn RenderSink + '_)>,
) -> SimResult<EvaluationSummary> {
    let candidates = genomes
        .iter_mut()
        .map(|genome| (&genome.brain, &mut genome.fitness));
    evaluate(candidates, params, generation, rng, sink)
}

/// Builds the per-generation fitness callback expected by [`super::evolution::Population`].
///
/// Each generation plays the course from [`Params::course_rng`] for its generation number.
/// An interrupted evaluation is reported as `Break` so the engine skips breeding.
pub fn fitness_fn<'s>(
    params: &'s Params,
    mut sink: Option<&'s mut dyn RenderSink>,
) -> impl FnMut(u32, &mut [Genome]) -> SimResult<ControlFlow<()>> + 's {
    move |generation: u32, genomes: &mut [Genome]| {
        let mut course = params.course_rng(generation);
        let summary =
            evaluate_genomes(genomes, params, generation, &mut course, sink.as_deref_mut())?;
        Ok(match summary.termination {
            Termination::Interrupted => ControlFlow::Break(()),
            Termination::Extinct | Termination::ScoreCap => ControlFlow::Continue(()),
        })
    }
}
