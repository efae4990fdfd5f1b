//! Read-only view of the game handed to renderers once per tick.
//!
//! The simulation never draws anything itself. A caller passes an optional
//! [`RenderSink`]; headless runs pass `None` and take exactly the same code path.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::obstacle::Obstacle;

/// State of the game after one tick.
#[derive(Debug)]
pub struct Scene<'a> {
    /// Generation being evaluated.
    pub generation: u32,
    /// Ticks executed so far in this evaluation.
    pub tick: u64,
    /// Obstacles passed so far.
    pub score: u32,
    /// Agents still alive, in candidate order.
    pub agents: Vec<&'a Agent>,
    /// Obstacles on screen, oldest first.
    pub obstacles: &'a [Obstacle],
}

/// Consumer of per-tick scenes.
pub trait RenderSink {
    /// Receives the scene after a tick. Returning `Break` stops the evaluation.
    fn render(&mut self, scene: &Scene<'_>) -> ControlFlow<()>;
}

/// Owned copy of a [`Scene`] that can cross threads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Generation being evaluated.
    pub generation: u32,
    /// Ticks executed so far in this evaluation.
    pub tick: u64,
    /// Obstacles passed so far.
    pub score: u32,
    /// Agents still alive.
    pub agents: Vec<Agent>,
    /// Obstacles on screen.
    pub obstacles: Vec<Obstacle>,
}

impl From<&Scene<'_>> for Snapshot {
    fn from(scene: &Scene<'_>) -> Self {
        Self {
            generation: scene.generation,
            tick: scene.tick,
            score: scene.score,
            agents: scene.agents.iter().map(|agent| **agent).collect(),
            obstacles: scene.obstacles.to_vec(),
        }
    }
}

/// Publishes every scene into a shared slot and paces the tick loop.
///
/// Used by the windowed binary: the evolution thread writes, the render thread reads
/// the latest snapshot each frame. Setting the stop flag ends the current evaluation.
#[derive(Debug, Clone)]
pub struct SnapshotSink {
    latest: Arc<Mutex<Snapshot>>,
    stop: Arc<AtomicBool>,
    frame_time: Option<Duration>,
}

impl SnapshotSink {
    /// Creates a sink. `fps` of `None` disables pacing.
    pub fn new(latest: Arc<Mutex<Snapshot>>, stop: Arc<AtomicBool>, fps: Option<f32>) -> Self {
        Self {
            latest,
            stop,
            frame_time: fps.map(|fps| Duration::from_secs_f32(1.0 / fps)),
        }
    }
}

impl RenderSink for SnapshotSink {
    fn render(&mut self, scene: &Scene<'_>) -> ControlFlow<()> {
        if self.stop.load(Ordering::Relaxed) {
            return ControlFlow::Break(());
        }

        // a poisoned slot only means the reader panicked; keep publishing
        let mut latest = self
            .latest
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *latest = Snapshot::from(scene);
        drop(latest);

        if let Some(frame_time) = self.frame_time {
            std::thread::sleep(frame_time);
        }
        ControlFlow::Continue(())
    }
}

/// Sink that keeps every snapshot, handy for replays and tests.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    /// Every scene received, in order.
    pub frames: Vec<Snapshot>,
}

impl RenderSink for Recorder {
    fn render(&mut self, scene: &Scene<'_>) -> ControlFlow<()> {
        self.frames.push(Snapshot::from(scene));
        ControlFlow::Continue(())
    }
}
