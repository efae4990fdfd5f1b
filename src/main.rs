use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use anyhow::Result;
use clap::Parser;
use macroquad::prelude::*;
use tracing::{error, info};

use flappy_evo::cli::{Cli, init_tracing};
use flappy_evo::simulation::error::SimResult;
use flappy_evo::simulation::evaluator::fitness_fn;
use flappy_evo::simulation::evolution::Genome;
use flappy_evo::simulation::render::{RenderSink, Snapshot, SnapshotSink};
use flappy_evo::simulation::reporting::StatisticsReporter;

mod graphics;
mod ui;

type Worker = JoinHandle<SimResult<Option<Genome>>>;

#[macroquad::main("Flappy Evo")]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!("{err:#}");
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = cli.load_config()?;
    prevent_quit();

    // configuration screen
    let mut status: Option<String> = None;
    loop {
        if is_quit_requested() || is_key_pressed(KeyCode::Escape) {
            return Ok(());
        }
        if ui::draw_genesis_screen(&mut config, status.as_deref()) {
            match config.validate() {
                Ok(()) => break,
                Err(err) => status = Some(err.to_string()),
            }
        }
        next_frame().await;
    }

    let mut engine = cli.build_engine(&config)?;
    let statistics = StatisticsReporter::new(ui::MAX_HISTORY_POINTS);
    let history = statistics.handle();
    engine.add_reporter(statistics);

    let latest = Arc::new(Mutex::new(Snapshot::default()));
    let stop = Arc::new(AtomicBool::new(false));
    let mut sink = SnapshotSink::new(
        Arc::clone(&latest),
        Arc::clone(&stop),
        Some(config.simulation.fps),
    );

    let simulation = config.simulation.clone();
    let generations = cli.generations;
    info!(
        population = config.evolution.population_size,
        seed = engine.seed(),
        "Starting evolution",
    );
    let mut worker: Option<Worker> = Some(thread::spawn(move || {
        engine.run(
            fitness_fn(&simulation, Some(&mut sink as &mut dyn RenderSink)),
            generations,
        )
    }));

    let mut ui_state = ui::UIState::new();
    let mut exit_requested = false;
    loop {
        if is_quit_requested() || is_key_pressed(KeyCode::Escape) {
            exit_requested = true;
        }
        if exit_requested || ui_state.stop_requested {
            stop.store(true, Ordering::Relaxed);
        }

        if let Some(handle) = worker.take_if(|handle| handle.is_finished()) {
            ui_state.status_message = Some(finish(handle));
            ui_state.stop_requested = true;
        }
        if exit_requested && worker.is_none() {
            break;
        }

        let snapshot = latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        graphics::draw_scene(&snapshot, &config.simulation);
        {
            let statistics = history.lock().unwrap_or_else(PoisonError::into_inner);
            ui::draw_ui(&mut ui_state, &snapshot, &statistics, &config.simulation);
        }
        ui::process_egui();

        next_frame().await;
    }

    Ok(())
}

/// Joins the evolution thread and describes how it ended.
fn finish(handle: Worker) -> String {
    match handle.join() {
        Ok(Ok(Some(best))) => {
            info!(id = best.id, fitness = best.fitness, "Evolution finished");
            format!("Finished. Best genome #{} ({:.2})", best.id, best.fitness)
        }
        Ok(Ok(None)) => "Stopped before any generation completed".to_string(),
        Ok(Err(err)) => {
            error!("Evolution failed: {err}");
            format!("Evolution failed: {err}")
        }
        Err(_) => {
            error!("Evolution thread panicked");
            "Evolution thread panicked".to_string()
        }
    }
}
