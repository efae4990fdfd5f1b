#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::fs;
use std::path::PathBuf;

use flappy_evo::simulation::brain::Brain;
use flappy_evo::simulation::evaluator::fitness_fn;
use flappy_evo::simulation::evolution::{Checkpoint, NeuroEvolution, Population};
use flappy_evo::simulation::params::{Config, EvolutionParams, Params};
use flappy_evo::simulation::reporting::{Checkpointer, StatisticsReporter};

fn create_test_params() -> EvolutionParams {
    EvolutionParams {
        population_size: 16,
        hidden_layers: vec![4],
        fitness_threshold: None,
        seed: Some(2024),
        ..EvolutionParams::default()
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("flappy-evo-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_engine_with_game_fitness() {
    let params = Params {
        seed: Some(11),
        ..Params::default()
    };
    let mut engine = NeuroEvolution::new(create_test_params()).unwrap();
    let statistics = StatisticsReporter::new(10);
    let history = statistics.handle();
    engine.add_reporter(statistics);

    let best = engine
        .run(fitness_fn(&params, None), 3)
        .unwrap()
        .unwrap();

    assert_eq!(engine.generation(), 3);
    assert_eq!(engine.genomes().len(), 16);

    let history = history.lock().unwrap();
    assert_eq!(history.generations.len(), 3);
    for stats in &history.generations {
        assert_eq!(stats.population_size, 16);
        assert!(stats.best_fitness >= stats.mean_fitness);
        // everyone survives at least one tick
        assert!(stats.best_fitness >= params.survival_reward - params.crash_penalty - 1e-9);
    }
    let best_seen = history
        .best_fitness()
        .iter()
        .map(|point| point[1])
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(best.fitness, best_seen);
}

#[test]
fn test_same_seeds_same_run() {
    let params = Params {
        seed: Some(5),
        ..Params::default()
    };

    let run = || {
        let mut engine = NeuroEvolution::new(create_test_params()).unwrap();
        let best = engine.run(fitness_fn(&params, None), 2).unwrap();
        (best, engine.genomes().to_vec())
    };

    assert_eq!(run(), run());
}

#[test]
fn test_resumed_run_matches_uninterrupted_run() {
    let params = Params {
        seed: Some(5),
        ..Params::default()
    };

    let mut full = NeuroEvolution::new(create_test_params()).unwrap();
    let full_best = full.run(fitness_fn(&params, None), 4).unwrap();

    let mut first = NeuroEvolution::new(create_test_params()).unwrap();
    first.run(fitness_fn(&params, None), 2).unwrap();
    let mut resumed = NeuroEvolution::restore(first.checkpoint(), create_test_params()).unwrap();
    let resumed_best = resumed.run(fitness_fn(&params, None), 2).unwrap();

    assert_eq!(resumed.generation(), full.generation());
    assert_eq!(resumed.genomes(), full.genomes());
    assert_eq!(resumed_best, full_best);
}

#[test]
fn test_checkpoint_save_and_resume() {
    let dir = scratch_dir("checkpoint");
    let params = Params {
        seed: Some(3),
        ..Params::default()
    };

    let mut engine = NeuroEvolution::new(create_test_params()).unwrap();
    engine.add_reporter(Checkpointer::new(2, &dir));
    engine.run(fitness_fn(&params, None), 4).unwrap();

    // generations 2 and 4 are written, nothing in between
    assert!(dir.join("checkpoint-2.json").exists());
    assert!(!dir.join("checkpoint-3.json").exists());
    let checkpoint = Checkpoint::load_from_file(dir.join("checkpoint-4.json")).unwrap();
    assert_eq!(checkpoint.generation, 4);
    assert_eq!(checkpoint.genomes.len(), engine.genomes().len());
    for (saved, live) in checkpoint.genomes.iter().zip(engine.genomes()) {
        assert_eq!(saved.id, live.id);
        assert!(Brain::distance(&saved.brain, &live.brain) < 1e-4);
    }

    let mut resumed = NeuroEvolution::restore(checkpoint, create_test_params()).unwrap();
    assert_eq!(resumed.generation(), 4);
    assert_eq!(
        resumed.best().map(|genome| genome.id),
        engine.best().map(|genome| genome.id)
    );

    let stats = resumed
        .evaluate(fitness_fn(&params, None))
        .unwrap()
        .unwrap();
    assert_eq!(stats.generation, 4);
    assert_eq!(resumed.generation(), 5);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_config_save_and_load() {
    let dir = scratch_dir("config");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");

    let config = Config {
        simulation: Params {
            score_cap: 42,
            seed: Some(9),
            ..Params::default()
        },
        evolution: create_test_params(),
    };
    config.save_to_file(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();

    assert_eq!(loaded, config);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_invalid_config_is_rejected_on_load() {
    let dir = scratch_dir("invalid");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    fs::write(&path, r#"{"simulation": {"gap_size": 1000.0}}"#).unwrap();

    assert!(Config::load_from_file(&path).is_err());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_shipped_config_is_valid() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/flappy.json");
    let config = Config::load_from_file(path).unwrap();
    assert_eq!(config.simulation, Params::default());
    assert_eq!(config.evolution.layer_sizes(), vec![3, 6, 1]);
}
