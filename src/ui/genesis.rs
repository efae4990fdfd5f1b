use egui_macroquad::egui;
use flappy_evo::simulation::params::Config;
use macroquad::prelude::*;

/// Configuration screen shown before evolution starts. Returns `true` once the
/// user asks to start.
pub fn draw_genesis_screen(config: &mut Config, status: Option<&str>) -> bool {
    clear_background(BLACK);

    let mut start_evolution = false;

    egui_macroquad::ui(|egui_ctx| {
        egui::CentralPanel::default().show(egui_ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Flappy Evo - Configuration");
                ui.add_space(10.0);

                let sim = &mut config.simulation;
                ui.collapsing("Physics", |ui| {
                    ui.add(egui::Slider::new(&mut sim.gravity, 0.1..=5.0).text("Gravity"));
                    ui.add(
                        egui::Slider::new(&mut sim.jump_velocity, -20.0..=-0.5)
                            .text("Jump Velocity"),
                    );
                    ui.add(egui::Slider::new(&mut sim.agent_size, 4.0..=64.0).text("Agent Size"));
                });

                ui.collapsing("Obstacles", |ui| {
                    ui.add(egui::Slider::new(&mut sim.gap_size, 32.0..=256.0).text("Gap Size"));
                    ui.add(
                        egui::Slider::new(&mut sim.obstacle_width, 8.0..=128.0)
                            .text("Obstacle Width"),
                    );
                    ui.add(
                        egui::Slider::new(&mut sim.obstacle_speed, 0.5..=10.0)
                            .text("Obstacle Speed"),
                    );
                });

                ui.collapsing("Scoring", |ui| {
                    ui.add(
                        egui::Slider::new(&mut sim.survival_reward, 0.01..=1.0)
                            .text("Survival Reward"),
                    );
                    ui.add(
                        egui::Slider::new(&mut sim.crash_penalty, 0.0..=100.0)
                            .text("Crash Penalty"),
                    );
                    ui.add(egui::Slider::new(&mut sim.score_cap, 1..=1000).text("Score Cap"));
                    ui.add(
                        egui::Slider::new(&mut sim.fps, 30.0..=2000.0)
                            .text("Ticks per Second")
                            .logarithmic(true),
                    );
                });

                let evo = &mut config.evolution;
                ui.collapsing("Evolution", |ui| {
                    ui.add(
                        egui::Slider::new(&mut evo.population_size, 2..=500).text("Population"),
                    );
                    ui.add(egui::Slider::new(&mut evo.elitism, 0..=20).text("Elitism"));
                    ui.add(
                        egui::Slider::new(&mut evo.survival_threshold, 0.05..=1.0)
                            .text("Survival Threshold"),
                    );
                    ui.add(
                        egui::Slider::new(&mut evo.crossover_rate, 0.0..=1.0)
                            .text("Crossover Rate"),
                    );
                    ui.add(
                        egui::Slider::new(&mut evo.mutation_scale, 0.001..=1.0)
                            .text("Mutation Scale")
                            .logarithmic(true),
                    );
                });

                ui.add_space(20.0);
                ui.separator();
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    if ui.button("Start Evolution").clicked() {
                        start_evolution = true;
                    }
                    ui.label("Configure parameters above, then click to start");
                });
                if let Some(status) = status {
                    ui.colored_label(egui::Color32::from_rgb(255, 120, 120), status);
                }
            });
        });
    });

    egui_macroquad::draw();

    start_evolution
}
