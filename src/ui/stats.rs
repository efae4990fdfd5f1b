use egui_macroquad::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};
use flappy_evo::simulation::params::Params;
use flappy_evo::simulation::render::Snapshot;
use flappy_evo::simulation::reporting::Statistics;

use super::ui::UIState;

pub(super) fn draw_stats_panel(
    egui_ctx: &egui::Context,
    state: &mut UIState,
    snapshot: &Snapshot,
    statistics: &Statistics,
    params: &Params,
) {
    egui::SidePanel::right("stats_panel")
        .default_width(state.stats_panel_width)
        .resizable(true)
        .show(egui_ctx, |ui| {
            ui.heading("Evolution Stats");
            ui.separator();

            ui.horizontal(|ui| {
                let button = ui.add_enabled(!state.stop_requested, egui::Button::new("⏹ Stop"));
                if button.clicked() {
                    state.stop_requested = true;
                }
            });
            if let Some(ref msg) = state.status_message {
                ui.label(msg);
            }

            ui.separator();

            ui.label(format!("Generation: {}", snapshot.generation));
            ui.label(format!("Tick: {}", snapshot.tick));
            ui.label(format!("Score: {}/{}", snapshot.score, params.score_cap));
            ui.label(format!("Alive: {}", snapshot.agents.len()));

            ui.separator();

            if let Some(latest) = statistics.latest() {
                ui.label(format!("Last generation: {}", latest.generation));
                ui.label(format!("Best fitness: {:.2}", latest.best_fitness));
                ui.label(format!(
                    "Mean fitness: {:.2} (σ {:.2})",
                    latest.mean_fitness, latest.stdev_fitness
                ));
                ui.label(format!("Evaluation: {:.0}ms", latest.elapsed_ms));
            }
            if let Some(best) = &statistics.best_genome {
                ui.label(format!("Best ever: #{} ({:.2})", best.id, best.fitness));
            }

            ui.separator();

            ui.heading("Fitness Over Generations");
            draw_fitness_plot(ui, statistics);
        });
}

fn draw_fitness_plot(ui: &mut egui::Ui, statistics: &Statistics) {
    if statistics.generations.is_empty() {
        ui.label("Collecting data...");
        return;
    }

    let best: PlotPoints = statistics.best_fitness().into_iter().collect();
    let mean: PlotPoints = statistics.mean_fitness().into_iter().collect();

    Plot::new("fitness_plot")
        .height(200.0)
        .show_axes([true, true])
        .legend(Legend::default())
        .label_formatter(|name, value| {
            format!("{}\nGeneration: {:.0}\nFitness: {:.2}", name, value.x, value.y)
        })
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(best)
                    .color(egui::Color32::from_rgb(100, 255, 100))
                    .name("Best"),
            );
            plot_ui.line(
                Line::new(mean)
                    .color(egui::Color32::from_rgb(100, 150, 255))
                    .name("Mean"),
            );
        });
}
