use egui_macroquad::egui;
use flappy_evo::simulation::params::Params;
use flappy_evo::simulation::render::Snapshot;
use flappy_evo::simulation::reporting::Statistics;

/// Generations kept for the fitness plot.
pub const MAX_HISTORY_POINTS: usize = 500;

pub struct UIState {
    pub stats_panel_width: f32,
    pub stop_requested: bool,
    pub status_message: Option<String>,
}

impl UIState {
    pub fn new() -> Self {
        Self {
            stats_panel_width: 300.0,
            stop_requested: false,
            status_message: None,
        }
    }
}

pub fn draw_ui(state: &mut UIState, snapshot: &Snapshot, statistics: &Statistics, params: &Params) {
    egui_macroquad::ui(|egui_ctx| {
        let mut visuals = egui::Visuals::dark();
        visuals.override_text_color = Some(egui::Color32::from_rgb(240, 240, 240));
        visuals.widgets.noninteractive.fg_stroke.color = egui::Color32::from_rgb(220, 220, 220);
        egui_ctx.set_visuals(visuals);

        super::stats::draw_stats_panel(egui_ctx, state, snapshot, statistics, params);
    });
}

pub fn process_egui() {
    egui_macroquad::draw();
}
