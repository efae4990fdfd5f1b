use flappy_evo::simulation::params::Params;
use flappy_evo::simulation::render::Snapshot;
use geo::Rect;
use macroquad::prelude::*;

const BARRIER_COLOR: Color = GREEN;
const AGENT_COLOR: Color = WHITE;
const HUD_FONT_SIZE: f32 = 24.0;

/// Maps game coordinates onto the window, keeping the aspect ratio.
trait ToScreen {
    type Output;
    fn to_screen(&self, params: &Params) -> Self::Output;
}

fn scale(params: &Params) -> f32 {
    let scale_x = screen_width() / params.screen_width;
    let scale_y = screen_height() / params.screen_height;
    scale_x.min(scale_y)
}

impl ToScreen for f32 {
    type Output = f32;
    fn to_screen(&self, params: &Params) -> f32 {
        self * scale(params)
    }
}

impl ToScreen for Rect<f32> {
    type Output = (f32, f32, f32, f32);
    fn to_screen(&self, params: &Params) -> (f32, f32, f32, f32) {
        let scale = scale(params);
        (
            self.min().x * scale,
            self.min().y * scale,
            self.width() * scale,
            self.height() * scale,
        )
    }
}

pub fn draw_scene(snapshot: &Snapshot, params: &Params) {
    clear_background(BLACK);

    // game area outline, visible when the window is not square
    draw_rectangle_lines(
        0.0,
        0.0,
        params.screen_width.to_screen(params),
        params.screen_height.to_screen(params),
        1.0,
        DARKGRAY,
    );

    draw_obstacles(snapshot, params);
    draw_agents(snapshot, params);
    draw_hud(snapshot, params);
}

fn draw_obstacles(snapshot: &Snapshot, params: &Params) {
    for obstacle in &snapshot.obstacles {
        for barrier in [obstacle.top_barrier(), obstacle.bottom_barrier()] {
            let (x, y, w, h) = barrier.to_screen(params);
            draw_rectangle(x, y, w, h, BARRIER_COLOR);
        }
    }
}

fn draw_agents(snapshot: &Snapshot, params: &Params) {
    for agent in &snapshot.agents {
        let (x, y, w, h) = agent.bounds().to_screen(params);
        draw_rectangle(x, y, w, h, AGENT_COLOR);
    }
}

fn draw_hud(snapshot: &Snapshot, params: &Params) {
    let right = params.screen_width.to_screen(params);

    let score = format!("Score: {}", snapshot.score);
    let size = measure_text(&score, None, HUD_FONT_SIZE as u16, 1.0);
    draw_text(
        &score,
        right - size.width - 10.0,
        10.0 + size.height,
        HUD_FONT_SIZE,
        WHITE,
    );

    let status = format!(
        "Generation: {}  Alive: {}  Tick: {}",
        snapshot.generation,
        snapshot.agents.len(),
        snapshot.tick
    );
    draw_text(&status, 10.0, 10.0 + size.height, HUD_FONT_SIZE * 0.75, GRAY);
}
