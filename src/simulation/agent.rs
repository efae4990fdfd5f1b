//! The controlled avatar of one candidate.

use geo::{Rect, coord};
use serde::{Deserialize, Serialize};

use super::params::Params;

/// Kinematic state of one agent.
///
/// `x` never changes; obstacles scroll past instead. The y axis grows downward, so a
/// negative velocity moves the agent up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Fixed horizontal position (left edge).
    pub x: f32,
    /// Vertical position (top edge).
    pub y: f32,
    /// Vertical velocity, added to `y` every tick.
    pub velocity: f32,
    /// Side of the square bounding box.
    pub size: f32,
}

impl Agent {
    /// Creates a resting agent at the given position.
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            x,
            y,
            velocity: 0.0,
            size,
        }
    }

    /// Creates a resting agent at the configured start position.
    pub fn at_start(params: &Params) -> Self {
        Self::new(params.agent_start_x, params.agent_start_y, params.agent_size)
    }

    /// Applies the upward impulse.
    pub fn jump(&mut self, params: &Params) {
        self.velocity = params.jump_velocity;
    }

    /// Integrates gravity for one tick.
    ///
    /// Reaching the top of the screen pins the agent there and cancels its velocity.
    pub fn advance(&mut self, params: &Params) {
        self.velocity += params.gravity;
        self.y += self.velocity;
        if self.y <= 0.0 {
            self.y = 0.0;
            self.velocity = 0.0;
        }
    }

    /// Whether the agent has dropped out of the bottom of the screen.
    pub fn is_below_screen(&self, params: &Params) -> bool {
        self.y > params.screen_height - self.size
    }

    /// Axis-aligned bounding box at the current position.
    pub fn bounds(&self) -> Rect<f32> {
        Rect::new(
            coord! { x: self.x, y: self.y },
            coord! { x: self.x + self.size, y: self.y + self.size },
        )
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn jump_sets_velocity() {
        let params = Params::default();
        let mut agent = Agent::at_start(&params);
        agent.velocity = 7.0;
        agent.jump(&params);
        assert_eq!(agent.velocity, params.jump_velocity);
    }

    #[test]
    fn advance_applies_gravity_then_velocity() {
        let params = Params::default();
        let mut agent = Agent::new(100.0, 100.0, 32.0);

        agent.advance(&params);
        assert_eq!(agent.velocity, 1.0);
        assert_eq!(agent.y, 101.0);

        agent.advance(&params);
        assert_eq!(agent.velocity, 2.0);
        assert_eq!(agent.y, 103.0);
    }

    #[test]
    fn advance_clamps_at_top() {
        let params = Params::default();
        let mut agent = Agent::new(100.0, 1.0, 32.0);
        agent.jump(&params);

        agent.advance(&params);

        assert_eq!(agent.y, 0.0);
        assert_eq!(agent.velocity, 0.0);
    }

    #[test]
    fn always_jumping_stays_pinned_to_top() {
        let params = Params::default();
        let mut agent = Agent::at_start(&params);

        for _ in 0..200 {
            agent.advance(&params);
            agent.jump(&params);
            assert!(agent.y >= 0.0);
        }

        agent.advance(&params);
        assert_eq!(agent.y, 0.0);
        assert_eq!(agent.velocity, 0.0);
    }

    #[test]
    fn bounds_follow_position() {
        let mut agent = Agent::new(100.0, 50.0, 32.0);
        agent.y = 60.0;
        let bounds = agent.bounds();
        assert_eq!(bounds.min().y, 60.0);
        assert_eq!(bounds.max().y, 92.0);
        assert_eq!(bounds.min().x, 100.0);
        assert_eq!(bounds.max().x, 132.0);
    }

    #[test]
    fn below_screen_is_strict() {
        let params = Params::default();
        let mut agent = Agent::new(100.0, 468.0, 32.0);
        assert!(!agent.is_below_screen(&params));
        agent.y = 468.5;
        assert!(agent.is_below_screen(&params));
    }
}
