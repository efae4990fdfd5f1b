//! Scrolling obstacles: a top and a bottom barrier with a gap between them.

use geo::{Intersects, Rect, coord};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::params::Params;

/// One pair of barriers.
///
/// The top barrier spans `[0, gap_top]` and the bottom one `[gap_bottom, screen_height]`,
/// both `width` wide starting at `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Leading (left) edge.
    pub x: f32,
    /// Lower edge of the top barrier.
    pub gap_top: f32,
    /// Upper edge of the bottom barrier. Always `gap_top + gap_size`.
    pub gap_bottom: f32,
    /// Width of both barriers.
    pub width: f32,
    /// Set once an agent has moved past the leading edge.
    pub passed: bool,
    gap_size: f32,
    screen_height: f32,
}

impl Obstacle {
    /// Creates an obstacle just off the right edge of the screen with a random gap.
    pub fn new<R: Rng>(params: &Params, rng: &mut R) -> Self {
        let mut obstacle = Self {
            x: params.screen_width,
            gap_top: 0.0,
            gap_bottom: 0.0,
            width: params.obstacle_width,
            passed: false,
            gap_size: params.gap_size,
            screen_height: params.screen_height,
        };
        obstacle.regenerate_gap(params, rng);
        obstacle
    }

    /// Creates an obstacle with a known gap, mostly useful for tests and replays.
    pub fn with_gap(params: &Params, x: f32, gap_top: f32) -> Self {
        Self {
            x,
            gap_top,
            gap_bottom: gap_top + params.gap_size,
            width: params.obstacle_width,
            passed: false,
            gap_size: params.gap_size,
            screen_height: params.screen_height,
        }
    }

    /// Draws a new gap position uniformly from [`Params::gap_range`].
    ///
    /// Positions are whole pixels, which keeps `gap_bottom - gap_top` exact.
    pub fn regenerate_gap<R: Rng>(&mut self, params: &Params, rng: &mut R) {
        let (low, high) = params.gap_range();
        self.gap_top = rng.random_range(low.ceil() as i32..high.ceil() as i32) as f32;
        self.gap_bottom = self.gap_top + self.gap_size;
    }

    /// Scrolls the obstacle one tick to the left.
    pub fn advance(&mut self, params: &Params) {
        self.x -= params.obstacle_speed;
    }

    /// Right edge of both barriers.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Whether the obstacle has fully left the screen on the left side.
    pub fn is_off_screen(&self) -> bool {
        self.right() < 0.0
    }

    /// Bounding box of the upper barrier.
    pub fn top_barrier(&self) -> Rect<f32> {
        Rect::new(
            coord! { x: self.x, y: 0.0 },
            coord! { x: self.right(), y: self.gap_top },
        )
    }

    /// Bounding box of the lower barrier.
    pub fn bottom_barrier(&self) -> Rect<f32> {
        Rect::new(
            coord! { x: self.x, y: self.gap_bottom },
            coord! { x: self.right(), y: self.screen_height },
        )
    }

    /// Whether the agent touches either barrier. Touching edges count.
    pub fn overlaps(&self, agent: &Agent) -> bool {
        let bounds = agent.bounds();
        self.top_barrier().intersects(&bounds) || self.bottom_barrier().intersects(&bounds)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn new_obstacle_starts_off_screen_with_valid_gap() {
        let params = Params::default();
        let mut rng = StdRng::seed_from_u64(7);
        let (low, high) = params.gap_range();

        for _ in 0..500 {
            let obstacle = Obstacle::new(&params, &mut rng);
            assert_eq!(obstacle.x, params.screen_width);
            assert!(obstacle.gap_top >= low && obstacle.gap_top < high);
            assert_eq!(obstacle.gap_bottom - obstacle.gap_top, params.gap_size);
            assert!(!obstacle.passed);
        }
    }

    #[test]
    fn advance_moves_both_barriers() {
        let params = Params::default();
        let mut obstacle = Obstacle::with_gap(&params, 200.0, 100.0);
        obstacle.advance(&params);

        assert_eq!(obstacle.x, 199.0);
        assert_eq!(obstacle.top_barrier().min().x, 199.0);
        assert_eq!(obstacle.bottom_barrier().max().x, 231.0);
        assert_eq!(obstacle.gap_bottom - obstacle.gap_top, params.gap_size);
    }

    #[test]
    fn agent_inside_gap_does_not_overlap() {
        let params = Params::default();
        let obstacle = Obstacle::with_gap(&params, 100.0, 100.0);
        let agent = Agent::new(100.0, 116.0, 32.0);
        assert!(!obstacle.overlaps(&agent));
    }

    #[test]
    fn agent_hitting_top_barrier_overlaps() {
        let params = Params::default();
        let obstacle = Obstacle::with_gap(&params, 100.0, 100.0);
        let agent = Agent::new(100.0, 90.0, 32.0);
        assert!(obstacle.overlaps(&agent));
    }

    #[test]
    fn agent_hitting_bottom_barrier_overlaps() {
        let params = Params::default();
        let obstacle = Obstacle::with_gap(&params, 100.0, 100.0);
        let agent = Agent::new(100.0, 140.0, 32.0);
        assert!(obstacle.overlaps(&agent));
    }

    #[test]
    fn touching_edges_count_as_overlap() {
        let params = Params::default();
        let obstacle = Obstacle::with_gap(&params, 100.0, 100.0);

        // agent top edge exactly on the top barrier's lower edge
        assert!(obstacle.overlaps(&Agent::new(100.0, 100.0, 32.0)));
        // agent bottom edge exactly on the bottom barrier's upper edge
        assert!(obstacle.overlaps(&Agent::new(100.0, 132.0, 32.0)));
        // agent right edge exactly on the leading edge, far from the gap
        assert!(obstacle.overlaps(&Agent::new(68.0, 10.0, 32.0)));
        // one unit short of the leading edge
        assert!(!obstacle.overlaps(&Agent::new(67.0, 10.0, 32.0)));
    }

    #[test]
    fn overlaps_is_idempotent() {
        let params = Params::default();
        let obstacle = Obstacle::with_gap(&params, 100.0, 100.0);
        let agent = Agent::new(90.0, 95.0, 32.0);
        let first = obstacle.overlaps(&agent);
        assert_eq!(first, obstacle.overlaps(&agent));
    }

    #[test]
    fn off_screen_once_right_edge_passes_zero() {
        let params = Params::default();
        let mut obstacle = Obstacle::with_gap(&params, -32.0, 100.0);
        assert!(!obstacle.is_off_screen());
        obstacle.advance(&params);
        assert!(obstacle.is_off_screen());
    }
}
