//! Fixed-timestep simulation clock.
//!
//! Orbits and the camera advance in whole 60 Hz steps whatever the display
//! rate; time left over carries into the next frame.

use std::time::Instant;
use tracing::warn;

/// Simulation step: 60 Hz.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Longest frame time credited in one go. A stall longer than this (window
/// drag, debugger) slows the animation instead of fast-forwarding it.
pub const MAX_FRAME_TIME: f64 = 0.25;

pub struct GameLoop {
    previous_time: Option<Instant>,
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl GameLoop {
    pub fn new() -> Self {
        Self {
            previous_time: None,
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        }
    }

    /// Credit the wall time since the previous call and run the fixed steps
    /// it pays for. The first call after construction or
    /// [`reset_clock`](Self::reset_clock) credits nothing.
    pub fn tick(&mut self, update_fn: impl FnMut(f32)) -> u32 {
        let now = Instant::now();
        let frame_time = self
            .previous_time
            .map_or(0.0, |previous| now.duration_since(previous).as_secs_f64());
        self.previous_time = Some(now);
        self.advance(frame_time, update_fn)
    }

    /// Credit `frame_time` seconds and call `update_fn(FIXED_DT)` once per
    /// whole step. Returns the number of steps run.
    pub fn advance(&mut self, frame_time: f64, mut update_fn: impl FnMut(f32)) -> u32 {
        let frame_time = if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            MAX_FRAME_TIME
        } else {
            frame_time.max(0.0)
        };

        self.accumulator += frame_time;
        let mut steps = 0;
        while self.accumulator >= FIXED_DT {
            update_fn(FIXED_DT as f32);
            self.total_sim_time += FIXED_DT;
            self.accumulator -= FIXED_DT;
            self.update_count += 1;
            steps += 1;
        }
        self.frame_count += 1;
        steps
    }

    /// Drop any pending time, e.g. after the window was minimized.
    pub fn reset_clock(&mut self) {
        self.previous_time = None;
        self.accumulator = 0.0;
    }

    /// Fraction of a step waiting in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> f64 {
        self.accumulator / FIXED_DT
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step() {
        let mut game_loop = GameLoop::new();
        let mut dts = Vec::new();
        assert_eq!(game_loop.advance(FIXED_DT, |dt| dts.push(dt)), 1);
        assert_eq!(dts, vec![FIXED_DT as f32]);
        assert!(game_loop.alpha().abs() < 1e-9);
    }

    #[test]
    fn test_partial_step_carries_over() {
        let mut game_loop = GameLoop::new();
        assert_eq!(game_loop.advance(0.5 * FIXED_DT, |_| {}), 0);
        assert!((game_loop.alpha() - 0.5).abs() < 1e-9);
        assert_eq!(game_loop.advance(0.5 * FIXED_DT, |_| {}), 1);
        assert_eq!(game_loop.frame_count(), 2);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut game_loop = GameLoop::new();
        let steps = game_loop.advance(1.0, |_| {});
        let max_steps = (MAX_FRAME_TIME / FIXED_DT).ceil() as u32;
        assert!(steps > 0 && steps <= max_steps, "{steps} steps");
    }

    #[test]
    fn test_negative_frame_time_is_ignored() {
        let mut game_loop = GameLoop::new();
        assert_eq!(game_loop.advance(-1.0, |_| {}), 0);
        assert_eq!(game_loop.alpha(), 0.0);
    }

    #[test]
    fn test_sim_time_tracks_steps() {
        let mut game_loop = GameLoop::new();
        for frame_time in [0.017, 0.015, 0.020, 0.016, 0.033, 0.008, 0.018] {
            game_loop.advance(frame_time, |_| {});
        }
        let expected = game_loop.update_count() as f64 * FIXED_DT;
        assert!((game_loop.total_sim_time() - expected).abs() < 1e-10);
    }

    #[test]
    fn test_first_tick_credits_nothing() {
        let mut game_loop = GameLoop::new();
        assert_eq!(game_loop.tick(|_| {}), 0);
        game_loop.advance(0.5 * FIXED_DT, |_| {});
        game_loop.reset_clock();
        assert_eq!(game_loop.tick(|_| {}), 0);
        assert_eq!(game_loop.alpha(), 0.0);
    }
}
