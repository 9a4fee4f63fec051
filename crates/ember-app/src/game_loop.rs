//! Fixed-timestep game loop.
//!
//! Wall-clock frame time is fed into an accumulator and drained in steps of
//! `1 / target_fps`, so the simulation advances identically whatever the
//! render rate.

use std::time::Instant;
use tracing::warn;

/// Rate used when the configured one is zero.
pub const DEFAULT_TARGET_FPS: u32 = 60;

/// Maximum frame time clamp to prevent spiral of death.
pub const MAX_FRAME_TIME: f64 = 0.25;

pub struct GameLoop {
    step: f64,
    previous_time: Instant,
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl GameLoop {
    /// Loop stepping at `target_fps` Hz.
    pub fn new(target_fps: u32) -> Self {
        let fps = if target_fps == 0 {
            DEFAULT_TARGET_FPS
        } else {
            target_fps
        };
        Self {
            step: 1.0 / f64::from(fps),
            previous_time: Instant::now(),
            accumulator: 0.0,
            total_sim_time: 0.0,
            frame_count: 0,
            update_count: 0,
        }
    }

    /// Fixed step in seconds.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Measure the time since the previous call and run the steps it covers.
    pub fn tick(&mut self, step_fn: impl FnMut(f32)) -> u32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;
        self.advance(frame_time, step_fn)
    }

    /// Run the steps covered by an explicit `frame_time`. Returns how many ran.
    pub fn advance(&mut self, frame_time: f64, mut step_fn: impl FnMut(f32)) -> u32 {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }

        self.accumulator += frame_time;
        let mut steps = 0;
        while self.accumulator >= self.step {
            step_fn(self.step as f32);
            self.total_sim_time += self.step;
            self.accumulator -= self.step;
            self.update_count += 1;
            steps += 1;
        }
        self.frame_count += 1;
        steps
    }

    /// Fraction of a step left in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / self.step
        } else {
            0.0
        }
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
        Self::new(DEFAULT_TARGET_FPS)
    }
}
