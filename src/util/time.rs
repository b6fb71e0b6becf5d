//! Time utilities for game simulation
//!
//! Simulation logic never reads a clock. "Now" is always derived from the
//! tick counter and passed in as a [`Millis`] value.

use std::time::Duration;

/// Simulation time in milliseconds since the start of a round
pub type Millis = f64;

/// Tick rate configuration
pub const TICK_RATE: u32 = 60; // 60 ticks per second
pub const TICK_DURATION_NANOS: u64 = 1_000_000_000 / TICK_RATE as u64;

/// Length of one simulation tick in milliseconds
pub const FRAME_MS: Millis = 1000.0 / TICK_RATE as f64;

/// Fixed simulation step as a `Duration`
pub fn fixed_timestep() -> Duration {
    Duration::from_nanos(TICK_DURATION_NANOS)
}

/// Calculate delta time for physics (in seconds)
pub fn tick_delta() -> f32 {
    1.0 / TICK_RATE as f32
}

/// Simulation time at the start of the given tick
pub fn tick_to_millis(tick: u64) -> Millis {
    tick as f64 * FRAME_MS
}

/// Convert an animation frame count to milliseconds
pub fn frames_to_millis(frames: u32) -> Millis {
    frames as f64 * FRAME_MS
}

/// Convert seconds to whole ticks, rounding up
pub fn secs_to_ticks(secs: f32) -> u64 {
    (secs.max(0.0) as f64 * TICK_RATE as f64).ceil() as u64
}
