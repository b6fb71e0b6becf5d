//! Fixed-timestep simulation clock

use std::time::Duration;

use tracing::warn;

use crate::util::time::{fixed_timestep, tick_to_millis, Millis};

/// What one render callback should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub ticks: u32,
    /// Backlog discarded because of the catch-up cap
    pub dropped: Duration,
}

impl TickPlan {
    const IDLE: TickPlan = TickPlan {
        ticks: 0,
        dropped: Duration::ZERO,
    };
}

/// Accumulates render-driver deltas and drains them in whole fixed steps
#[derive(Debug, Clone)]
pub struct SimulationClock {
    timestep: Duration,
    accumulator: Duration,
    time_scale: f64,
    max_catch_up: u32,
    ticks: u64,
    paused: bool,
}

impl SimulationClock {
    pub fn new(max_catch_up: u32, time_scale: f64) -> Self {
        Self::with_timestep(fixed_timestep(), max_catch_up, time_scale)
    }

    pub fn with_timestep(timestep: Duration, max_catch_up: u32, time_scale: f64) -> Self {
        Self {
            timestep,
            accumulator: Duration::ZERO,
            time_scale: sanitize_scale(time_scale),
            max_catch_up: max_catch_up.max(1),
            ticks: 0,
            paused: false,
        }
    }

    pub fn timestep(&self) -> Duration {
        self.timestep
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f64) {
        self.time_scale = sanitize_scale(time_scale);
    }

    /// Total ticks emitted since creation or the last reset
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Simulation time implied by the emitted ticks
    pub fn now(&self) -> Millis {
        tick_to_millis(self.ticks)
    }

    /// Fraction of a step sitting in the accumulator, for render interpolation
    pub fn alpha(&self) -> f64 {
        self.accumulator.as_secs_f64() / self.timestep.as_secs_f64()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop dispatching ticks; pending time is discarded
    pub fn pause(&mut self) {
        self.paused = true;
        self.accumulator = Duration::ZERO;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.ticks = 0;
        self.paused = false;
    }

    /// Feed one render-driver delta and get the number of ticks to run
    pub fn advance(&mut self, delta: Duration) -> TickPlan {
        if self.paused {
            return TickPlan::IDLE;
        }

        self.accumulator = self.accumulator.saturating_add(self.scale(delta));

        let mut ticks = 0u32;
        while self.accumulator >= self.timestep && ticks < self.max_catch_up {
            self.accumulator -= self.timestep;
            ticks += 1;
        }

        let mut dropped = Duration::ZERO;
        if self.accumulator >= self.timestep {
            dropped = self.accumulator;
            self.accumulator = Duration::ZERO;
            warn!(
                dropped_ms = dropped.as_secs_f64() * 1000.0,
                max_catch_up = self.max_catch_up,
                "Simulation fell behind, dropping backlog"
            );
        }

        self.ticks += ticks as u64;
        TickPlan { ticks, dropped }
    }

    fn scale(&self, delta: Duration) -> Duration {
        if self.time_scale == 1.0 {
            return delta;
        }
        let nanos = (delta.as_nanos() as f64 * self.time_scale).round();
        Duration::from_nanos(nanos as u64)
    }
}

fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}
