//! Headless collaborators that write to the tracing log

use std::sync::Arc;

use tracing::{debug, info, trace};

use super::{AssetProgress, AudioSink, Renderer, RoundReporter};
use crate::game::combat::HitEffect;
use crate::game::Side;
use crate::host::protocol::RoundStats;

/// Logs draws at trace level; skips keys whose assets are not loaded
pub struct TracingRenderer {
    assets: Arc<dyn AssetProgress>,
    drawn: u64,
    skipped: u64,
}

impl TracingRenderer {
    pub fn new(assets: Arc<dyn AssetProgress>) -> Self {
        Self {
            assets,
            drawn: 0,
            skipped: 0,
        }
    }

    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Renderer for TracingRenderer {
    fn draw_animation(&mut self, key: &str, x: f32, y: f32, facing: i8) {
        if !self.assets.is_loaded(key) {
            self.skipped += 1;
            return;
        }
        self.drawn += 1;
        trace!(key, x, y, facing, "Draw");
    }

    fn draw_effect(&mut self, effect: &HitEffect) {
        trace!(
            x = effect.x,
            y = effect.y,
            attack = effect.attack_type.as_str(),
            blocked = effect.blocked,
            "Hit effect"
        );
    }
}

#[derive(Debug, Default)]
pub struct TracingAudio {
    current_track: Option<String>,
}

impl TracingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_track(&self) -> Option<&str> {
        self.current_track.as_deref()
    }
}

impl AudioSink for TracingAudio {
    fn play_sound(&mut self, key: &str) {
        debug!(sound = key, "Play sound");
    }

    fn play_music(&mut self, track: &str) {
        if self.current_track.as_deref() == Some(track) {
            return;
        }
        info!(track, "Play music");
        self.current_track = Some(track.to_string());
    }
}

#[derive(Debug, Default)]
pub struct LoggingReporter {
    reported: u32,
}

impl LoggingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reported(&self) -> u32 {
        self.reported
    }
}

impl RoundReporter for LoggingReporter {
    fn report_round_end(&mut self, winner: Option<Side>, stats: &RoundStats) {
        self.reported += 1;
        let [one, two] = &stats.fighters;
        info!(
            match_id = %stats.match_id,
            round = stats.round,
            winner = ?winner,
            reason = ?stats.reason,
            duration_ms = stats.duration_ms,
            one_damage = one.damage_dealt,
            two_damage = two.damage_dealt,
            one_health = stats.final_health[0],
            two_health = stats.final_health[1],
            "Round result"
        );
    }
}
