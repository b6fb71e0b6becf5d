//! In-memory collaborators that record every call

use std::sync::Arc;

use parking_lot::Mutex;

use super::{AudioSink, Host, Renderer, RoundReporter};
use crate::game::combat::HitEffect;
use crate::game::Side;
use crate::host::protocol::RoundStats;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorded {
    /// Animation keys in draw order
    pub draws: Vec<String>,
    pub effects: Vec<HitEffect>,
    pub sounds: Vec<String>,
    pub music: Vec<String>,
    pub rounds: Vec<(Option<Side>, RoundStats)>,
}

/// Hands out renderer, audio, and reporter handles sharing one log
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: Arc<Mutex<Recorded>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boxed collaborators writing into this recorder
    pub fn host(&self) -> Host {
        Host {
            renderer: Box::new(self.clone()),
            audio: Box::new(self.clone()),
            reporter: Box::new(self.clone()),
        }
    }

    pub fn recorded(&self) -> Recorded {
        self.log.lock().clone()
    }

    pub fn clear(&self) {
        *self.log.lock() = Recorded::default();
    }
}

impl Renderer for RecordingHost {
    fn draw_animation(&mut self, key: &str, _x: f32, _y: f32, _facing: i8) {
        self.log.lock().draws.push(key.to_string());
    }

    fn draw_effect(&mut self, effect: &HitEffect) {
        self.log.lock().effects.push(*effect);
    }
}

impl AudioSink for RecordingHost {
    fn play_sound(&mut self, key: &str) {
        self.log.lock().sounds.push(key.to_string());
    }

    fn play_music(&mut self, track: &str) {
        self.log.lock().music.push(track.to_string());
    }
}

impl RoundReporter for RecordingHost {
    fn report_round_end(&mut self, winner: Option<Side>, stats: &RoundStats) {
        self.log.lock().rounds.push((winner, stats.clone()));
    }
}
