//! Collaborator seams.
//!
//! The core never draws, plays audio, or loads files itself. It talks to
//! these narrow traits, fire-and-forget, after each frame's ticks have run.

pub mod assets;
pub mod headless;
pub mod protocol;
pub mod recording;

pub use assets::{load_assets, AssetTracker};
pub use headless::{LoggingReporter, TracingAudio, TracingRenderer};
pub use protocol::{FighterSnapshot, FighterStats, GameEvent, MatchSummary, RoundStats};
pub use recording::RecordingHost;

use crate::game::combat::HitEffect;
use crate::game::Side;

/// Draws animation frames by key
pub trait Renderer {
    /// Draw the current frame of `key` with the feet at (x, y).
    /// Keys whose assets are not loaded yet must be a no-op.
    fn draw_animation(&mut self, key: &str, x: f32, y: f32, facing: i8);

    /// Spawn a one-shot hit or block effect. Called once per resolved hit.
    fn draw_effect(&mut self, _effect: &HitEffect) {}
}

/// Plays audio by key
pub trait AudioSink {
    fn play_sound(&mut self, key: &str);
    fn play_music(&mut self, track: &str);
}

/// Receives each finished round exactly once
pub trait RoundReporter {
    fn report_round_end(&mut self, winner: Option<Side>, stats: &RoundStats);
}

/// Asset loading state, polled only to gate the start of a match
pub trait AssetProgress: Send + Sync {
    /// Ratio in [0, 1]
    fn loading_progress(&self) -> f32;

    fn is_loaded(&self, _key: &str) -> bool {
        true
    }
}

/// The collaborators a session talks to
pub struct Host {
    pub renderer: Box<dyn Renderer>,
    pub audio: Box<dyn AudioSink>,
    pub reporter: Box<dyn RoundReporter>,
}
