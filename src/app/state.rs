//! Application state assembled at startup

use std::sync::Arc;

use tracing::info;

use crate::app::session::GameSession;
use crate::config::Config;
use crate::game::ai::CpuController;
use crate::game::character::CharacterDefinition;
use crate::host::{AssetTracker, Host, LoggingReporter, TracingAudio, TracingRenderer};
use crate::store::roster::animation_keys;
use crate::store::{Roster, RosterError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub roster: Arc<Roster>,
    /// Side one, side two
    pub fighters: [Arc<CharacterDefinition>; 2],
    pub assets: Arc<AssetTracker>,
}

impl AppState {
    /// Load and validate the roster. Fails before any match can start.
    pub fn new(config: Config) -> Result<Self, RosterError> {
        let config = Arc::new(config);

        let roster = match &config.roster_path {
            Some(path) => Roster::load(path)?,
            None => Roster::builtin()?,
        };

        let fighters = [
            roster.resolve(config.player_one.as_deref(), 0)?,
            roster.resolve(config.player_two.as_deref(), 1)?,
        ];

        // Only the two selected characters need their animations
        let mut keys = animation_keys(&fighters[0]);
        keys.extend(animation_keys(&fighters[1]));
        let assets = Arc::new(AssetTracker::new(keys));

        info!(
            characters = roster.len(),
            one = %fighters[0].display_name,
            two = %fighters[1].display_name,
            assets = assets.total(),
            "Roster ready"
        );

        Ok(Self {
            config,
            roster: Arc::new(roster),
            fighters,
            assets,
        })
    }

    /// Headless CPU-versus-CPU session with tracing collaborators
    pub fn build_session(&self, seed: u64) -> GameSession {
        let settings = Arc::new(self.config.settings.clone());
        let difficulty = settings.difficulty;

        let host = Host {
            renderer: Box::new(TracingRenderer::new(self.assets.clone())),
            audio: Box::new(TracingAudio::new()),
            reporter: Box::new(LoggingReporter::new()),
        };

        GameSession::new(
            settings,
            self.fighters.clone(),
            seed,
            [
                Box::new(CpuController::new(difficulty, seed)),
                Box::new(CpuController::new(difficulty, seed.wrapping_add(1))),
            ],
            host,
            self.assets.clone(),
        )
        .with_auto_start(true)
    }
}
