//! The render-driver callback: screens, clock, match, and collaborators

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{Difficulty, GameSpeed, Settings};
use crate::game::ai::InputSource;
use crate::game::character::CharacterDefinition;
use crate::game::clock::SimulationClock;
use crate::game::round::Match;
use crate::game::screen::{Screen, ScreenEvent, ScreenMachine, Transition};
use crate::game::snapshot::{MatchSnapshot, SnapshotBuilder};
use crate::host::protocol::{GameEvent, MatchSummary};
use crate::host::{AssetProgress, Host};

/// What one `on_frame` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Screen after the frame
    pub screen: Screen,
    pub ticks: u32,
    /// Backlog dropped by the catch-up cap
    pub dropped: Duration,
}

/// One player-facing game instance
pub struct GameSession {
    settings: Arc<Settings>,
    definitions: [Arc<CharacterDefinition>; 2],
    seed: u64,
    screens: ScreenMachine,
    clock: SimulationClock,
    game: Option<Match>,
    inputs: [Box<dyn InputSource>; 2],
    snapshots: SnapshotBuilder,
    host: Host,
    assets: Arc<dyn AssetProgress>,
    /// Start a match as soon as the menu is reached
    auto_start: bool,
    matches_started: u64,
    last_summary: Option<MatchSummary>,
}

impl GameSession {
    pub fn new(
        settings: Arc<Settings>,
        definitions: [Arc<CharacterDefinition>; 2],
        seed: u64,
        inputs: [Box<dyn InputSource>; 2],
        host: Host,
        assets: Arc<dyn AssetProgress>,
    ) -> Self {
        let clock = SimulationClock::new(settings.max_catch_up_ticks, settings.speed.time_scale());
        Self {
            settings,
            definitions,
            seed,
            screens: ScreenMachine::new(),
            clock,
            game: None,
            inputs,
            snapshots: SnapshotBuilder::new(),
            host,
            assets,
            auto_start: false,
            matches_started: 0,
            last_summary: None,
        }
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn screen(&self) -> Screen {
        self.screens.current()
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// The match in progress (or just finished)
    pub fn game(&self) -> Option<&Match> {
        self.game.as_ref()
    }

    pub fn last_snapshot(&self) -> Option<&MatchSnapshot> {
        self.snapshots.last()
    }

    /// Result of the most recently finished match
    pub fn summary(&self) -> Option<MatchSummary> {
        self.last_summary.clone()
    }

    /// Swap in settings with a new game speed. Takes effect on the next frame.
    pub fn set_speed(&mut self, speed: GameSpeed) {
        self.settings = Arc::new(self.settings.with_speed(speed));
        self.clock.set_time_scale(speed.time_scale());
        info!(speed = ?speed, "Game speed changed");
    }

    /// Swap in settings with a new CPU difficulty and retune every input source
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings = Arc::new(self.settings.with_difficulty(difficulty));
        for input in self.inputs.iter_mut() {
            input.set_difficulty(difficulty);
        }
        info!(difficulty = ?difficulty, "Difficulty changed");
    }

    /// Feed a screen event; returns false if the current screen ignores it
    pub fn handle(&mut self, event: ScreenEvent) -> bool {
        match self.screens.handle(event) {
            Some(transition) => {
                self.exit_screen(transition);
                self.enter_screen(transition);
                true
            }
            None => false,
        }
    }

    /// Called once per display refresh with the real time since the last call
    pub fn on_frame(&mut self, delta: Duration) -> FrameReport {
        let mut report = FrameReport {
            screen: self.screens.current(),
            ticks: 0,
            dropped: Duration::ZERO,
        };

        match self.screens.current() {
            Screen::Loading => {
                if self.assets.loading_progress() >= 1.0 {
                    self.handle(ScreenEvent::AssetsReady);
                }
            }
            Screen::Menu => {
                if self.auto_start {
                    self.handle(ScreenEvent::StartMatch);
                }
            }
            Screen::Fighting => {
                let plan = self.clock.advance(delta);
                report.ticks = plan.ticks;
                report.dropped = plan.dropped;
                self.run_ticks(plan.ticks);
            }
            Screen::Paused | Screen::GameOver => {}
        }

        self.render();
        report.screen = self.screens.current();
        report
    }

    fn run_ticks(&mut self, ticks: u32) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        if ticks == 0 && self.snapshots.last().is_some() {
            return;
        }

        let mut events = Vec::new();
        for _ in 0..ticks {
            if game.is_over() {
                break;
            }
            let now = game.now();
            let [one, two] = game.fighters();
            let inputs = [
                self.inputs[0].next_input(one, two, now),
                self.inputs[1].next_input(two, one, now),
            ];
            events.extend(game.tick(&inputs));
        }

        for event in &events {
            if let GameEvent::Hit { effect, .. } = event {
                self.host.renderer.draw_effect(effect);
            }
            if let Some(cue) = event.sound_cue() {
                self.host.audio.play_sound(cue);
            }
        }
        for stats in game.take_finished_rounds() {
            self.host.reporter.report_round_end(stats.winner, &stats);
        }

        let finished = game.is_over();
        self.snapshots.build(game, events);

        if finished {
            self.handle(ScreenEvent::MatchFinished);
        }
    }

    /// Draw the latest snapshot. Nothing is drawn before a match exists.
    fn render(&mut self) {
        if !matches!(
            self.screens.current(),
            Screen::Fighting | Screen::Paused | Screen::GameOver
        ) {
            return;
        }
        if let Some(snapshot) = self.snapshots.last() {
            for fighter in &snapshot.fighters {
                self.host
                    .renderer
                    .draw_animation(&fighter.animation_key, fighter.x, fighter.y, fighter.facing);
            }
        }
    }

    fn exit_screen(&mut self, transition: Transition) {
        match (transition.from, transition.to) {
            // Abandoned or finished matches are dropped on the way out
            (Screen::Paused, Screen::Menu) | (Screen::GameOver, _) => {
                self.game = None;
                self.snapshots.clear();
            }
            _ => {}
        }
    }

    fn enter_screen(&mut self, transition: Transition) {
        match transition.to {
            Screen::Loading => {}
            Screen::Menu => self.host.audio.play_music("menu"),
            Screen::Fighting if transition.from == Screen::Paused => {
                self.clock.resume();
                debug!("Resumed");
            }
            Screen::Fighting => self.start_match(),
            Screen::Paused => {
                self.clock.pause();
                self.host.audio.play_sound("pause");
            }
            Screen::GameOver => {
                self.last_summary = self.game.as_ref().map(Match::summary);
                self.host.audio.play_music("victory");
            }
        }
    }

    fn start_match(&mut self) {
        let seed = self.seed.wrapping_add(self.matches_started);
        self.matches_started += 1;

        self.clock = SimulationClock::new(
            self.settings.max_catch_up_ticks,
            self.settings.speed.time_scale(),
        );
        self.snapshots.clear();
        self.game = Some(Match::new(
            Arc::clone(&self.settings),
            self.definitions.clone(),
            seed,
        ));
        self.host.audio.play_music("battle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ai::{CpuController, ScriptedInput};
    use crate::game::character::tests::test_definition;
    use crate::game::combat::AttackType;
    use crate::game::input::{Action, TickInput};
    use crate::host::{AssetTracker, RecordingHost};

    fn quick_settings() -> Settings {
        Settings {
            intro_secs: 0.0,
            round_time_secs: 1,
            rounds_to_win: 1,
            ..Settings::default()
        }
    }

    fn session_with(
        settings: Settings,
        inputs: [Box<dyn InputSource>; 2],
        assets: Arc<AssetTracker>,
    ) -> (GameSession, RecordingHost) {
        let recorder = RecordingHost::new();
        let session = GameSession::new(
            Arc::new(settings),
            [test_definition(), test_definition()],
            11,
            inputs,
            recorder.host(),
            assets,
        )
        .with_auto_start(true);
        (session, recorder)
    }

    fn idle_session(settings: Settings) -> (GameSession, RecordingHost) {
        session_with(
            settings,
            [Box::new(ScriptedInput::idle()), Box::new(ScriptedInput::idle())],
            Arc::new(AssetTracker::default()),
        )
    }

    fn step(session: &GameSession) -> Duration {
        session.clock().timestep()
    }

    /// Advance until the fighting screen is reached
    fn enter_fight(session: &mut GameSession) {
        for _ in 0..3 {
            session.on_frame(Duration::ZERO);
        }
        assert_eq!(session.screen(), Screen::Fighting);
    }

    #[test]
    fn loading_gates_the_menu() {
        let assets = Arc::new(AssetTracker::new(["tester_idle".to_string()]));
        let (mut session, recorder) = session_with(
            quick_settings(),
            [Box::new(ScriptedInput::idle()), Box::new(ScriptedInput::idle())],
            Arc::clone(&assets),
        );

        for _ in 0..5 {
            assert_eq!(session.on_frame(Duration::from_millis(16)).screen, Screen::Loading);
        }
        assert!(session.game().is_none());

        assets.mark_loaded("tester_idle");
        assert_eq!(session.on_frame(Duration::ZERO).screen, Screen::Menu);
        assert_eq!(session.on_frame(Duration::ZERO).screen, Screen::Fighting);
        assert_eq!(recorder.recorded().music, vec!["menu", "battle"]);
    }

    #[test]
    fn frames_run_whole_ticks_and_draw_both_fighters() {
        let (mut session, recorder) = idle_session(quick_settings());
        enter_fight(&mut session);
        recorder.clear();

        let report = session.on_frame(step(&session) * 3);
        assert_eq!(report.ticks, 3);

        let draws = recorder.recorded().draws;
        assert_eq!(draws, vec!["tester_idle", "tester_idle"]);
    }

    #[test]
    fn catch_up_is_capped() {
        let (mut session, _) = idle_session(quick_settings());
        enter_fight(&mut session);

        let report = session.on_frame(Duration::from_secs(1));
        assert_eq!(report.ticks, 5);
        assert!(report.dropped > Duration::ZERO);
    }

    #[test]
    fn pause_stops_ticks_without_a_burst_on_resume() {
        let (mut session, recorder) = idle_session(quick_settings());
        enter_fight(&mut session);
        session.on_frame(step(&session));
        let tick = session.game().unwrap().tick_count();

        assert!(session.handle(ScreenEvent::Pause));
        for _ in 0..10 {
            assert_eq!(session.on_frame(step(&session) * 2).ticks, 0);
        }
        assert_eq!(session.game().unwrap().tick_count(), tick);

        assert!(session.handle(ScreenEvent::Resume));
        assert_eq!(session.on_frame(step(&session)).ticks, 1);
        assert!(recorder.recorded().sounds.contains(&"pause".to_string()));
    }

    #[test]
    fn every_round_is_reported_exactly_once() {
        // Idle fighters draw every round until the round cap ends the match
        let (mut session, recorder) = idle_session(quick_settings());
        enter_fight(&mut session);

        for _ in 0..5000 {
            if session.on_frame(step(&session)).screen == Screen::GameOver {
                break;
            }
        }

        assert_eq!(session.screen(), Screen::GameOver);
        let summary = session.summary().unwrap();
        let reported = recorder.recorded().rounds;
        assert_eq!(reported.len(), summary.rounds.len());
        assert_eq!(summary.rounds.len(), 3);
        for (i, (winner, stats)) in reported.iter().enumerate() {
            assert_eq!(stats.round, i as u32 + 1);
            assert_eq!(*winner, None);
        }
        assert!(recorder.recorded().music.contains(&"victory".to_string()));
    }

    #[test]
    fn cpu_match_plays_to_completion() {
        let settings = Settings {
            round_time_secs: 5,
            ..quick_settings()
        };
        let (mut session, recorder) = session_with(
            settings,
            [
                Box::new(CpuController::new(Difficulty::Hard, 1)),
                Box::new(CpuController::new(Difficulty::Hard, 2)),
            ],
            Arc::new(AssetTracker::default()),
        );
        enter_fight(&mut session);

        for _ in 0..10_000 {
            if session.on_frame(step(&session)).screen == Screen::GameOver {
                break;
            }
        }

        assert_eq!(session.screen(), Screen::GameOver);
        let summary = session.summary().unwrap();
        assert!(!summary.rounds.is_empty());
        assert_eq!(recorder.recorded().rounds.len(), summary.rounds.len());
        assert!(!recorder.recorded().sounds.is_empty());
    }

    #[test]
    fn landed_hit_spawns_one_effect() {
        let settings = Settings {
            round_time_secs: 10,
            ..quick_settings()
        };
        // Walk into range, then a single light jab
        let script = std::iter::repeat(TickInput::with(&[Action::Right]))
            .take(100)
            .chain([TickInput::with(&[Action::Light])]);
        let (mut session, recorder) = session_with(
            settings,
            [Box::new(ScriptedInput::new(script)), Box::new(ScriptedInput::idle())],
            Arc::new(AssetTracker::default()),
        );
        enter_fight(&mut session);

        for _ in 0..130 {
            session.on_frame(step(&session));
        }

        let effects = recorder.recorded().effects;
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].attack_type, AttackType::Light);
        assert!(!effects[0].blocked);
    }

    #[test]
    fn speed_change_scales_the_clock() {
        let (mut session, _) = idle_session(quick_settings());
        enter_fight(&mut session);

        session.set_speed(GameSpeed::Slow);
        assert_eq!(session.settings().speed, GameSpeed::Slow);

        let mut ticks = 0;
        for _ in 0..10 {
            ticks += session.on_frame(step(&session)).ticks;
        }
        assert_eq!(ticks, 5);
    }

    #[test]
    fn difficulty_change_swaps_settings_mid_match() {
        let (mut session, _) = idle_session(quick_settings());
        enter_fight(&mut session);
        let before = Arc::clone(session.settings());

        session.set_difficulty(Difficulty::Hard);

        assert_eq!(session.settings().difficulty, Difficulty::Hard);
        assert_eq!(before.difficulty, Difficulty::Normal);
        assert_eq!(session.settings().speed, before.speed);
        assert!(session.on_frame(step(&session)).ticks > 0);
    }

    #[test]
    fn returning_to_menu_drops_the_match() {
        let (mut session, _) = idle_session(quick_settings());
        enter_fight(&mut session);
        session.on_frame(step(&session));

        session.handle(ScreenEvent::Pause);
        assert!(session.handle(ScreenEvent::ReturnToMenu));
        assert!(session.game().is_none());
        assert!(session.last_snapshot().is_none());
    }
}
