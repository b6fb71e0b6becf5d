//! Top-level game screens as a tagged state machine.
//!
//! Transitions are data: [`TRANSITIONS`] lists every legal
//! `(from, event, to)` triple and anything else is ignored. The owner runs
//! its exit/enter hooks from the returned [`Transition`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Loading,
    Menu,
    Fighting,
    Paused,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenEvent {
    /// Asset loading reached 100%
    AssetsReady,
    StartMatch,
    Pause,
    Resume,
    MatchFinished,
    /// Leave a paused or finished match
    ReturnToMenu,
}

/// Every legal screen change
pub const TRANSITIONS: &[(Screen, ScreenEvent, Screen)] = &[
    (Screen::Loading, ScreenEvent::AssetsReady, Screen::Menu),
    (Screen::Menu, ScreenEvent::StartMatch, Screen::Fighting),
    (Screen::Fighting, ScreenEvent::Pause, Screen::Paused),
    (Screen::Paused, ScreenEvent::Resume, Screen::Fighting),
    (Screen::Paused, ScreenEvent::ReturnToMenu, Screen::Menu),
    (Screen::Fighting, ScreenEvent::MatchFinished, Screen::GameOver),
    (Screen::GameOver, ScreenEvent::ReturnToMenu, Screen::Menu),
    (Screen::GameOver, ScreenEvent::StartMatch, Screen::Fighting),
];

/// Look up the target of `event` from `from`
pub fn next_screen(from: Screen, event: ScreenEvent) -> Option<Screen> {
    TRANSITIONS
        .iter()
        .find(|(source, trigger, _)| *source == from && *trigger == event)
        .map(|&(_, _, target)| target)
}

/// A screen change that happened; hooks run exit(from) then enter(to)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Screen,
    pub event: ScreenEvent,
    pub to: Screen,
}

#[derive(Debug, Clone)]
pub struct ScreenMachine {
    current: Screen,
    transitions: u32,
}

impl ScreenMachine {
    pub fn new() -> Self {
        Self {
            current: Screen::Loading,
            transitions: 0,
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    /// Number of transitions taken so far
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Only the fighting screen dispatches simulation ticks
    pub fn is_simulating(&self) -> bool {
        self.current == Screen::Fighting
    }

    /// Apply `event`. Events with no entry in the table are ignored.
    pub fn handle(&mut self, event: ScreenEvent) -> Option<Transition> {
        let Some(to) = next_screen(self.current, event) else {
            debug!(screen = ?self.current, event = ?event, "Ignoring screen event");
            return None;
        };

        let transition = Transition {
            from: self.current,
            event,
            to,
        };
        self.current = to;
        self.transitions += 1;

        info!(from = ?transition.from, to = ?transition.to, "Screen changed");
        Some(transition)
    }
}

impl Default for ScreenMachine {
    fn default() -> Self {
        Self::new()
    }
}
