//! Raw input: actions, per-tick button state, and the timed input buffer

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::util::time::Millis;

/// How long a recorded input stays eligible for sequence matching
pub const INPUT_TIMEOUT_MS: Millis = 500.0;

/// A single discrete input action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Left,
    Right,
    Down,
    Jump,
    /// Light attack
    Light,
    /// Medium attack
    Medium,
    /// Heavy attack
    Heavy,
    Block,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::Left,
        Action::Right,
        Action::Down,
        Action::Jump,
        Action::Light,
        Action::Medium,
        Action::Heavy,
        Action::Block,
    ];
}

/// Recorded input. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub action: Action,
    pub timestamp: Millis,
}

/// Buttons held during one simulation tick (from a player or the CPU)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub jump: bool,
    pub light: bool,
    pub medium: bool,
    pub heavy: bool,
    pub block: bool,
}

impl TickInput {
    /// Input with only the given actions held
    pub fn with(actions: &[Action]) -> Self {
        let mut input = Self::default();
        for &action in actions {
            input.set(action, true);
        }
        input
    }

    pub fn is_held(&self, action: Action) -> bool {
        match action {
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Down => self.down,
            Action::Jump => self.jump,
            Action::Light => self.light,
            Action::Medium => self.medium,
            Action::Heavy => self.heavy,
            Action::Block => self.block,
        }
    }

    pub fn set(&mut self, action: Action, held: bool) {
        let slot = match action {
            Action::Left => &mut self.left,
            Action::Right => &mut self.right,
            Action::Down => &mut self.down,
            Action::Jump => &mut self.jump,
            Action::Light => &mut self.light,
            Action::Medium => &mut self.medium,
            Action::Heavy => &mut self.heavy,
            Action::Block => &mut self.block,
        };
        *slot = held;
    }

    /// Actions held now that were not held on the previous tick
    pub fn pressed_since(&self, previous: &TickInput) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|&a| self.is_held(a) && !previous.is_held(a))
            .collect()
    }

    /// Horizontal intent: -1 left, 1 right, 0 neither or both
    pub fn horizontal(&self) -> i8 {
        match (self.left, self.right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }
}

/// Per-character timestamped history of recent inputs.
///
/// Expiry is lazy: anything older than the timeout is purged on every
/// [`record`](Self::record) and [`recent_actions`](Self::recent_actions).
#[derive(Debug, Clone)]
pub struct InputBuffer {
    events: VecDeque<InputEvent>,
    timeout: Millis,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::with_timeout(INPUT_TIMEOUT_MS)
    }

    pub fn with_timeout(timeout: Millis) -> Self {
        Self {
            events: VecDeque::new(),
            timeout,
        }
    }

    /// Append an action pressed at `now`
    pub fn record(&mut self, action: Action, now: Millis) {
        self.purge(now);
        self.events.push_back(InputEvent {
            action,
            timestamp: now,
        });
    }

    /// Non-expired actions within `window` of `now`, oldest first.
    /// The window never extends past the buffer timeout.
    pub fn recent_actions(&mut self, now: Millis, window: Millis) -> Vec<Action> {
        self.purge(now);
        let window = window.min(self.timeout);
        self.events
            .iter()
            .filter(|e| now - e.timestamp <= window)
            .map(|e| e.action)
            .collect()
    }

    /// Drop everything, used after a special move consumes the sequence
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn timeout(&self) -> Millis {
        self.timeout
    }

    fn purge(&mut self, now: Millis) {
        while let Some(front) = self.events.front() {
            if now - front.timestamp > self.timeout {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
