//! Special move definitions and input-sequence matching

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::game::input::{Action, InputBuffer, INPUT_TIMEOUT_MS};
use crate::game::physics::HitRegion;
use crate::util::time::{frames_to_millis, Millis};

/// Startup / active / recovery frame counts of an attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameData {
    pub startup: u32,
    pub active: u32,
    pub recovery: u32,
}

impl FrameData {
    pub const fn new(startup: u32, active: u32, recovery: u32) -> Self {
        Self {
            startup,
            active,
            recovery,
        }
    }

    pub fn total(&self) -> u32 {
        self.startup + self.active + self.recovery
    }

    pub fn total_ms(&self) -> Millis {
        frames_to_millis(self.total())
    }

    /// Elapsed-time range during which the attack can connect
    pub fn active_window_ms(&self) -> (Millis, Millis) {
        let start = frames_to_millis(self.startup);
        (start, start + frames_to_millis(self.active))
    }
}

/// What a special move does beyond plain damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    #[default]
    Strike,
    /// Knocks the defender into the air
    Launcher,
    /// Ignores the defender's block
    GuardBreak,
    /// Owner cannot be hit until the active window closes
    Invincible,
}

fn default_hit_region() -> HitRegion {
    HitRegion {
        offset_x: 10.0,
        offset_y: 30.0,
        width: 90.0,
        height: 60.0,
    }
}

/// Data-driven special move, shared read-only by every fighter of an archetype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveDefinition {
    pub name: String,
    /// Actions that must appear contiguously and in order
    pub sequence: Vec<Action>,
    pub energy_cost: f32,
    pub damage: f32,
    pub frames: FrameData,
    #[serde(default = "default_hit_region")]
    pub hit_region: HitRegion,
    #[serde(default)]
    pub effect: EffectKind,
}

/// Matches buffered input against a fighter's move list
pub struct MoveMatcher;

impl MoveMatcher {
    /// First move, in declaration order, whose sequence appears in the
    /// buffer and whose cost is covered by `energy_available`.
    ///
    /// The caller is responsible for deducting energy and clearing the
    /// buffer on success.
    pub fn try_match<'a>(
        buffer: &mut InputBuffer,
        now: Millis,
        moves: &'a [Arc<MoveDefinition>],
        energy_available: f32,
    ) -> Option<&'a Arc<MoveDefinition>> {
        let recent = buffer.recent_actions(now, INPUT_TIMEOUT_MS);
        Self::match_actions(&recent, moves, energy_available)
    }

    /// Matching over an already-collected action list
    pub fn match_actions<'a>(
        recent: &[Action],
        moves: &'a [Arc<MoveDefinition>],
        energy_available: f32,
    ) -> Option<&'a Arc<MoveDefinition>> {
        for definition in moves {
            if !contains_sequence(recent, &definition.sequence) {
                continue;
            }
            if energy_available < definition.energy_cost {
                trace!(
                    move_name = %definition.name,
                    energy_available,
                    cost = definition.energy_cost,
                    "Sequence matched without enough energy"
                );
                continue;
            }
            return Some(definition);
        }
        None
    }
}

/// Contiguous, in-order subsequence test. An empty sequence never matches.
fn contains_sequence(haystack: &[Action], needle: &[Action]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}
