//! Game simulation modules

pub mod ai;
pub mod character;
pub mod clock;
pub mod combat;
pub mod combo;
pub mod input;
pub mod moves;
pub mod physics;
pub mod round;
pub mod screen;
pub mod snapshot;

pub use character::{Character, CharacterDefinition, CharacterStats, CombatState};
pub use clock::{SimulationClock, TickPlan};
pub use combat::{ActiveAttack, AttackType, CombatResolver, HitOutcome};
pub use combo::ComboTracker;
pub use input::{Action, InputBuffer, TickInput};
pub use moves::{EffectKind, MoveDefinition, MoveMatcher};
pub use round::{Match, RoundPhase};
pub use screen::{Screen, ScreenEvent, ScreenMachine};

use serde::{Deserialize, Serialize};

/// Which of the two combatants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}
