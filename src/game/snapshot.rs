//! Read-only post-tick views handed to the render and audio collaborators

use serde::{Deserialize, Serialize};

use crate::game::character::Character;
use crate::game::round::{Match, RoundPhase};
use crate::host::protocol::{FighterSnapshot, GameEvent};

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub tick: u64,
    pub round: u32,
    pub phase: RoundPhase,
    pub time_remaining_secs: u32,
    pub wins: [u32; 2],
    pub fighters: [FighterSnapshot; 2],
    /// Events from every tick run since the previous snapshot
    pub events: Vec<GameEvent>,
}

/// Animation key for the fighter's current state
pub fn animation_key(fighter: &Character) -> String {
    format!("{}_{}", fighter.definition.id, fighter.state().key())
}

impl FighterSnapshot {
    pub fn capture(fighter: &Character) -> Self {
        Self {
            side: fighter.side,
            character_id: fighter.definition.id.clone(),
            x: fighter.position.x,
            y: fighter.position.y,
            facing: fighter.facing,
            health: fighter.health(),
            energy: fighter.energy(),
            state: fighter.state().key(),
            animation_key: animation_key(fighter),
            combo: fighter.combo_count,
            grounded: fighter.grounded,
        }
    }
}

/// Builds snapshots and keeps the latest one for frames that run no ticks
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    last: Option<MatchSnapshot>,
    built: u64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the match after this frame's ticks
    pub fn build(&mut self, game: &Match, events: Vec<GameEvent>) -> &MatchSnapshot {
        let [one, two] = game.fighters();
        let snapshot = MatchSnapshot {
            tick: game.tick_count(),
            round: game.round(),
            phase: game.phase(),
            time_remaining_secs: game.time_remaining_secs(),
            wins: game.wins(),
            fighters: [FighterSnapshot::capture(one), FighterSnapshot::capture(two)],
            events,
        };
        self.built += 1;
        self.last.insert(snapshot)
    }

    pub fn last(&self) -> Option<&MatchSnapshot> {
        self.last.as_ref()
    }

    pub fn built(&self) -> u64 {
        self.built
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::Settings;
    use crate::game::character::tests::{fighter, test_definition};
    use crate::game::input::{Action, TickInput};
    use crate::game::Side;

    #[test]
    fn animation_key_combines_character_and_state() {
        let mut one = fighter(Side::One);
        assert_eq!(animation_key(&one), "tester_idle");

        one.handle_input(&TickInput::with(&[Action::Heavy]), 0.0);
        assert_eq!(animation_key(&one), "tester_attack_heavy");
    }

    #[test]
    fn build_keeps_latest_snapshot() {
        let game = Match::new(
            Arc::new(Settings::default()),
            [test_definition(), test_definition()],
            1,
        );
        let mut builder = SnapshotBuilder::new();
        assert!(builder.last().is_none());

        let snapshot = builder.build(&game, Vec::new()).clone();
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.fighters[0].side, Side::One);
        assert_eq!(snapshot.fighters[1].facing, -1);
        assert_eq!(builder.last(), Some(&snapshot));
        assert_eq!(builder.built(), 1);
    }
}
