//! Collaborator-facing message types
//! Everything the core hands to renderers, audio, and round reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::combat::{AttackType, HitEffect};
use crate::game::Side;

/// Things that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Fighters reset, intro countdown begins
    RoundStart { round: u32 },

    /// Intro finished, input is live
    Fight { round: u32 },

    /// Basic attack started
    AttackStarted { side: Side, attack_type: AttackType },

    /// Special move sequence matched
    SpecialMove {
        side: Side,
        move_name: String,
        energy_left: f32,
    },

    Jump { side: Side },

    /// Attack connected (clean or blocked)
    Hit {
        attacker: Side,
        defender: Side,
        damage: f32,
        blocked: bool,
        combo: u32,
        effect: HitEffect,
        sound: String,
    },

    Ko { side: Side },

    RoundEnd {
        round: u32,
        winner: Option<Side>,
        reason: RoundEndReason,
    },

    MatchEnd { winner: Option<Side> },
}

impl GameEvent {
    /// Sound cue to play for this event, if any
    pub fn sound_cue(&self) -> Option<&str> {
        match self {
            GameEvent::RoundStart { .. } => Some("announcer_round"),
            GameEvent::Fight { .. } => Some("announcer_fight"),
            GameEvent::AttackStarted { attack_type, .. } => Some(attack_type.swing_sound()),
            GameEvent::SpecialMove { .. } => Some(AttackType::Special.swing_sound()),
            GameEvent::Jump { .. } => Some("jump"),
            GameEvent::Hit { sound, .. } => Some(sound.as_str()),
            // The lethal hit already carries the KO sound
            GameEvent::Ko { .. } => None,
            GameEvent::RoundEnd { reason, .. } => Some(match reason {
                RoundEndReason::Ko => "announcer_ko",
                RoundEndReason::Timeout => "announcer_time",
            }),
            GameEvent::MatchEnd { .. } => Some("announcer_winner"),
        }
    }
}

/// How a round finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEndReason {
    Ko,
    Timeout,
}

/// Fighter state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterSnapshot {
    pub side: Side,
    pub character_id: String,
    /// Position X (body center)
    pub x: f32,
    /// Position Y (feet)
    pub y: f32,
    /// 1 = right, -1 = left
    pub facing: i8,
    pub health: f32,
    pub energy: f32,
    pub state: String,
    /// `{character_id}_{state}`, handed to the renderer
    pub animation_key: String,
    /// Hits in this fighter's current combo
    pub combo: u32,
    pub grounded: bool,
}

/// Per-fighter statistics, accumulated per round and per match
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterStats {
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub hits_landed: u32,
    pub hits_blocked: u32,
    pub specials_used: u32,
    pub max_combo: u32,
}

impl FighterStats {
    pub fn merge(&mut self, other: &FighterStats) {
        self.damage_dealt += other.damage_dealt;
        self.damage_taken += other.damage_taken;
        self.hits_landed += other.hits_landed;
        self.hits_blocked += other.hits_blocked;
        self.specials_used += other.specials_used;
        self.max_combo = self.max_combo.max(other.max_combo);
    }
}

/// Handed to the round reporter once per finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub match_id: Uuid,
    pub round: u32,
    pub winner: Option<Side>,
    pub reason: RoundEndReason,
    pub duration_ms: f64,
    /// Indexed by `Side::index()`
    pub fighters: [FighterStats; 2],
    pub final_health: [f32; 2],
    pub ended_at: DateTime<Utc>,
}

/// Whole-match result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: Uuid,
    pub seed: u64,
    pub characters: [String; 2],
    pub winner: Option<Side>,
    pub round_wins: [u32; 2],
    pub rounds: Vec<RoundStats>,
    pub totals: [FighterStats; 2],
}
