//! Immutable gameplay tables injected at construction.
//!
//! Nothing here is mutated at runtime. Switching speed or difficulty builds a
//! new [`Settings`] value and the session swaps its reference.

use serde::{Deserialize, Serialize};

use crate::util::time::Millis;

/// Combat tuning shared by both fighters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatBalance {
    /// Max gap between hits that still counts as one combo
    pub combo_window_ms: Millis,
    /// Damage lost per hit already in the combo
    pub combo_scaling_factor: f32,
    /// Damage never scales below this fraction of base
    pub minimum_damage_scale: f32,
    /// Base hitstun, scaled per attack type
    pub default_hitstun_ms: Millis,
    /// Energy gained per tick while not performing a special
    pub energy_regen_per_tick: f32,
    /// Knockback multiplier applied when the hit is blocked
    pub blocked_knockback_factor: f32,
    /// Upward speed given by launcher specials (px/s)
    pub launcher_velocity: f32,
    /// Horizontal velocity kept per tick while sliding in stun
    pub ground_friction: f32,
}

impl Default for CombatBalance {
    fn default() -> Self {
        Self {
            combo_window_ms: 500.0,
            combo_scaling_factor: 0.1,
            minimum_damage_scale: 0.1,
            default_hitstun_ms: 300.0,
            energy_regen_per_tick: 0.1,
            blocked_knockback_factor: 0.4,
            launcher_velocity: 700.0,
            ground_friction: 0.85,
        }
    }
}

/// Stage geometry and gravity. Screen coordinates: y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub left: f32,
    pub right: f32,
    /// Feet rest at this y when grounded
    pub ground_y: f32,
    /// Downward acceleration (px/s^2)
    pub gravity: f32,
    /// Starting distance of each fighter from the arena center
    pub spawn_offset: f32,
}

impl ArenaConfig {
    pub fn center(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            left: 0.0,
            right: 1024.0,
            ground_y: 500.0,
            gravity: 2400.0,
            spawn_offset: 200.0,
        }
    }
}

/// Global game-speed setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl GameSpeed {
    pub fn time_scale(self) -> f64 {
        match self {
            GameSpeed::Slow => 0.5,
            GameSpeed::Normal => 1.0,
            GameSpeed::Fast => 1.5,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "slow" => Some(Self::Slow),
            "normal" => Some(Self::Normal),
            "fast" => Some(Self::Fast),
            _ => None,
        }
    }
}

/// CPU opponent difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "normal" => Some(Self::Normal),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

/// Effective match settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub speed: GameSpeed,
    pub difficulty: Difficulty,
    /// Rounds needed to win the match
    pub rounds_to_win: u32,
    pub round_time_secs: u32,
    /// "Ready... Fight!" delay before control is handed over
    pub intro_secs: f32,
    /// Catch-up ticks allowed per render callback
    pub max_catch_up_ticks: u32,
    pub balance: CombatBalance,
    pub arena: ArenaConfig,
}

impl Settings {
    pub fn with_speed(&self, speed: GameSpeed) -> Self {
        Self {
            speed,
            ..self.clone()
        }
    }

    pub fn with_difficulty(&self, difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..self.clone()
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: GameSpeed::Normal,
            difficulty: Difficulty::Normal,
            rounds_to_win: 2,
            round_time_secs: 99,
            intro_secs: 2.0,
            max_catch_up_ticks: 5,
            balance: CombatBalance::default(),
            arena: ArenaConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_speed_yields_new_settings() {
        let base = Settings::default();
        let fast = base.with_speed(GameSpeed::Fast);

        assert_eq!(base.speed, GameSpeed::Normal);
        assert_eq!(fast.speed, GameSpeed::Fast);
        assert_eq!(fast.balance, base.balance);
        assert_eq!(fast.speed.time_scale(), 1.5);
    }

    #[test]
    fn speed_and_difficulty_parse_case_insensitively() {
        assert_eq!(GameSpeed::parse("SLOW"), Some(GameSpeed::Slow));
        assert_eq!(GameSpeed::parse("warp"), None);
        assert_eq!(Difficulty::parse(" hard "), Some(Difficulty::Hard));
    }
}
