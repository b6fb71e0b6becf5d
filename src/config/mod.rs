//! Configuration module - environment variable parsing

pub mod balance;

pub use balance::{ArenaConfig, CombatBalance, Difficulty, GameSpeed, Settings};

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Optional roster JSON file, built-in roster otherwise
    pub roster_path: Option<PathBuf>,
    /// Character id for side one (first roster entry if unset)
    pub player_one: Option<String>,
    /// Character id for side two (second roster entry if unset)
    pub player_two: Option<String>,

    /// Seed for the CPU controllers, random if unset
    pub match_seed: Option<u64>,
    /// Display refresh rate of the headless render driver
    pub frame_rate: u32,

    /// Effective gameplay settings
    pub settings: Settings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let speed = match lookup("GAME_SPEED") {
            Some(v) => GameSpeed::parse(&v).ok_or(ConfigError::Invalid("GAME_SPEED", v))?,
            None => defaults.speed,
        };
        let difficulty = match lookup("DIFFICULTY") {
            Some(v) => Difficulty::parse(&v).ok_or(ConfigError::Invalid("DIFFICULTY", v))?,
            None => defaults.difficulty,
        };

        let rounds_to_win = parse_var(&lookup, "ROUNDS_TO_WIN")?.unwrap_or(defaults.rounds_to_win);
        if rounds_to_win == 0 {
            return Err(ConfigError::Invalid("ROUNDS_TO_WIN", "0".to_string()));
        }
        let round_time_secs =
            parse_var(&lookup, "ROUND_TIME_SECS")?.unwrap_or(defaults.round_time_secs);
        if round_time_secs == 0 {
            return Err(ConfigError::Invalid("ROUND_TIME_SECS", "0".to_string()));
        }
        let max_catch_up_ticks =
            parse_var(&lookup, "MAX_CATCH_UP_TICKS")?.unwrap_or(defaults.max_catch_up_ticks);
        let frame_rate: u32 = parse_var(&lookup, "FRAME_RATE")?.unwrap_or(60);
        if frame_rate == 0 {
            return Err(ConfigError::Invalid("FRAME_RATE", "0".to_string()));
        }

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            roster_path: lookup("ROSTER_PATH").map(PathBuf::from),
            player_one: lookup("PLAYER_ONE"),
            player_two: lookup("PLAYER_TWO"),

            match_seed: parse_var(&lookup, "MATCH_SEED")?,
            frame_rate,

            settings: Settings {
                speed,
                difficulty,
                rounds_to_win,
                round_time_secs,
                max_catch_up_ticks: max_catch_up_ticks.max(1),
                ..defaults
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key, raw)),
        None => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.frame_rate, 60);
        assert!(config.roster_path.is_none());
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("GAME_SPEED", "fast"),
            ("DIFFICULTY", "easy"),
            ("ROUNDS_TO_WIN", "3"),
            ("MATCH_SEED", "42"),
            ("PLAYER_ONE", "kenji"),
        ]))
        .unwrap();

        assert_eq!(config.settings.speed, GameSpeed::Fast);
        assert_eq!(config.settings.difficulty, Difficulty::Easy);
        assert_eq!(config.settings.rounds_to_win, 3);
        assert_eq!(config.match_seed, Some(42));
        assert_eq!(config.player_one.as_deref(), Some("kenji"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("GAME_SPEED", "ludicrous")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("GAME_SPEED", _)));

        let err = Config::from_lookup(lookup_from(&[("MATCH_SEED", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("MATCH_SEED", _)));

        let err = Config::from_lookup(lookup_from(&[("ROUNDS_TO_WIN", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("ROUNDS_TO_WIN", _)));
    }
}
