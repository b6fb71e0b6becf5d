//! Character roster: archetype stats and move lists loaded from JSON

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::game::character::{CharacterDefinition, CharacterStats, MAX_ENERGY};
use crate::game::combat::AttackType;
use crate::game::moves::MoveDefinition;

const BUILTIN_ROSTER: &str = include_str!("../../assets/roster.json");

/// Loaded, validated character definitions in file order
#[derive(Debug, Clone)]
pub struct Roster {
    characters: Vec<Arc<CharacterDefinition>>,
}

#[derive(Debug, Deserialize)]
struct RawRoster {
    characters: Vec<RawCharacter>,
}

#[derive(Debug, Deserialize)]
struct RawCharacter {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    stats: RawStats,
    #[serde(default)]
    moves: Vec<MoveDefinition>,
}

/// Stats stay optional here so a missing one is reported by name
#[derive(Debug, Default, Deserialize)]
struct RawStats {
    walk_speed: Option<f32>,
    jump_force: Option<f32>,
    attack_power: Option<f32>,
    block_damage_reduction: Option<f32>,
}

impl Roster {
    /// The roster compiled into the binary
    pub fn builtin() -> Result<Self, RosterError> {
        Self::from_json(BUILTIN_ROSTER)
    }

    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let roster = Self::from_json(&raw)?;
        info!(path = %path.display(), characters = roster.len(), "Roster loaded");
        Ok(roster)
    }

    pub fn from_json(raw: &str) -> Result<Self, RosterError> {
        let parsed: RawRoster = serde_json::from_str(raw)?;
        if parsed.characters.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut seen = HashSet::new();
        let mut characters = Vec::with_capacity(parsed.characters.len());
        for raw in parsed.characters {
            if !seen.insert(raw.id.clone()) {
                return Err(RosterError::DuplicateCharacter(raw.id));
            }
            characters.push(Arc::new(validate_character(raw)?));
        }

        Ok(Self { characters })
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn characters(&self) -> &[Arc<CharacterDefinition>] {
        &self.characters
    }

    pub fn get(&self, id: &str) -> Option<Arc<CharacterDefinition>> {
        self.characters.iter().find(|c| c.id == id).cloned()
    }

    /// Character by id, or by position when no id is given
    pub fn resolve(
        &self,
        id: Option<&str>,
        fallback_index: usize,
    ) -> Result<Arc<CharacterDefinition>, RosterError> {
        match id {
            Some(id) => self
                .get(id)
                .ok_or_else(|| RosterError::UnknownCharacter(id.to_string())),
            None => Ok(Arc::clone(
                &self.characters[fallback_index % self.characters.len()],
            )),
        }
    }
}

/// Every animation key the renderer may be asked for
pub fn animation_keys(definition: &CharacterDefinition) -> Vec<String> {
    let mut states: Vec<String> = ["idle", "walk", "jump", "block", "hit", "ko"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for attack in [AttackType::Light, AttackType::Medium, AttackType::Heavy] {
        states.push(format!("attack_{}", attack.as_str()));
    }
    for special in &definition.moves {
        states.push(format!("special_{}", special.name));
    }

    states
        .into_iter()
        .map(|state| format!("{}_{}", definition.id, state))
        .collect()
}

fn validate_character(raw: RawCharacter) -> Result<CharacterDefinition, RosterError> {
    let id = raw.id;
    if id.trim().is_empty() {
        return Err(RosterError::EmptyId);
    }

    let stat = |name: &'static str, value: Option<f32>| -> Result<f32, RosterError> {
        let value = value.ok_or_else(|| RosterError::MissingStat {
            character: id.clone(),
            stat: name,
        })?;
        if !value.is_finite() || value <= 0.0 {
            return Err(RosterError::InvalidStat {
                character: id.clone(),
                stat: name,
                value,
            });
        }
        Ok(value)
    };

    let stats = CharacterStats {
        walk_speed: stat("walk_speed", raw.stats.walk_speed)?,
        jump_force: stat("jump_force", raw.stats.jump_force)?,
        attack_power: stat("attack_power", raw.stats.attack_power)?,
        block_damage_reduction: stat("block_damage_reduction", raw.stats.block_damage_reduction)?,
    };
    if stats.block_damage_reduction > 1.0 {
        return Err(RosterError::InvalidStat {
            character: id,
            stat: "block_damage_reduction",
            value: stats.block_damage_reduction,
        });
    }

    let mut names = HashSet::new();
    for definition in &raw.moves {
        let invalid = |reason: &'static str| RosterError::InvalidMove {
            character: id.clone(),
            move_name: definition.name.clone(),
            reason,
        };
        if definition.sequence.is_empty() {
            return Err(invalid("empty input sequence"));
        }
        if !definition.energy_cost.is_finite()
            || definition.energy_cost < 0.0
            || definition.energy_cost > MAX_ENERGY
        {
            return Err(invalid("energy cost out of range"));
        }
        if !definition.damage.is_finite() || definition.damage < 0.0 {
            return Err(invalid("negative damage"));
        }
        if definition.frames.active == 0 {
            return Err(invalid("no active frames"));
        }
        if !names.insert(definition.name.as_str()) {
            return Err(invalid("duplicate move name"));
        }
    }

    Ok(CharacterDefinition {
        display_name: raw.display_name.unwrap_or_else(|| id.clone()),
        id,
        stats,
        moves: raw.moves.into_iter().map(Arc::new).collect(),
    })
}

/// Roster loading errors. All are fatal before a match starts.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Failed to read roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed roster JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Roster has no characters")]
    Empty,

    #[error("Character with an empty id")]
    EmptyId,

    #[error("Character {0:?} is defined twice")]
    DuplicateCharacter(String),

    #[error("Unknown character {0:?}")]
    UnknownCharacter(String),

    #[error("Character {character:?} is missing required stat {stat}")]
    MissingStat {
        character: String,
        stat: &'static str,
    },

    #[error("Character {character:?} has invalid {stat}: {value}")]
    InvalidStat {
        character: String,
        stat: &'static str,
        value: f32,
    },

    #[error("Move {move_name:?} of {character:?} is invalid: {reason}")]
    InvalidMove {
        character: String,
        move_name: String,
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::input::Action;
    use crate::game::moves::EffectKind;

    const MINIMAL: &str = r#"{
        "characters": [{
            "id": "solo",
            "stats": {
                "walk_speed": 250.0,
                "jump_force": 900.0,
                "attack_power": 1.0,
                "block_damage_reduction": 0.5
            },
            "moves": [{
                "name": "uppercut",
                "sequence": ["down", "up", "heavy"],
                "energy_cost": 20.0,
                "damage": 18.0,
                "frames": { "startup": 5, "active": 4, "recovery": 16 }
            }]
        }]
    }"#;

    #[test]
    fn builtin_roster_is_valid() {
        let roster = Roster::builtin().unwrap();
        assert!(roster.len() >= 2);
        assert!(roster.characters().iter().all(|c| !c.moves.is_empty()));

        let kenji = roster.get("kenji").unwrap();
        assert_eq!(kenji.moves[0].sequence, vec![Action::Down, Action::Down, Action::Light]);
        assert_eq!(kenji.moves[0].effect, EffectKind::Launcher);
    }

    #[test]
    fn minimal_character_gets_defaults() {
        let roster = Roster::from_json(MINIMAL).unwrap();
        let solo = roster.get("solo").unwrap();

        assert_eq!(solo.display_name, "solo");
        assert_eq!(solo.moves[0].effect, EffectKind::Strike);
        assert_eq!(solo.moves[0].frames.total(), 25);
    }

    #[test]
    fn missing_stat_is_named() {
        let raw = MINIMAL.replace("\"attack_power\": 1.0,", "");
        match Roster::from_json(&raw) {
            Err(RosterError::MissingStat { character, stat }) => {
                assert_eq!(character, "solo");
                assert_eq!(stat, "attack_power");
            }
            other => panic!("expected MissingStat, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_stat_is_rejected() {
        let raw = MINIMAL.replace("\"walk_speed\": 250.0", "\"walk_speed\": 0.0");
        assert!(matches!(
            Roster::from_json(&raw),
            Err(RosterError::InvalidStat { stat: "walk_speed", .. })
        ));
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let raw = MINIMAL.replace(r#"["down", "up", "heavy"]"#, "[]");
        assert!(matches!(
            Roster::from_json(&raw),
            Err(RosterError::InvalidMove { reason: "empty input sequence", .. })
        ));
    }

    #[test]
    fn negative_energy_cost_is_rejected() {
        let raw = MINIMAL.replace("\"energy_cost\": 20.0", "\"energy_cost\": -5.0");
        assert!(matches!(
            Roster::from_json(&raw),
            Err(RosterError::InvalidMove { .. })
        ));
    }

    #[test]
    fn structural_problems_are_reported() {
        assert!(matches!(Roster::from_json("{"), Err(RosterError::Parse(_))));
        assert!(matches!(
            Roster::from_json(r#"{"characters": []}"#),
            Err(RosterError::Empty)
        ));

        let doubled = format!(
            r#"{{"characters": [{0}, {0}]}}"#,
            &MINIMAL[MINIMAL.find('[').unwrap() + 1..MINIMAL.rfind(']').unwrap()]
        );
        assert!(matches!(
            Roster::from_json(&doubled),
            Err(RosterError::DuplicateCharacter(id)) if id == "solo"
        ));
    }

    #[test]
    fn resolve_by_id_or_position() {
        let roster = Roster::builtin().unwrap();
        let first = roster.resolve(None, 0).unwrap();
        let second = roster.resolve(None, 1).unwrap();
        assert_ne!(first.id, second.id);

        assert_eq!(roster.resolve(Some("mira"), 0).unwrap().id, "mira");
        assert!(matches!(
            roster.resolve(Some("nobody"), 0),
            Err(RosterError::UnknownCharacter(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Roster::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, RosterError::Io { .. }));
    }

    #[test]
    fn animation_keys_cover_every_state() {
        let roster = Roster::builtin().unwrap();
        let kenji = roster.get("kenji").unwrap();
        let keys = animation_keys(&kenji);

        assert!(keys.contains(&"kenji_idle".to_string()));
        assert!(keys.contains(&"kenji_attack_heavy".to_string()));
        assert!(keys.contains(&"kenji_special_rising_dragon".to_string()));
    }
}
