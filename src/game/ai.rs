//! Input sources: CPU opponent and scripted playback.
//!
//! Each tick the session asks one source per side for the buttons held on
//! that tick. Sources only read the fighters; they never mutate them.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::config::Difficulty;
use crate::game::character::Character;
use crate::game::input::{Action, TickInput};
use crate::util::time::Millis;

/// Horizontal distance at which the CPU starts swinging
const ATTACK_RANGE: f32 = 110.0;
/// Opponent attacks closer than this are treated as threats
const THREAT_RANGE: f32 = 180.0;
const JUMP_CHANCE: f64 = 0.04;

/// Supplies held buttons for one side, once per tick
pub trait InputSource {
    fn next_input(&mut self, me: &Character, opponent: &Character, now: Millis) -> TickInput;

    /// Sources without difficulty knobs ignore this
    fn set_difficulty(&mut self, _difficulty: Difficulty) {}
}

/// Behaviour knobs per difficulty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiProfile {
    /// Ticks between decisions
    pub decision_ticks: u32,
    /// Chance to guard against an attack in range
    pub block_chance: f64,
    /// Chance to attack or approach on a decision
    pub aggression: f64,
    /// Chance to input a special when one is affordable
    pub special_chance: f64,
}

impl AiProfile {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                decision_ticks: 20,
                block_chance: 0.2,
                aggression: 0.4,
                special_chance: 0.1,
            },
            Difficulty::Normal => Self {
                decision_ticks: 12,
                block_chance: 0.5,
                aggression: 0.6,
                special_chance: 0.25,
            },
            Difficulty::Hard => Self {
                decision_ticks: 6,
                block_chance: 0.8,
                aggression: 0.8,
                special_chance: 0.45,
            },
        }
    }
}

/// Seeded CPU opponent
#[derive(Debug, Clone)]
pub struct CpuController {
    rng: ChaCha8Rng,
    profile: AiProfile,
    /// Queued frames (button presses and their releases)
    plan: VecDeque<TickInput>,
    /// Buttons held between decisions
    held: TickInput,
    cooldown: u32,
    /// Already rolled against the opponent's current attack
    reacted: bool,
}

impl CpuController {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self::with_profile(AiProfile::for_difficulty(difficulty), seed)
    }

    pub fn with_profile(profile: AiProfile, seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            profile,
            plan: VecDeque::new(),
            held: TickInput::default(),
            cooldown: 0,
            reacted: false,
        }
    }

    pub fn profile(&self) -> &AiProfile {
        &self.profile
    }

    /// Tap each action once, releasing in between so every tap is a new press
    fn queue_taps(&mut self, actions: &[Action]) {
        for &action in actions {
            self.plan.push_back(TickInput::with(&[action]));
            self.plan.push_back(TickInput::default());
        }
    }

    fn decide(&mut self, me: &Character, opponent: &Character) {
        self.cooldown = self.profile.decision_ticks;
        self.held = TickInput::default();

        let dx = opponent.position.x - me.position.x;
        let distance = dx.abs();
        let toward = if dx >= 0.0 { Action::Right } else { Action::Left };

        if distance <= ATTACK_RANGE {
            let affordable: Vec<_> = me
                .definition
                .moves
                .iter()
                .filter(|m| m.energy_cost <= me.energy())
                .collect();
            if !affordable.is_empty() && self.rng.gen_bool(self.profile.special_chance) {
                let chosen = affordable[self.rng.gen_range(0..affordable.len())];
                trace!(side = ?me.side, move_name = %chosen.name, "CPU inputs special");
                let sequence = chosen.sequence.clone();
                self.queue_taps(&sequence);
                return;
            }

            if self.rng.gen_bool(self.profile.aggression) {
                let attack = [Action::Light, Action::Medium, Action::Heavy][self.rng.gen_range(0..3)];
                self.queue_taps(&[attack]);
            }
            return;
        }

        if self.rng.gen_bool(self.profile.aggression) {
            if me.grounded && self.rng.gen_bool(JUMP_CHANCE) {
                let mut jump = TickInput::with(&[Action::Jump]);
                jump.set(toward, true);
                self.plan.push_back(jump);
            }
            self.held.set(toward, true);
        }
    }
}

impl InputSource for CpuController {
    fn next_input(&mut self, me: &Character, opponent: &Character, _now: Millis) -> TickInput {
        if me.is_ko() || opponent.is_ko() {
            self.plan.clear();
            self.held = TickInput::default();
            return self.held;
        }

        let dx = (opponent.position.x - me.position.x).abs();
        match opponent.active_attack() {
            Some(_) if dx <= THREAT_RANGE && !self.reacted => {
                self.reacted = true;
                if me.grounded && self.rng.gen_bool(self.profile.block_chance) {
                    self.plan.clear();
                    self.held = TickInput::with(&[Action::Block]);
                    self.cooldown = self.profile.decision_ticks;
                    return self.held;
                }
            }
            None => {
                self.reacted = false;
                if self.held.block {
                    self.held.block = false;
                    self.cooldown = 0;
                }
            }
            _ => {}
        }

        if let Some(frame) = self.plan.pop_front() {
            return frame;
        }

        if self.cooldown == 0 {
            self.decide(me, opponent);
            if let Some(frame) = self.plan.pop_front() {
                return frame;
            }
        } else {
            self.cooldown -= 1;
        }

        self.held
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.profile = AiProfile::for_difficulty(difficulty);
        self.cooldown = self.cooldown.min(self.profile.decision_ticks);
    }
}

/// Replays a fixed list of frames, then stays idle
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<TickInput>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = TickInput>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Nothing held, ever
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn next_input(&mut self, _me: &Character, _opponent: &Character, _now: Millis) -> TickInput {
        self.frames.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::tests::fighter;
    use crate::game::Side;

    fn drive(cpu: &mut CpuController, me: &Character, opponent: &Character, ticks: usize) -> Vec<TickInput> {
        (0..ticks)
            .map(|_| cpu.next_input(me, opponent, 0.0))
            .collect()
    }

    #[test]
    fn same_seed_same_inputs() {
        let me = fighter(Side::One);
        let opponent = fighter(Side::Two);
        let mut a = CpuController::new(Difficulty::Normal, 42);
        let mut b = CpuController::new(Difficulty::Normal, 42);

        assert_eq!(drive(&mut a, &me, &opponent, 300), drive(&mut b, &me, &opponent, 300));
    }

    #[test]
    fn difficulty_change_swaps_profile() {
        let mut cpu = CpuController::new(Difficulty::Easy, 3);
        cpu.set_difficulty(Difficulty::Hard);
        assert_eq!(*cpu.profile(), AiProfile::for_difficulty(Difficulty::Hard));

        let mut script = ScriptedInput::idle();
        script.set_difficulty(Difficulty::Hard);
        assert_eq!(script.remaining(), 0);
    }

    #[test]
    fn walks_toward_a_distant_opponent() {
        let me = fighter(Side::One);
        let opponent = fighter(Side::Two);
        let mut cpu = CpuController::new(Difficulty::Hard, 1);

        let frames = drive(&mut cpu, &me, &opponent, 120);
        assert!(frames.iter().any(|f| f.right));
        assert!(!frames.iter().any(|f| f.left));
    }

    #[test]
    fn attacks_in_range_with_releases_between_presses() {
        let mut me = fighter(Side::One);
        let mut opponent = fighter(Side::Two);
        me.position.x = 400.0;
        opponent.position.x = 470.0;
        let mut cpu = CpuController::new(Difficulty::Hard, 3);

        let frames = drive(&mut cpu, &me, &opponent, 300);
        let is_attack = |f: &TickInput| f.light || f.medium || f.heavy;

        assert!(frames.iter().any(is_attack));
        assert!(frames.windows(2).all(|w| !(is_attack(&w[0]) && is_attack(&w[1]))));
    }

    #[test]
    fn inputs_special_sequence_when_energy_allows() {
        let mut me = fighter(Side::One);
        let mut opponent = fighter(Side::Two);
        me.position.x = 400.0;
        opponent.position.x = 470.0;
        me.set_energy(100.0);
        let mut cpu = CpuController::new(Difficulty::Hard, 9);

        let frames = drive(&mut cpu, &me, &opponent, 600);
        let downs = frames.iter().filter(|f| f.down).count();
        assert!(downs >= 2);
    }

    #[test]
    fn never_inputs_special_without_energy() {
        let mut me = fighter(Side::One);
        let mut opponent = fighter(Side::Two);
        me.position.x = 400.0;
        opponent.position.x = 470.0;
        let mut cpu = CpuController::new(Difficulty::Hard, 9);

        let frames = drive(&mut cpu, &me, &opponent, 600);
        assert!(!frames.iter().any(|f| f.down));
    }

    #[test]
    fn goes_quiet_once_someone_is_ko() {
        let me = fighter(Side::One);
        let mut opponent = fighter(Side::Two);
        opponent.force_ko();
        let mut cpu = CpuController::new(Difficulty::Hard, 5);

        let frames = drive(&mut cpu, &me, &opponent, 60);
        assert!(frames.iter().all(|f| *f == TickInput::default()));
    }

    #[test]
    fn scripted_input_replays_then_idles() {
        let me = fighter(Side::One);
        let opponent = fighter(Side::Two);
        let mut script = ScriptedInput::new([
            TickInput::with(&[Action::Right]),
            TickInput::with(&[Action::Light]),
        ]);

        assert!(script.next_input(&me, &opponent, 0.0).right);
        assert!(script.next_input(&me, &opponent, 0.0).light);
        assert_eq!(script.remaining(), 0);
        assert_eq!(script.next_input(&me, &opponent, 0.0), TickInput::default());
    }
}
