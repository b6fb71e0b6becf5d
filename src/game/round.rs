//! Round flow and the authoritative per-tick combat step

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Settings;
use crate::game::character::{Character, CharacterDefinition, InputOutcome};
use crate::game::combat::{ActiveAttack, CombatResolver};
use crate::game::combo::ComboTracker;
use crate::game::input::TickInput;
use crate::game::physics::PhysicsSystem;
use crate::game::Side;
use crate::host::protocol::{FighterStats, GameEvent, MatchSummary, RoundEndReason, RoundStats};
use crate::util::time::{secs_to_ticks, tick_delta, tick_to_millis, Millis, FRAME_MS};

/// Pause after a round ends before the next one starts
pub const ROUND_END_LINGER_SECS: f32 = 2.0;

/// Round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Countdown before control is handed over
    Intro,
    /// Round in progress
    Fighting,
    /// Round decided, showing the result
    Ended,
    /// Match decided
    MatchOver,
}

/// A best-of-N match between two fighters
#[derive(Debug, Clone)]
pub struct Match {
    id: Uuid,
    seed: u64,
    settings: Arc<Settings>,
    resolver: CombatResolver,
    fighters: [Character; 2],
    /// Incoming combo per defender, indexed by the defender's side
    combos: [ComboTracker; 2],

    phase: RoundPhase,
    round: u32,
    /// Ticks since the match was created; drives "now"
    tick: u64,
    /// Ticks of fighting in the current round
    round_ticks: u64,
    /// Remaining ticks of the intro or end linger
    phase_ticks_left: u64,

    wins: [u32; 2],
    winner: Option<Side>,
    round_stats: [FighterStats; 2],
    totals: [FighterStats; 2],
    results: Vec<RoundStats>,
    reported: usize,
    pending: Vec<GameEvent>,
}

impl Match {
    pub fn new(settings: Arc<Settings>, definitions: [Arc<CharacterDefinition>; 2], seed: u64) -> Self {
        let [one, two] = definitions;
        let arena = settings.arena;
        let balance = settings.balance;

        let mut game_match = Self {
            id: Uuid::new_v4(),
            seed,
            resolver: CombatResolver::new(balance),
            fighters: [
                Character::new(Side::One, one, &arena),
                Character::new(Side::Two, two, &arena),
            ],
            combos: [ComboTracker::new(&balance), ComboTracker::new(&balance)],
            settings,
            phase: RoundPhase::Intro,
            round: 0,
            tick: 0,
            round_ticks: 0,
            phase_ticks_left: 0,
            wins: [0; 2],
            winner: None,
            round_stats: Default::default(),
            totals: Default::default(),
            results: Vec::new(),
            reported: 0,
            pending: Vec::new(),
        };

        info!(
            match_id = %game_match.id,
            seed,
            one = %game_match.fighters[0].definition.id,
            two = %game_match.fighters[1].definition.id,
            rounds_to_win = game_match.settings.rounds_to_win,
            "Match created"
        );

        game_match.start_round();
        game_match
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulation time of the next tick
    pub fn now(&self) -> Millis {
        tick_to_millis(self.tick)
    }

    pub fn fighters(&self) -> &[Character; 2] {
        &self.fighters
    }

    pub fn fighter(&self, side: Side) -> &Character {
        &self.fighters[side.index()]
    }

    /// Combo `side` is currently taking
    pub fn incoming_combo(&self, side: Side) -> &ComboTracker {
        &self.combos[side.index()]
    }

    pub fn wins(&self) -> [u32; 2] {
        self.wins
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.phase == RoundPhase::MatchOver
    }

    /// Whole seconds left on the round timer
    pub fn time_remaining_secs(&self) -> u32 {
        let limit = secs_to_ticks(self.settings.round_time_secs as f32);
        let left = limit.saturating_sub(self.round_ticks);
        left.div_ceil(secs_to_ticks(1.0)) as u32
    }

    /// Rounds finished since the last call; each round is returned once
    pub fn take_finished_rounds(&mut self) -> Vec<RoundStats> {
        let fresh = self.results[self.reported..].to_vec();
        self.reported = self.results.len();
        fresh
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            match_id: self.id,
            seed: self.seed,
            characters: [
                self.fighters[0].definition.id.clone(),
                self.fighters[1].definition.id.clone(),
            ],
            winner: self.winner,
            round_wins: self.wins,
            rounds: self.results.clone(),
            totals: self.totals,
        }
    }

    /// Run one simulation tick and return what happened during it
    pub fn tick(&mut self, inputs: &[TickInput; 2]) -> Vec<GameEvent> {
        match self.phase {
            RoundPhase::Intro => {
                self.phase_ticks_left = self.phase_ticks_left.saturating_sub(1);
                if self.phase_ticks_left == 0 {
                    self.phase = RoundPhase::Fighting;
                    self.pending.push(GameEvent::Fight { round: self.round });
                    debug!(match_id = %self.id, round = self.round, "Fight!");
                }
            }
            RoundPhase::Fighting => self.fight_tick(inputs),
            RoundPhase::Ended => {
                // Let airborne or sliding fighters settle
                self.step_fighters(&[TickInput::default(); 2]);
                self.phase_ticks_left = self.phase_ticks_left.saturating_sub(1);
                if self.phase_ticks_left == 0 {
                    if self.match_decided() {
                        self.finish_match();
                    } else {
                        self.start_round();
                    }
                }
            }
            RoundPhase::MatchOver => {}
        }

        self.tick += 1;
        std::mem::take(&mut self.pending)
    }

    fn fight_tick(&mut self, inputs: &[TickInput; 2]) {
        let now = self.now();

        self.step_fighters(inputs);
        self.separate_bodies();
        self.resolve_contacts(now);

        // The attacker's combo display follows the defender's tracker
        for defender in Side::BOTH {
            if self.combos[defender.index()].expire_if_stale(now) {
                self.fighters[defender.opponent().index()].combo_count = 0;
            }
        }

        self.round_ticks += 1;

        if self.fighters.iter().any(Character::is_ko) {
            self.end_round(RoundEndReason::Ko);
        } else if self.round_ticks >= secs_to_ticks(self.settings.round_time_secs as f32) {
            self.end_round(RoundEndReason::Timeout);
        }
    }

    /// Facing, input, and per-fighter update for both sides
    fn step_fighters(&mut self, inputs: &[TickInput; 2]) {
        let now = self.now();
        let settings = Arc::clone(&self.settings);
        let positions = [self.fighters[0].position.x, self.fighters[1].position.x];

        for side in Side::BOTH {
            let outcome = {
                let fighter = &mut self.fighters[side.index()];
                fighter.face_towards(positions[side.opponent().index()]);
                fighter.handle_input(&inputs[side.index()], now)
            };
            self.record_input(side, outcome);
        }

        for fighter in self.fighters.iter_mut() {
            fighter.update(FRAME_MS, tick_delta(), &settings.balance, &settings.arena);
        }
    }

    fn record_input(&mut self, side: Side, outcome: InputOutcome) {
        if let Some(definition) = outcome.special {
            self.round_stats[side.index()].specials_used += 1;
            self.pending.push(GameEvent::SpecialMove {
                side,
                move_name: definition.name.clone(),
                energy_left: self.fighters[side.index()].energy(),
            });
        }
        if let Some(attack_type) = outcome.attack {
            self.pending.push(GameEvent::AttackStarted { side, attack_type });
        }
        if outcome.jumped {
            self.pending.push(GameEvent::Jump { side });
        }
    }

    /// Bodies never overlap; both are pushed apart along x
    fn separate_bodies(&mut self) {
        let [one, two] = &mut self.fighters;
        if !PhysicsSystem::check_body_collision(one.position, two.position) {
            return;
        }
        let (x1, x2) =
            PhysicsSystem::resolve_body_collision(one.position.x, two.position.x, &self.settings.arena);
        one.position.x = x1;
        two.position.x = x2;
    }

    /// Both sides' contacts are gathered first so simultaneous hits trade
    fn resolve_contacts(&mut self, now: Millis) {
        let contacts: Vec<(Side, ActiveAttack)> = Side::BOTH
            .iter()
            .filter_map(|&side| {
                let attacker = &self.fighters[side.index()];
                let defender = &self.fighters[side.opponent().index()];
                attacker
                    .live_attack()
                    .filter(|attack| attack.overlaps(attacker, defender))
                    .cloned()
                    .map(|attack| (side, attack))
            })
            .collect();

        for (side, attack) in contacts {
            let defender_side = side.opponent();
            let (attacker, defender) = pair_mut(&mut self.fighters, side);
            let combo = &mut self.combos[defender_side.index()];

            let Some(outcome) = self.resolver.resolve_hit(attacker, defender, &attack, combo, now)
            else {
                continue;
            };

            attacker.mark_attack_landed();
            if !outcome.blocked {
                attacker.combo_count = outcome.combo_hits;
            }

            {
                let dealt = &mut self.round_stats[side.index()];
                dealt.damage_dealt += outcome.damage_dealt;
                if !outcome.blocked {
                    dealt.hits_landed += 1;
                    dealt.max_combo = dealt.max_combo.max(outcome.combo_hits);
                }
            }
            {
                let taken = &mut self.round_stats[defender_side.index()];
                taken.damage_taken += outcome.damage_dealt;
                if outcome.blocked {
                    taken.hits_blocked += 1;
                }
            }

            self.pending.push(GameEvent::Hit {
                attacker: side,
                defender: defender_side,
                damage: outcome.damage_dealt,
                blocked: outcome.blocked,
                combo: outcome.combo_hits,
                effect: outcome.effect,
                sound: outcome.sound.to_string(),
            });

            if outcome.ko_triggered {
                self.pending.push(GameEvent::Ko { side: defender_side });
            }
        }
    }

    fn end_round(&mut self, reason: RoundEndReason) {
        let [one, two] = &self.fighters;
        let winner = match reason {
            RoundEndReason::Ko => match (one.is_ko(), two.is_ko()) {
                (false, true) => Some(Side::One),
                (true, false) => Some(Side::Two),
                _ => None,
            },
            RoundEndReason::Timeout => {
                if one.health() > two.health() {
                    Some(Side::One)
                } else if two.health() > one.health() {
                    Some(Side::Two)
                } else {
                    None
                }
            }
        };

        if let Some(side) = winner {
            self.wins[side.index()] += 1;
        }
        for side in Side::BOTH {
            self.totals[side.index()].merge(&self.round_stats[side.index()]);
        }

        let stats = RoundStats {
            match_id: self.id,
            round: self.round,
            winner,
            reason,
            duration_ms: tick_to_millis(self.round_ticks),
            fighters: self.round_stats,
            final_health: [one.health(), two.health()],
            ended_at: Utc::now(),
        };

        info!(
            match_id = %self.id,
            round = self.round,
            winner = ?winner,
            reason = ?reason,
            wins = ?self.wins,
            "Round ended"
        );

        self.results.push(stats);
        self.pending.push(GameEvent::RoundEnd {
            round: self.round,
            winner,
            reason,
        });

        self.phase = RoundPhase::Ended;
        self.phase_ticks_left = secs_to_ticks(ROUND_END_LINGER_SECS).max(1);
    }

    /// First to `rounds_to_win`, or the round cap is reached after draws
    fn match_decided(&self) -> bool {
        let needed = self.settings.rounds_to_win;
        self.wins.iter().any(|&w| w >= needed) || self.round >= max_rounds(needed)
    }

    fn finish_match(&mut self) {
        self.winner = match self.wins[0].cmp(&self.wins[1]) {
            std::cmp::Ordering::Greater => Some(Side::One),
            std::cmp::Ordering::Less => Some(Side::Two),
            std::cmp::Ordering::Equal => None,
        };
        self.phase = RoundPhase::MatchOver;
        self.pending.push(GameEvent::MatchEnd {
            winner: self.winner,
        });

        info!(
            match_id = %self.id,
            winner = ?self.winner,
            wins = ?self.wins,
            rounds = self.round,
            "Match ended"
        );
    }

    fn start_round(&mut self) {
        self.round += 1;
        let arena = self.settings.arena;
        for fighter in self.fighters.iter_mut() {
            fighter.reset(&arena);
        }
        for combo in self.combos.iter_mut() {
            combo.reset();
        }
        self.round_stats = Default::default();
        self.round_ticks = 0;
        self.phase = RoundPhase::Intro;
        self.phase_ticks_left = secs_to_ticks(self.settings.intro_secs);
        self.pending.push(GameEvent::RoundStart { round: self.round });

        info!(match_id = %self.id, round = self.round, "Round started");
    }
}

/// Most rounds a match can take, counting drawn rounds
pub fn max_rounds(rounds_to_win: u32) -> u32 {
    rounds_to_win * 2 + 1
}

/// Attacker mutably alongside the defender
fn pair_mut(fighters: &mut [Character; 2], attacker: Side) -> (&mut Character, &mut Character) {
    let [one, two] = fighters;
    match attacker {
        Side::One => (one, two),
        Side::Two => (two, one),
    }
}
