//! Fighter data model and combat state machine

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{ArenaConfig, CombatBalance};
use crate::game::combat::{ActiveAttack, AttackType};
use crate::game::input::{Action, InputBuffer, TickInput};
use crate::game::moves::{EffectKind, MoveDefinition, MoveMatcher};
use crate::game::physics::{PhysicsSystem, Vec2};
use crate::game::Side;
use crate::util::time::Millis;

pub const MAX_HEALTH: f32 = 100.0;
pub const MAX_ENERGY: f32 = 100.0;

/// Per-archetype stats, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterStats {
    /// Horizontal speed while walking (px/s)
    pub walk_speed: f32,
    /// Initial upward speed of a jump (px/s)
    pub jump_force: f32,
    /// Multiplier on every attack's base damage
    pub attack_power: f32,
    /// Fraction of damage that still goes through a block
    pub block_damage_reduction: f32,
}

/// Character archetype: stats plus move list, shared by every instance
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDefinition {
    pub id: String,
    pub display_name: String,
    pub stats: CharacterStats,
    /// Special moves in declaration order
    pub moves: Vec<Arc<MoveDefinition>>,
}

/// Discrete combat state
#[derive(Debug, Clone, PartialEq)]
pub enum CombatState {
    Idle,
    Walk,
    Jump,
    Attack(AttackType),
    /// Holding guard; `stun_remaining > 0` means blockstun
    Block,
    /// Hitstun
    Hit,
    Special(Arc<MoveDefinition>),
    /// Terminal until the round is reset
    Ko,
}

impl CombatState {
    /// Action states suppress locomotion input
    pub fn is_action(&self) -> bool {
        !matches!(self, CombatState::Idle | CombatState::Walk | CombatState::Jump)
    }

    /// Short key used to build animation names
    pub fn key(&self) -> String {
        match self {
            CombatState::Idle => "idle".to_string(),
            CombatState::Walk => "walk".to_string(),
            CombatState::Jump => "jump".to_string(),
            CombatState::Attack(kind) => format!("attack_{}", kind.as_str()),
            CombatState::Block => "block".to_string(),
            CombatState::Hit => "hit".to_string(),
            CombatState::Special(definition) => format!("special_{}", definition.name),
            CombatState::Ko => "ko".to_string(),
        }
    }
}

impl fmt::Display for CombatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// What a tick of input started, for event reporting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputOutcome {
    pub special: Option<Arc<MoveDefinition>>,
    pub attack: Option<AttackType>,
    pub jumped: bool,
}

/// One combatant
#[derive(Debug, Clone)]
pub struct Character {
    pub side: Side,
    pub definition: Arc<CharacterDefinition>,

    // Position and movement
    pub position: Vec2,
    pub velocity: Vec2,
    /// 1 faces right, -1 faces left
    pub facing: i8,
    pub grounded: bool,

    // Combat
    health: f32,
    energy: f32,
    state: CombatState,
    state_elapsed: Millis,
    invulnerable: bool,
    stun_remaining: Millis,
    active_attack: Option<ActiveAttack>,
    /// Hits in this fighter's ongoing combo against the opponent
    pub combo_count: u32,

    // Input tracking
    pub input_buffer: InputBuffer,
    previous_input: TickInput,
}

impl Character {
    /// Create a fighter at its side's spawn point
    pub fn new(side: Side, definition: Arc<CharacterDefinition>, arena: &ArenaConfig) -> Self {
        let mut character = Self {
            side,
            definition,
            position: Vec2::default(),
            velocity: Vec2::default(),
            facing: 1,
            grounded: true,
            health: MAX_HEALTH,
            energy: 0.0,
            state: CombatState::Idle,
            state_elapsed: 0.0,
            invulnerable: false,
            stun_remaining: 0.0,
            active_attack: None,
            combo_count: 0,
            input_buffer: InputBuffer::new(),
            previous_input: TickInput::default(),
        };
        character.reset(arena);
        character
    }

    /// Round reset: full health, spawn position, neutral state
    pub fn reset(&mut self, arena: &ArenaConfig) {
        let (x, facing) = match self.side {
            Side::One => (arena.center() - arena.spawn_offset, 1),
            Side::Two => (arena.center() + arena.spawn_offset, -1),
        };
        self.position = Vec2::new(PhysicsSystem::clamp_to_arena(x, arena), arena.ground_y);
        self.velocity = Vec2::default();
        self.facing = facing;
        self.grounded = true;
        self.health = MAX_HEALTH;
        self.energy = 0.0;
        self.state = CombatState::Idle;
        self.state_elapsed = 0.0;
        self.invulnerable = false;
        self.stun_remaining = 0.0;
        self.active_attack = None;
        self.combo_count = 0;
        self.input_buffer.clear();
        self.previous_input = TickInput::default();
    }

    pub fn stats(&self) -> &CharacterStats {
        &self.definition.stats
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn state_elapsed(&self) -> Millis {
        self.state_elapsed
    }

    pub fn stun_remaining(&self) -> Millis {
        self.stun_remaining
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    pub fn is_ko(&self) -> bool {
        self.state == CombatState::Ko
    }

    pub fn is_blocking(&self) -> bool {
        self.state == CombatState::Block
    }

    /// Whether an incoming hit can be applied at all
    pub fn can_be_hit(&self) -> bool {
        !self.is_ko() && !self.invulnerable
    }

    pub fn active_attack(&self) -> Option<&ActiveAttack> {
        self.active_attack.as_ref()
    }

    /// The attack if it can connect on this tick
    pub fn live_attack(&self) -> Option<&ActiveAttack> {
        self.active_attack
            .as_ref()
            .filter(|attack| attack.is_live(self.state_elapsed))
    }

    /// Close the attack after it lands; attacks hit at most once
    pub fn mark_attack_landed(&mut self) {
        if let Some(attack) = self.active_attack.as_mut() {
            attack.still_active = false;
        }
    }

    pub fn set_energy(&mut self, energy: f32) {
        self.energy = energy.clamp(0.0, MAX_ENERGY);
    }

    /// Turn toward the opponent while in a neutral state
    pub fn face_towards(&mut self, target_x: f32) {
        if self.state.is_action() {
            return;
        }
        let dx = target_x - self.position.x;
        if dx > 0.5 {
            self.facing = 1;
        } else if dx < -0.5 {
            self.facing = -1;
        }
    }

    /// Record presses, try specials, and apply input-driven transitions.
    /// Input that the current state cannot act on is silently ignored.
    pub fn handle_input(&mut self, input: &TickInput, now: Millis) -> InputOutcome {
        let mut outcome = InputOutcome::default();
        if self.is_ko() {
            self.previous_input = *input;
            return outcome;
        }

        let pressed = input.pressed_since(&self.previous_input);
        self.previous_input = *input;
        for &action in &pressed {
            self.input_buffer.record(action, now);
        }

        if !pressed.is_empty() {
            let matched = MoveMatcher::try_match(
                &mut self.input_buffer,
                now,
                &self.definition.moves,
                self.energy,
            )
            .cloned();
            if let Some(definition) = matched {
                self.start_special(definition.clone());
                outcome.special = Some(definition);
                return outcome;
            }
        }

        match self.state {
            CombatState::Idle | CombatState::Walk => {
                if let Some(kind) = pressed_attack(&pressed) {
                    self.start_attack(kind);
                    outcome.attack = Some(kind);
                } else if pressed.contains(&Action::Jump) && self.grounded {
                    self.velocity.y = -self.stats().jump_force;
                    self.velocity.x = input.horizontal() as f32 * self.stats().walk_speed;
                    self.grounded = false;
                    self.transition(CombatState::Jump);
                    outcome.jumped = true;
                } else if input.block && self.grounded {
                    self.velocity.x = 0.0;
                    self.transition(CombatState::Block);
                } else {
                    self.apply_walk(input.horizontal());
                }
            }
            CombatState::Block => {
                if !input.block && self.stun_remaining <= 0.0 {
                    self.transition(CombatState::Idle);
                    self.apply_walk(input.horizontal());
                }
            }
            _ => {}
        }

        outcome
    }

    /// Advance timers, physics, and energy by one tick
    pub fn update(
        &mut self,
        dt_ms: Millis,
        dt_secs: f32,
        balance: &CombatBalance,
        arena: &ArenaConfig,
    ) {
        if self.is_ko() {
            // Timers and energy stop, but the body still falls
            self.step_body(dt_secs, arena);
            return;
        }

        self.state_elapsed += dt_ms;

        match self.state {
            CombatState::Attack(_) | CombatState::Special(_) => {
                let (total, active_end, invincible) = match self.active_attack.as_ref() {
                    Some(attack) => (
                        attack.frames.total_ms(),
                        attack.frames.active_window_ms().1,
                        attack.effect == EffectKind::Invincible,
                    ),
                    None => (0.0, 0.0, false),
                };
                if invincible && self.state_elapsed >= active_end {
                    self.invulnerable = false;
                }
                if self.state_elapsed >= total {
                    self.transition(CombatState::Idle);
                }
            }
            CombatState::Hit => {
                self.stun_remaining -= dt_ms;
                if self.stun_remaining <= 0.0 {
                    self.transition(CombatState::Idle);
                }
            }
            CombatState::Block => {
                self.stun_remaining = (self.stun_remaining - dt_ms).max(0.0);
            }
            _ => {}
        }

        // Knockback and attack lunges bleed off on the ground
        if self.state.is_action() && self.grounded {
            self.velocity.x *= balance.ground_friction;
            if self.velocity.x.abs() < 1.0 {
                self.velocity.x = 0.0;
            }
        }

        let landed = self.step_body(dt_secs, arena);
        if landed && self.state == CombatState::Jump {
            self.velocity.x = 0.0;
            self.transition(CombatState::Idle);
        }

        if !matches!(self.state, CombatState::Special(_)) {
            self.energy = (self.energy + balance.energy_regen_per_tick).min(MAX_ENERGY);
        }
    }

    /// Enter or extend blockstun. Only meaningful while blocking.
    pub fn enter_blockstun(&mut self, duration: Millis) {
        if self.is_blocking() {
            self.stun_remaining = self.stun_remaining.max(duration);
        }
    }

    /// Enter hitstun, interrupting whatever was happening
    pub fn enter_hitstun(&mut self, duration: Millis) {
        if self.is_ko() {
            return;
        }
        self.transition(CombatState::Hit);
        self.stun_remaining = duration;
        self.invulnerable = true;
    }

    /// Subtract health, clamped at zero. Returns the amount removed.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health - amount.max(0.0)).max(0.0);
        before - self.health
    }

    pub fn apply_knockback(&mut self, velocity_x: f32, velocity_y: f32) {
        self.velocity.x = velocity_x;
        if velocity_y != 0.0 {
            self.velocity.y = velocity_y;
            self.grounded = false;
        }
    }

    /// Terminal state for the rest of the round
    pub fn force_ko(&mut self) {
        if self.is_ko() {
            return;
        }
        debug!(side = ?self.side, character = %self.definition.id, "Knocked out");
        self.transition(CombatState::Ko);
        self.velocity = Vec2::default();
    }

    fn start_attack(&mut self, kind: AttackType) {
        self.velocity.x = 0.0;
        self.transition(CombatState::Attack(kind));
        self.active_attack = Some(ActiveAttack::basic(self.side, kind));
    }

    fn start_special(&mut self, definition: Arc<MoveDefinition>) {
        self.energy = (self.energy - definition.energy_cost).max(0.0);
        self.input_buffer.clear();
        if self.grounded {
            self.velocity.x = 0.0;
        }

        debug!(
            side = ?self.side,
            move_name = %definition.name,
            energy_left = self.energy,
            "Special move triggered"
        );

        self.transition(CombatState::Special(definition.clone()));
        if definition.effect == EffectKind::Invincible {
            self.invulnerable = true;
        }
        self.active_attack = Some(ActiveAttack::special(self.side, &definition));
    }

    /// Integrate one physics step. Returns true on the tick the body lands.
    fn step_body(&mut self, dt_secs: f32, arena: &ArenaConfig) -> bool {
        let (position, velocity, grounded) = PhysicsSystem::update_body(
            self.position,
            self.velocity,
            self.grounded,
            arena,
            dt_secs,
        );
        let landed = grounded && !self.grounded;
        self.position = position;
        self.velocity = velocity;
        self.grounded = grounded;
        landed
    }

    fn apply_walk(&mut self, direction: i8) {
        if direction == 0 {
            self.velocity.x = 0.0;
            if self.state != CombatState::Idle {
                self.transition(CombatState::Idle);
            }
        } else {
            self.velocity.x = direction as f32 * self.stats().walk_speed;
            if self.state != CombatState::Walk {
                self.transition(CombatState::Walk);
            }
        }
    }

    /// Switch state, clearing everything owned by the previous one
    fn transition(&mut self, next: CombatState) {
        trace!(side = ?self.side, from = %self.state, to = %next, "State transition");
        self.state = next;
        self.state_elapsed = 0.0;
        self.stun_remaining = 0.0;
        self.invulnerable = false;
        self.active_attack = None;
    }
}

/// Strongest attack button pressed this tick
fn pressed_attack(pressed: &[Action]) -> Option<AttackType> {
    if pressed.contains(&Action::Heavy) {
        Some(AttackType::Heavy)
    } else if pressed.contains(&Action::Medium) {
        Some(AttackType::Medium)
    } else if pressed.contains(&Action::Light) {
        Some(AttackType::Light)
    } else {
        None
    }
}
