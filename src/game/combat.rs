//! Combat system - attack tables, hit resolution, damage scaling

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CombatBalance;
use crate::game::character::Character;
use crate::game::combo::ComboTracker;
use crate::game::moves::{EffectKind, FrameData, MoveDefinition};
use crate::game::physics::{HitRegion, PhysicsSystem, Rect, BODY_HEIGHT};
use crate::game::Side;
use crate::util::time::Millis;

/// Attack strength class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    Light,
    Medium,
    Heavy,
    Special,
}

impl AttackType {
    pub fn as_str(self) -> &'static str {
        match self {
            AttackType::Light => "light",
            AttackType::Medium => "medium",
            AttackType::Heavy => "heavy",
            AttackType::Special => "special",
        }
    }

    pub fn profile(self) -> AttackProfile {
        AttackProfile::for_type(self)
    }

    /// Sound cue for a clean hit of this strength
    pub fn hit_sound(self) -> &'static str {
        match self {
            AttackType::Light => "hit_light",
            AttackType::Medium => "hit_medium",
            AttackType::Heavy => "hit_heavy",
            AttackType::Special => "hit_special",
        }
    }

    /// Sound cue for starting the attack
    pub fn swing_sound(self) -> &'static str {
        match self {
            AttackType::Light => "swing_light",
            AttackType::Medium => "swing_medium",
            AttackType::Heavy => "swing_heavy",
            AttackType::Special => "special",
        }
    }
}

/// Per-type attack tuning
#[derive(Debug, Clone, Copy)]
pub struct AttackProfile {
    /// Base damage before any scaling
    pub damage: f32,
    pub frames: FrameData,
    pub region: HitRegion,
    /// Multiplier on the base hitstun duration
    pub stun_multiplier: f64,
    /// Horizontal knockback speed on a clean hit (px/s)
    pub knockback: f32,
}

impl AttackProfile {
    pub fn for_type(attack_type: AttackType) -> Self {
        match attack_type {
            AttackType::Light => Self {
                damage: 5.0,
                frames: FrameData::new(4, 3, 8),
                region: HitRegion {
                    offset_x: 15.0,
                    offset_y: 60.0,
                    width: 60.0,
                    height: 25.0,
                },
                stun_multiplier: 0.75,
                knockback: 150.0,
            },
            AttackType::Medium => Self {
                damage: 10.0,
                frames: FrameData::new(6, 4, 12),
                region: HitRegion {
                    offset_x: 15.0,
                    offset_y: 50.0,
                    width: 75.0,
                    height: 30.0,
                },
                stun_multiplier: 1.0,
                knockback: 250.0,
            },
            AttackType::Heavy => Self {
                damage: 15.0,
                frames: FrameData::new(10, 5, 18),
                region: HitRegion {
                    offset_x: 15.0,
                    offset_y: 40.0,
                    width: 90.0,
                    height: 40.0,
                },
                stun_multiplier: 1.25,
                knockback: 400.0,
            },
            AttackType::Special => Self {
                damage: 20.0,
                frames: FrameData::new(8, 6, 20),
                region: HitRegion {
                    offset_x: 10.0,
                    offset_y: 30.0,
                    width: 90.0,
                    height: 60.0,
                },
                stun_multiplier: 1.5,
                knockback: 450.0,
            },
        }
    }
}

/// An attack in progress. Lives until recovery ends or it lands.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAttack {
    pub owner: Side,
    pub attack_type: AttackType,
    pub damage: f32,
    pub region: HitRegion,
    pub frames: FrameData,
    pub effect: EffectKind,
    /// False once the attack has connected
    pub still_active: bool,
    /// Set for special moves
    pub move_name: Option<String>,
}

impl ActiveAttack {
    pub fn basic(owner: Side, attack_type: AttackType) -> Self {
        let profile = attack_type.profile();
        Self {
            owner,
            attack_type,
            damage: profile.damage,
            region: profile.region,
            frames: profile.frames,
            effect: EffectKind::Strike,
            still_active: true,
            move_name: None,
        }
    }

    pub fn special(owner: Side, definition: &MoveDefinition) -> Self {
        Self {
            owner,
            attack_type: AttackType::Special,
            damage: definition.damage,
            region: definition.hit_region,
            frames: definition.frames,
            effect: definition.effect,
            still_active: true,
            move_name: Some(definition.name.clone()),
        }
    }

    /// Inside the active window and not yet landed
    pub fn is_live(&self, elapsed: Millis) -> bool {
        let (start, end) = self.frames.active_window_ms();
        self.still_active && elapsed >= start && elapsed < end
    }

    /// World-space hit region for the attacker's current position
    pub fn hit_rect(&self, attacker: &Character) -> Rect {
        self.region.resolve(attacker.position, attacker.facing)
    }

    /// Whether this attack currently touches the defender's hurtbox
    pub fn overlaps(&self, attacker: &Character, defender: &Character) -> bool {
        self.hit_rect(attacker)
            .intersects(&PhysicsSystem::hurt_region(defender.position))
    }
}

/// Visual-effect event for a landed or blocked hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitEffect {
    pub x: f32,
    pub y: f32,
    pub attack_type: AttackType,
    pub blocked: bool,
}

/// Result of one resolved hit
#[derive(Debug, Clone, PartialEq)]
pub struct HitOutcome {
    pub damage_dealt: f32,
    pub blocked: bool,
    pub ko_triggered: bool,
    /// Defender's incoming combo length after this hit
    pub combo_hits: u32,
    pub effect: HitEffect,
    pub sound: &'static str,
}

/// Applies attacks to defenders
#[derive(Debug, Clone, Copy)]
pub struct CombatResolver {
    balance: CombatBalance,
}

impl CombatResolver {
    pub fn new(balance: CombatBalance) -> Self {
        Self { balance }
    }

    /// Hitstun for a clean hit of this type
    pub fn hitstun_ms(&self, attack_type: AttackType) -> Millis {
        self.balance.default_hitstun_ms * attack_type.profile().stun_multiplier
    }

    /// Blockstun is half of the matching hitstun
    pub fn blockstun_ms(&self, attack_type: AttackType) -> Millis {
        self.hitstun_ms(attack_type) * 0.5
    }

    /// Resolve `attack` against `defender`.
    ///
    /// Returns `None` without touching anything when the defender cannot be
    /// hit (invulnerable or already KO).
    pub fn resolve_hit(
        &self,
        attacker: &Character,
        defender: &mut Character,
        attack: &ActiveAttack,
        combo: &mut ComboTracker,
        now: Millis,
    ) -> Option<HitOutcome> {
        if !defender.can_be_hit() {
            return None;
        }

        // Stale combos are dropped before this hit is counted
        combo.expire_if_stale(now);

        let base = attack.damage * attacker.stats().attack_power;
        let blocked = defender.is_blocking() && attack.effect != EffectKind::GuardBreak;
        let profile = attack.attack_type.profile();

        let damage = if blocked {
            defender.enter_blockstun(self.blockstun_ms(attack.attack_type));
            base * defender.stats().block_damage_reduction
        } else {
            let scale = combo.record_hit(now);
            defender.enter_hitstun(self.hitstun_ms(attack.attack_type));
            base * scale
        };

        // Push the defender away from the attacker
        let dx = defender.position.x - attacker.position.x;
        let direction = if dx.abs() < 0.001 {
            attacker.facing as f32
        } else {
            dx.signum()
        };
        let (knockback_x, knockback_y) = if blocked {
            (profile.knockback * self.balance.blocked_knockback_factor, 0.0)
        } else if attack.effect == EffectKind::Launcher {
            (profile.knockback * 0.5, -self.balance.launcher_velocity)
        } else {
            (profile.knockback, 0.0)
        };
        defender.apply_knockback(direction * knockback_x, knockback_y);

        let damage_dealt = defender.apply_damage(damage);
        let ko_triggered = defender.health() <= 0.0;
        if ko_triggered {
            defender.force_ko();
        }

        debug!(
            attacker = ?attacker.side,
            attack = attack.attack_type.as_str(),
            damage_dealt,
            blocked,
            combo_hits = combo.hit_count(),
            "Hit resolved"
        );

        let sound = if ko_triggered {
            "ko"
        } else if blocked {
            "block"
        } else {
            attack.attack_type.hit_sound()
        };

        Some(HitOutcome {
            damage_dealt,
            blocked,
            ko_triggered,
            combo_hits: combo.hit_count(),
            effect: HitEffect {
                x: defender.position.x,
                y: defender.position.y - BODY_HEIGHT * 0.6,
                attack_type: attack.attack_type,
                blocked,
            },
            sound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::tests::{fighter, quake};
    use crate::config::ArenaConfig;
    use crate::game::character::CombatState;
    use crate::game::input::{Action, TickInput};
    use crate::util::time::{tick_delta, FRAME_MS};

    /// Let a short stun run out so the defender can be hit again
    fn recover(defender: &mut Character) {
        defender.enter_hitstun(0.0);
        defender.update(1.0, 0.0, &CombatBalance::default(), &ArenaConfig::default());
    }

    fn setup() -> (Character, Character, CombatResolver, ComboTracker) {
        let balance = CombatBalance::default();
        let mut attacker = fighter(Side::One);
        let mut defender = fighter(Side::Two);
        // Stand them within reach of each other
        attacker.position.x = 400.0;
        defender.position.x = 460.0;
        (
            attacker,
            defender,
            CombatResolver::new(balance),
            ComboTracker::new(&balance),
        )
    }

    #[test]
    fn lethal_hit_triggers_ko() {
        let (attacker, mut defender, resolver, mut combo) = setup();
        defender.apply_damage(88.0);
        assert_eq!(defender.health(), 12.0);

        let attack = ActiveAttack::basic(Side::One, AttackType::Heavy);
        let outcome = resolver
            .resolve_hit(&attacker, &mut defender, &attack, &mut combo, 0.0)
            .unwrap();

        assert_eq!(defender.health(), 0.0);
        assert!(outcome.ko_triggered);
        assert_eq!(outcome.damage_dealt, 12.0);
        assert!(defender.is_ko());
        assert_eq!(outcome.sound, "ko");
    }

    #[test]
    fn blocked_hit_deals_reduced_damage_without_combo() {
        let (attacker, mut defender, resolver, mut combo) = setup();
        defender.handle_input(&TickInput::with(&[Action::Block]), 0.0);
        assert!(defender.is_blocking());

        let attack = ActiveAttack::basic(Side::One, AttackType::Medium);
        let outcome = resolver
            .resolve_hit(&attacker, &mut defender, &attack, &mut combo, 0.0)
            .unwrap();

        assert!(outcome.blocked);
        assert_eq!(outcome.damage_dealt, 5.0);
        assert_eq!(defender.health(), 95.0);
        assert!(defender.is_blocking());
        assert!(defender.stun_remaining() > 0.0);
        assert_eq!(combo.hit_count(), 0);
        assert!(outcome.effect.blocked);
    }

    #[test]
    fn clean_hit_enters_hitstun_and_pushes_away() {
        let (attacker, mut defender, resolver, mut combo) = setup();
        let attack = ActiveAttack::basic(Side::One, AttackType::Medium);

        let outcome = resolver
            .resolve_hit(&attacker, &mut defender, &attack, &mut combo, 0.0)
            .unwrap();

        assert_eq!(outcome.damage_dealt, 10.0);
        assert_eq!(*defender.state(), CombatState::Hit);
        assert!(defender.is_invulnerable());
        assert_eq!(defender.stun_remaining(), resolver.hitstun_ms(AttackType::Medium));
        assert!(defender.velocity.x > 0.0);
        assert_eq!(combo.hit_count(), 1);
        assert_eq!(outcome.sound, "hit_medium");
    }

    #[test]
    fn blocked_knockback_is_weaker_than_clean() {
        let (attacker, mut clean, resolver, mut combo) = setup();
        let (_, mut guarded, _, mut guard_combo) = setup();
        guarded.handle_input(&TickInput::with(&[Action::Block]), 0.0);
        let attack = ActiveAttack::basic(Side::One, AttackType::Heavy);

        resolver.resolve_hit(&attacker, &mut clean, &attack, &mut combo, 0.0);
        resolver.resolve_hit(&attacker, &mut guarded, &attack, &mut guard_combo, 0.0);

        assert!(guarded.velocity.x.abs() < clean.velocity.x.abs());
    }

    #[test]
    fn invulnerable_defender_is_untouched() {
        let (attacker, mut defender, resolver, mut combo) = setup();
        let attack = ActiveAttack::basic(Side::One, AttackType::Light);

        resolver.resolve_hit(&attacker, &mut defender, &attack, &mut combo, 0.0);
        let health = defender.health();

        let second = resolver.resolve_hit(&attacker, &mut defender, &attack, &mut combo, 10.0);
        assert!(second.is_none());
        assert_eq!(defender.health(), health);
        assert_eq!(combo.hit_count(), 1);
    }

    #[test]
    fn combo_scaling_reduces_later_hits_and_resets_after_window() {
        let (attacker, mut defender, resolver, mut combo) = setup();
        let attack = ActiveAttack::basic(Side::One, AttackType::Medium);

        let mut dealt = Vec::new();
        for i in 0..4 {
            recover(&mut defender);
            let now = i as f64 * 200.0;
            let outcome = resolver
                .resolve_hit(&attacker, &mut defender, &attack, &mut combo, now)
                .unwrap();
            dealt.push(outcome.damage_dealt);
        }

        assert!((dealt[0] - 10.0).abs() < 1e-4);
        assert!((dealt[1] - 9.0).abs() < 1e-4);
        assert!((dealt[2] - 8.0).abs() < 1e-4);
        assert!(dealt.windows(2).all(|w| w[1] <= w[0]));

        // Past the window the next hit starts a fresh combo
        recover(&mut defender);
        let outcome = resolver
            .resolve_hit(&attacker, &mut defender, &attack, &mut combo, 5000.0)
            .unwrap();
        assert!((outcome.damage_dealt - 10.0).abs() < 1e-4);
        assert_eq!(outcome.combo_hits, 1);
    }

    #[test]
    fn health_never_leaves_its_bounds() {
        let (attacker, mut defender, resolver, mut combo) = setup();
        let special = ActiveAttack::special(Side::One, &quake());

        for i in 0..20 {
            let before = defender.health();
            if defender.is_ko() {
                break;
            }
            recover(&mut defender);
            resolver.resolve_hit(&attacker, &mut defender, &special, &mut combo, i as f64 * 50.0);
            assert!(defender.health() <= before);
            assert!(defender.health() >= 0.0);
        }
    }

    #[test]
    fn guard_break_ignores_block() {
        let (attacker, mut defender, resolver, mut combo) = setup();
        defender.handle_input(&TickInput::with(&[Action::Block]), 0.0);

        let mut attack = ActiveAttack::special(Side::One, &quake());
        attack.effect = EffectKind::GuardBreak;
        let outcome = resolver
            .resolve_hit(&attacker, &mut defender, &attack, &mut combo, 0.0)
            .unwrap();

        assert!(!outcome.blocked);
        assert_eq!(*defender.state(), CombatState::Hit);
    }

    #[test]
    fn launcher_throws_defender_into_the_air() {
        let (attacker, mut struck, resolver, mut combo) = setup();
        let (_, mut launched, _, mut launch_combo) = setup();
        let strike = ActiveAttack::special(Side::One, &quake());
        let mut launcher = strike.clone();
        launcher.effect = EffectKind::Launcher;

        resolver.resolve_hit(&attacker, &mut struck, &strike, &mut combo, 0.0);
        resolver.resolve_hit(&attacker, &mut launched, &launcher, &mut launch_combo, 0.0);

        assert!(struck.grounded);
        assert_eq!(struck.velocity.y, 0.0);
        assert!(!launched.grounded);
        assert_eq!(launched.velocity.y, -CombatBalance::default().launcher_velocity);
        assert!(launched.velocity.x > 0.0);
        assert!(launched.velocity.x < struck.velocity.x);

        // Gravity brings the defender back down
        let arena = ArenaConfig::default();
        for _ in 0..200 {
            launched.update(FRAME_MS, tick_delta(), &CombatBalance::default(), &arena);
        }
        assert!(launched.grounded);
        assert_eq!(launched.position.y, arena.ground_y);
    }

    #[test]
    fn active_window_gates_contact() {
        let attack = ActiveAttack::basic(Side::One, AttackType::Light);
        let (start, end) = attack.frames.active_window_ms();

        assert!(!attack.is_live(start - 1.0));
        assert!(attack.is_live(start));
        assert!(!attack.is_live(end));

        let mut landed = attack.clone();
        landed.still_active = false;
        assert!(!landed.is_live(start));
    }
}
