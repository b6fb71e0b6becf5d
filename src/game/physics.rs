//! Fighter physics, stage bounds, and hit/hurt geometry

use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;

/// Fighter hurtbox width
pub const BODY_WIDTH: f32 = 60.0;
/// Fighter hurtbox height
pub const BODY_HEIGHT: f32 = 120.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle, `(x, y)` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Attack reach relative to the attacker's feet, mirrored by facing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRegion {
    /// Distance in front of the body center where the region starts
    pub offset_x: f32,
    /// Height of the region's bottom edge above the feet
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
}

impl HitRegion {
    /// World-space rectangle for an attacker standing at `position`
    pub fn resolve(&self, position: Vec2, facing: i8) -> Rect {
        let x = if facing >= 0 {
            position.x + self.offset_x
        } else {
            position.x - self.offset_x - self.width
        };
        Rect {
            x,
            y: position.y - self.offset_y - self.height,
            width: self.width,
            height: self.height,
        }
    }
}

/// Physics system for updating fighter positions and velocities
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Integrate one tick of motion.
    /// Returns (new_position, new_velocity, grounded)
    pub fn update_body(
        position: Vec2,
        velocity: Vec2,
        grounded: bool,
        arena: &ArenaConfig,
        dt: f32,
    ) -> (Vec2, Vec2, bool) {
        let mut vel = velocity;

        // Gravity only while airborne
        if !grounded || vel.y < 0.0 {
            vel.y += arena.gravity * dt;
        }

        let mut pos = Vec2::new(position.x + vel.x * dt, position.y + vel.y * dt);

        // Ground collision
        let mut now_grounded = false;
        if pos.y >= arena.ground_y {
            pos.y = arena.ground_y;
            vel.y = 0.0;
            now_grounded = true;
        }

        pos.x = Self::clamp_to_arena(pos.x, arena);

        (pos, vel, now_grounded)
    }

    /// Keep the whole body inside the stage
    pub fn clamp_to_arena(x: f32, arena: &ArenaConfig) -> f32 {
        let half = BODY_WIDTH / 2.0;
        x.clamp(arena.left + half, arena.right - half)
    }

    /// Hurtbox of a fighter whose feet are at `position`
    pub fn hurt_region(position: Vec2) -> Rect {
        Rect {
            x: position.x - BODY_WIDTH / 2.0,
            y: position.y - BODY_HEIGHT,
            width: BODY_WIDTH,
            height: BODY_HEIGHT,
        }
    }

    /// Check whether two fighter bodies overlap horizontally and vertically
    pub fn check_body_collision(a: Vec2, b: Vec2) -> bool {
        Self::hurt_region(a).intersects(&Self::hurt_region(b))
    }

    /// Push two overlapping bodies apart along x.
    /// Returns (new_x1, new_x2)
    pub fn resolve_body_collision(x1: f32, x2: f32, arena: &ArenaConfig) -> (f32, f32) {
        let dx = x2 - x1;
        let overlap = BODY_WIDTH - dx.abs();

        if overlap <= 0.0 {
            return (x1, x2); // No collision
        }

        // Same position: push apart arbitrarily, first body to the left
        let dir = if dx.abs() < 0.001 { 1.0 } else { dx.signum() };

        // Push apart by half the overlap each
        let push = overlap / 2.0;
        let target1 = x1 - dir * push;
        let target2 = x2 + dir * push;
        let mut new_x1 = Self::clamp_to_arena(target1, arena);
        let mut new_x2 = Self::clamp_to_arena(target2, arena);

        // Against a wall the free body absorbs the whole push
        if new_x1 != target1 {
            new_x2 = Self::clamp_to_arena(new_x1 + dir * BODY_WIDTH, arena);
        } else if new_x2 != target2 {
            new_x1 = Self::clamp_to_arena(new_x2 - dir * BODY_WIDTH, arena);
        }

        (new_x1, new_x2)
    }
}
