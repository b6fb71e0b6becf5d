//! Incoming-combo tracking for one defender

use crate::config::CombatBalance;
use crate::util::time::Millis;

/// Consecutive unblocked hits taken by one defender
#[derive(Debug, Clone, PartialEq)]
pub struct ComboTracker {
    hit_count: u32,
    last_hit_at: Option<Millis>,
    /// Damage multiplier for the next hit of the combo
    damage_scale: f32,
    window_ms: Millis,
    scaling_factor: f32,
    minimum_scale: f32,
}

impl ComboTracker {
    pub fn new(balance: &CombatBalance) -> Self {
        Self {
            hit_count: 0,
            last_hit_at: None,
            damage_scale: 1.0,
            window_ms: balance.combo_window_ms,
            scaling_factor: balance.combo_scaling_factor,
            minimum_scale: balance.minimum_damage_scale,
        }
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    pub fn last_hit_at(&self) -> Option<Millis> {
        self.last_hit_at
    }

    /// Multiplier the next hit will receive
    pub fn damage_scale(&self) -> f32 {
        self.damage_scale
    }

    /// Reset if the combo window has lapsed since the last hit.
    /// Returns true when a reset happened.
    pub fn expire_if_stale(&mut self, now: Millis) -> bool {
        match self.last_hit_at {
            Some(last) if now - last > self.window_ms => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Count a landed hit. Returns the scale that applies to it.
    pub fn record_hit(&mut self, now: Millis) -> f32 {
        let applied = self.damage_scale;
        self.hit_count += 1;
        self.last_hit_at = Some(now);
        self.damage_scale = self.scale_for(self.hit_count);
        applied
    }

    pub fn reset(&mut self) {
        self.hit_count = 0;
        self.last_hit_at = None;
        self.damage_scale = 1.0;
    }

    /// `max(minimum, 1 - hits * factor)`
    pub fn scale_for(&self, hits: u32) -> f32 {
        (1.0 - hits as f32 * self.scaling_factor).max(self.minimum_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ComboTracker {
        ComboTracker::new(&CombatBalance::default())
    }

    #[test]
    fn first_hit_is_unscaled_and_later_hits_shrink() {
        let mut combo = tracker();

        assert_eq!(combo.record_hit(0.0), 1.0);
        assert!((combo.record_hit(100.0) - 0.9).abs() < 1e-6);
        assert!((combo.record_hit(200.0) - 0.8).abs() < 1e-6);
        assert_eq!(combo.hit_count(), 3);
    }

    #[test]
    fn scale_is_monotonic_and_floored() {
        let combo = tracker();
        let mut previous = f32::INFINITY;
        for hits in 0..50 {
            let scale = combo.scale_for(hits);
            assert!(scale <= previous);
            assert!(scale >= 0.1);
            previous = scale;
        }
        assert_eq!(combo.scale_for(40), 0.1);
    }

    #[test]
    fn combo_expires_after_window() {
        let mut combo = tracker();
        combo.record_hit(0.0);
        combo.record_hit(300.0);

        assert!(!combo.expire_if_stale(800.0));
        assert_eq!(combo.hit_count(), 2);

        assert!(combo.expire_if_stale(801.0));
        assert_eq!(combo.hit_count(), 0);
        assert_eq!(combo.damage_scale(), 1.0);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut combo = tracker();
        combo.record_hit(0.0);
        combo.record_hit(10.0);

        combo.reset();
        combo.reset();

        assert_eq!(combo.hit_count(), 0);
        assert_eq!(combo.damage_scale(), 1.0);
        assert!(combo.last_hit_at().is_none());
    }
}
