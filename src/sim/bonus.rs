//! Bonus (fever) phase fish school
//!
//! Once every brick is gone, fish swim across the upper field left to right
//! and each one a ball touches is worth points.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::geometry::circles_overlap;
use super::state::{BonusFish, Field};
use crate::tuning::BonusTuning;

/// Fraction of the field height (from the top) fish may swim in
const SWIM_BAND: f32 = 0.8;

#[derive(Debug, Clone, Default)]
pub struct BonusRound {
    active: bool,
    spawn_timer: f32,
    pub fish: Vec<BonusFish>,
}

impl BonusRound {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begin spawning. The first fish appears on the next update
    pub fn start(&mut self) {
        self.active = true;
        self.spawn_timer = 0.0;
        self.fish.clear();
    }

    pub fn clear(&mut self) {
        self.active = false;
        self.spawn_timer = 0.0;
        self.fish.clear();
    }

    /// Swim existing fish, cull those past the right wall and return how many
    /// new fish are due
    pub fn update(&mut self, dt: f32, field: &Field, tuning: &BonusTuning) -> u32 {
        if !self.active {
            return 0;
        }

        for f in &mut self.fish {
            f.pos += f.vel * dt;
        }
        self.fish.retain(|f| f.pos.x - f.radius <= field.right());

        let mut due = 0;
        self.spawn_timer -= dt;
        while self.spawn_timer <= 0.0 {
            due += 1;
            self.spawn_timer += tuning.fish_spawn_interval;
        }
        due
    }

    /// Add one fish just off the left wall at a random height
    pub fn spawn(&mut self, id: u32, rng: &mut Pcg32, field: &Field, tuning: &BonusTuning) {
        let low = field.top() - field.height * SWIM_BAND;
        let high = (field.top() - tuning.fish_radius).max(low);
        let y = rng.random_range(low..=high);

        self.fish.push(BonusFish {
            id,
            pos: Vec2::new(field.left() - tuning.fish_radius, y),
            vel: Vec2::new(tuning.fish_speed, 0.0),
            radius: tuning.fish_radius,
        });
    }

    /// Remove the first fish touching the circle; returns where it was
    pub fn catch(&mut self, pos: Vec2, radius: f32) -> Option<Vec2> {
        let idx = self
            .fish
            .iter()
            .position(|f| circles_overlap(pos, radius, f.pos, f.radius))?;
        Some(self.fish.remove(idx).pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn field() -> Field {
        Field::new(16.0, 20.0)
    }

    #[test]
    fn test_inactive_spawns_nothing() {
        let mut round = BonusRound::default();
        assert_eq!(round.update(1.0, &field(), &BonusTuning::default()), 0);
    }

    #[test]
    fn test_spawn_cadence() {
        let tuning = BonusTuning::default();
        let mut round = BonusRound::default();
        round.start();

        // Immediate first fish, then one per interval
        assert_eq!(round.update(0.01, &field(), &tuning), 1);
        assert_eq!(round.update(0.1, &field(), &tuning), 0);
        assert_eq!(round.update(0.2, &field(), &tuning), 1);
        assert_eq!(round.update(0.9, &field(), &tuning), 3);
    }

    #[test]
    fn test_fish_swim_in_band_and_leave() {
        let tuning = BonusTuning::default();
        let mut round = BonusRound::default();
        let mut rng = Pcg32::seed_from_u64(11);
        round.start();
        for id in 0..50 {
            round.spawn(id, &mut rng, &field(), &tuning);
        }
        for f in &round.fish {
            assert!(f.pos.y >= field().top() - 16.0 - 1e-4);
            assert!(f.pos.y <= field().top());
            assert!(f.vel.x > 0.0);
        }

        // Long enough to cross the field
        round.update(10.0, &field(), &tuning);
        assert!(round.fish.is_empty());
    }

    #[test]
    fn test_catch_removes_fish() {
        let tuning = BonusTuning::default();
        let mut round = BonusRound::default();
        let mut rng = Pcg32::seed_from_u64(11);
        round.start();
        round.spawn(1, &mut rng, &field(), &tuning);
        let at = round.fish[0].pos;

        assert_eq!(round.catch(at + Vec2::new(0.3, 0.0), 0.3), Some(at));
        assert!(round.fish.is_empty());
        assert_eq!(round.catch(at, 0.3), None);
    }
}
