//! Skills picked between stages
//!
//! A skill is permanent for the rest of the run and is dropped on return to
//! title. Skills never touch the simulation directly: [`SkillSet::apply`]
//! folds them into an effective [`Tuning`] that the tick reads as usual.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;
use crate::{degrees_of, direction_from_degrees};

/// Widest a skill can make the paddle, as a share of the field
const MAX_PADDLE_SHARE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    /// Wider paddle
    BigPaddle,
    /// Paddle sends sub-balls back nearly straight up
    KnifeRebound,
    /// Rising sub-balls drift toward the nearest brick
    KnifeHoming,
    /// One more sub-ball per gauge fill
    ExtraKnife,
    /// Bonus fish swim slower
    SlowFish,
    /// Gaming kirimi show up more often
    GamingBoost,
}

impl Skill {
    pub const ALL: [Skill; 6] = [
        Skill::BigPaddle,
        Skill::KnifeRebound,
        Skill::KnifeHoming,
        Skill::ExtraKnife,
        Skill::SlowFish,
        Skill::GamingBoost,
    ];
}

/// Skills acquired this run plus any offer waiting on a choice
#[derive(Debug, Clone, Default)]
pub struct SkillSet {
    active: Vec<Skill>,
    offer: Vec<Skill>,
}

impl SkillSet {
    pub fn has(&self, skill: Skill) -> bool {
        self.active.contains(&skill)
    }

    /// Acquired skills in pick order
    pub fn active(&self) -> &[Skill] {
        &self.active
    }

    /// Choices currently on offer (empty when none is pending)
    pub fn offer(&self) -> &[Skill] {
        &self.offer
    }

    /// Draw up to `count` distinct skills not yet owned
    ///
    /// Returns the existing offer unchanged if one is already pending.
    pub fn make_offer(&mut self, rng: &mut Pcg32, count: usize) -> &[Skill] {
        if !self.offer.is_empty() {
            log::warn!("Skill offer already pending");
            return &self.offer;
        }
        let mut available: Vec<Skill> = Skill::ALL
            .iter()
            .copied()
            .filter(|s| !self.has(*s))
            .collect();
        available.shuffle(rng);
        available.truncate(count);
        log::debug!("Offering skills {:?}", available);
        self.offer = available;
        &self.offer
    }

    /// Take one of the offered skills. Anything else is refused
    pub fn choose(&mut self, skill: Skill) -> bool {
        if !self.offer.contains(&skill) {
            return false;
        }
        self.offer.clear();
        self.active.push(skill);
        log::info!("Skill acquired: {:?}", skill);
        true
    }

    /// Drop a pending offer without choosing
    pub fn discard_offer(&mut self) {
        self.offer.clear();
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.offer.clear();
    }

    /// Effective tuning with every active skill applied to `base`
    pub fn apply(&self, base: &Tuning) -> Tuning {
        let mut tuning = base.clone();
        let skills = &base.skills;
        for skill in &self.active {
            match skill {
                Skill::BigPaddle => {
                    tuning.paddle_width = (tuning.paddle_width * skills.paddle_scale)
                        .min(tuning.field_width * MAX_PADDLE_SHARE)
                        .max(base.paddle_width);
                }
                Skill::KnifeRebound => tuning.multiball.strong_rebound = true,
                Skill::KnifeHoming => tuning.multiball.homing = true,
                Skill::ExtraKnife => tuning.multiball.spawn_count += skills.extra_sub_balls,
                Skill::SlowFish => tuning.bonus.fish_speed *= skills.fish_speed_scale,
                Skill::GamingBoost => {
                    tuning.kirimi.gaming_chance =
                        tuning.kirimi.gaming_chance.max(skills.boosted_gaming_chance);
                }
            }
        }
        tuning
    }
}

/// Paddle rebound of a sub-ball: always upward, and nearly vertical when
/// `strong` is set
pub fn sub_ball_rebound(vel: Vec2, speed: f32, strong: bool, x_scale: f32) -> Vec2 {
    let mut vel = Vec2::new(vel.x, vel.y.abs());
    if strong {
        vel.x *= x_scale;
    }
    vel.normalize_or(Vec2::Y) * speed
}

/// Turn `vel` a little toward `target`, at most `max_turn` degrees
pub fn steer_toward(vel: Vec2, target: Vec2, blend: f32, max_turn: f32) -> Vec2 {
    let speed = vel.length();
    let (Some(dir), Some(to_target)) = (vel.try_normalize(), target.try_normalize()) else {
        return vel;
    };
    let Some(blended) = dir.lerp(to_target, blend).try_normalize() else {
        return vel;
    };

    let mut turn = degrees_of(blended) - degrees_of(dir);
    if turn > 180.0 {
        turn -= 360.0;
    } else if turn < -180.0 {
        turn += 360.0;
    }
    let turn = turn.clamp(-max_turn, max_turn);
    direction_from_degrees(degrees_of(dir) + turn) * speed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn offer_all(set: &mut SkillSet) -> Vec<Skill> {
        let mut rng = Pcg32::seed_from_u64(3);
        set.make_offer(&mut rng, Skill::ALL.len()).to_vec()
    }

    #[test]
    fn test_offer_is_distinct_and_unowned() {
        let mut set = SkillSet::default();
        let mut rng = Pcg32::seed_from_u64(11);

        let first = set.make_offer(&mut rng, 3).to_vec();
        assert_eq!(first.len(), 3);
        assert!(set.choose(first[1]));
        assert!(set.offer().is_empty());

        let second = set.make_offer(&mut rng, 10).to_vec();
        assert_eq!(second.len(), 5);
        assert!(!second.contains(&first[1]));
        let mut dedup = second.clone();
        dedup.sort_by_key(|s| *s as u8);
        dedup.dedup();
        assert_eq!(dedup.len(), second.len());
    }

    #[test]
    fn test_offer_is_seeded() {
        let a = SkillSet::default().make_offer(&mut Pcg32::seed_from_u64(5), 3).to_vec();
        let b = SkillSet::default().make_offer(&mut Pcg32::seed_from_u64(5), 3).to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn test_choose_only_from_offer() {
        let mut set = SkillSet::default();
        assert!(!set.choose(Skill::BigPaddle));

        let offer = offer_all(&mut set);
        assert!(set.choose(offer[0]));
        assert!(!set.choose(offer[1]));
        assert_eq!(set.active(), &[offer[0]]);
    }

    #[test]
    fn test_everything_owned_gives_empty_offer() {
        let mut set = SkillSet::default();
        for _ in 0..Skill::ALL.len() {
            let offer = offer_all(&mut set);
            assert!(set.choose(offer[0]));
        }
        assert!(offer_all(&mut set).is_empty());
    }

    #[test]
    fn test_apply_folds_into_tuning() {
        let base = Tuning::default();
        let mut set = SkillSet::default();
        for skill in Skill::ALL {
            set.offer = vec![skill];
            assert!(set.choose(skill));
        }
        let t = set.apply(&base);

        assert!((t.paddle_width - base.paddle_width * 1.5).abs() < 1e-5);
        assert!((t.bonus.fish_speed - base.bonus.fish_speed * 0.7).abs() < 1e-5);
        assert_eq!(t.kirimi.gaming_chance, 0.15);
        assert_eq!(t.multiball.spawn_count, base.multiball.spawn_count + 1);
        assert!(t.multiball.strong_rebound);
        assert!(t.multiball.homing);
        assert!(t.validate().is_ok());

        // Base untouched, no skills is identity
        assert_eq!(SkillSet::default().apply(&base).paddle_width, base.paddle_width);
    }

    #[test]
    fn test_big_paddle_capped() {
        let mut base = Tuning::default();
        base.skills.paddle_scale = 10.0;
        let mut set = SkillSet::default();
        set.offer = vec![Skill::BigPaddle];
        set.choose(Skill::BigPaddle);
        assert_eq!(set.apply(&base).paddle_width, base.field_width * MAX_PADDLE_SHARE);
    }

    #[test]
    fn test_sub_ball_rebound() {
        let v = sub_ball_rebound(Vec2::new(6.0, -6.0), 8.0, false, 0.3);
        assert!(v.y > 0.0);
        assert!((v.x - v.y).abs() < 1e-4);
        assert!((v.length() - 8.0).abs() < 1e-4);

        let strong = sub_ball_rebound(Vec2::new(6.0, -6.0), 8.0, true, 0.3);
        assert!(strong.y > v.y);
        assert!(strong.x > 0.0 && strong.x < v.x);
        assert!((strong.length() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_steer_toward_is_bounded() {
        let vel = Vec2::new(0.0, 8.0);
        let steered = steer_toward(vel, Vec2::new(1.0, 0.0), 0.5, 1.0);
        assert!(steered.x > 0.0);
        assert!((steered.length() - 8.0).abs() < 1e-4);
        assert!((degrees_of(steered) - 89.0).abs() < 1e-3);

        // Small blend turns less than the cap
        let gentle = steer_toward(vel, Vec2::new(1.0, 0.0), 0.02, 10.0);
        assert!(degrees_of(gentle) > 88.0 && degrees_of(gentle) < 90.0);

        // Degenerate target leaves the ball alone
        assert_eq!(steer_toward(vel, Vec2::ZERO, 0.5, 1.0), vel);
    }
}
