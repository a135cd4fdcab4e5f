//! Multi-ball gauge and sub-ball bookkeeping
//!
//! Each destroyed brick charges the gauge; a full gauge drops a sub-ball in
//! from the top of the field. Sub-balls score like the main ball but leaving
//! the field just removes them.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::events::{EventBus, GameEvent};
use super::state::{Field, SubBall};
use crate::tuning::MultiBallTuning;

#[derive(Debug, Clone, Default)]
pub struct MultiBall {
    gauge: u32,
    /// Sub-balls spawned this run (used as their display index)
    spawned: usize,
    pub sub_balls: Vec<SubBall>,
}

impl MultiBall {
    pub fn gauge(&self) -> u32 {
        self.gauge
    }

    pub fn active_count(&self) -> usize {
        self.sub_balls.len()
    }

    /// Add charge; returns true when the gauge filled (and was emptied)
    pub fn charge(&mut self, tuning: &MultiBallTuning, events: &mut EventBus) -> bool {
        self.gauge += tuning.gauge_per_brick;
        events.emit(GameEvent::MultiBallGaugeChanged(self.gauge));

        if self.gauge >= tuning.gauge_max {
            self.gauge = 0;
            events.emit(GameEvent::MultiBallGaugeChanged(0));
            true
        } else {
            false
        }
    }

    /// Drop a new sub-ball in near the ceiling, heading down
    pub fn spawn(
        &mut self,
        id: u32,
        rng: &mut Pcg32,
        tuning: &MultiBallTuning,
        field: &Field,
        events: &mut EventBus,
    ) {
        let x = rng.random_range(-tuning.spawn_x_range..=tuning.spawn_x_range);
        let jitter = rng.random_range(-tuning.spawn_jitter..=tuning.spawn_jitter);
        let dir = Vec2::new(jitter, -1.0).normalize();

        let index = self.spawned;
        self.spawned += 1;
        log::debug!("Spawning sub-ball {} at x={:.2}", index, x);

        self.sub_balls.push(SubBall {
            id,
            pos: Vec2::new(x, field.top() - tuning.spawn_top_margin),
            vel: dir * tuning.sub_ball_speed,
            radius: tuning.sub_ball_radius,
            speed: tuning.sub_ball_speed,
        });
        events.emit(GameEvent::SubBallSpawned(index));
    }

    /// Drop sub-balls that fell out of the field
    pub fn remove_escaped(&mut self, field: &Field, events: &mut EventBus) {
        let mut i = 0;
        while i < self.sub_balls.len() {
            let b = &self.sub_balls[i];
            if b.pos.y + b.radius < field.bottom() {
                self.sub_balls.remove(i);
                log::debug!("Sub-ball lost, {} remaining", self.sub_balls.len());
                events.emit(GameEvent::SubBallLost(self.sub_balls.len()));
            } else {
                i += 1;
            }
        }
    }

    /// Empty the gauge and remove every sub-ball
    pub fn clear(&mut self) {
        self.gauge = 0;
        self.spawned = 0;
        self.sub_balls.clear();
    }
}
