//! Combo scoring
//!
//! Destroying bricks back to back without the ball touching a wall builds a
//! combo; the combo count picks a score multiplier from a tier table.

use serde::{Deserialize, Serialize};

use super::events::{EventBus, GameEvent};
use crate::tuning::ComboTuning;

/// Multiplier applied once the combo count reaches `min_count`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboTier {
    pub min_count: u32,
    pub multiplier: f32,
}

impl ComboTier {
    pub const fn new(min_count: u32, multiplier: f32) -> Self {
        Self {
            min_count,
            multiplier,
        }
    }
}

/// Running combo bookkeeping
#[derive(Debug, Clone)]
pub struct ComboTracker {
    /// Sorted by `min_count` ascending
    tiers: Vec<ComboTier>,
    count: u32,
    multiplier: f32,
    hit_wall_since_last_brick: bool,
    display_time: f32,
    /// Seconds left to show the combo banner
    display_timer: f32,
}

impl ComboTracker {
    pub fn new(tuning: &ComboTuning) -> Self {
        let mut tiers = tuning.tiers.clone();
        tiers.sort_by_key(|t| t.min_count);
        Self {
            tiers,
            count: 0,
            multiplier: 1.0,
            hit_wall_since_last_brick: false,
            display_time: tuning.display_time,
            display_timer: 0.0,
        }
    }

    /// Multiplier for a given combo count (1.0 below the first tier)
    pub fn multiplier_for(&self, count: u32) -> f32 {
        self.tiers
            .iter()
            .rev()
            .find(|t| count >= t.min_count)
            .map_or(1.0, |t| t.multiplier)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn hit_wall_since_last_brick(&self) -> bool {
        self.hit_wall_since_last_brick
    }

    /// Whether a combo banner should currently be visible
    pub fn is_displaying(&self) -> bool {
        self.display_timer > 0.0
    }

    /// The main ball touched a wall. Repeated calls have no extra effect
    pub fn on_wall_hit(&mut self) {
        self.hit_wall_since_last_brick = true;
    }

    /// A brick was destroyed; returns the score to award
    pub fn on_brick_destroyed(&mut self, base_score: u32, events: &mut EventBus) -> u32 {
        if self.hit_wall_since_last_brick {
            if self.count > 1 {
                log::debug!("Combo broken by wall hit at {}", self.count);
                events.emit(GameEvent::ComboEnded {
                    previous: self.count,
                });
            }
            self.count = 1;
            self.hit_wall_since_last_brick = false;
        } else {
            self.count += 1;
        }

        self.multiplier = self.multiplier_for(self.count);

        if self.count >= 2 {
            log::debug!("Combo {}x (multiplier {})", self.count, self.multiplier);
            self.display_timer = self.display_time;
            events.emit(GameEvent::ComboChanged {
                count: self.count,
                multiplier: self.multiplier,
            });
        }

        (base_score as f32 * self.multiplier).round() as u32
    }

    /// Ball lost, restart or return to title
    pub fn reset(&mut self, events: &mut EventBus) {
        if self.count > 1 {
            log::debug!("Combo ended at {}", self.count);
            events.emit(GameEvent::ComboEnded {
                previous: self.count,
            });
        }
        self.count = 0;
        self.multiplier = 1.0;
        self.hit_wall_since_last_brick = false;
        self.display_timer = 0.0;
    }

    /// Decay the display timer
    pub fn update(&mut self, dt: f32) {
        if self.display_timer > 0.0 {
            self.display_timer = (self.display_timer - dt).max(0.0);
        }
    }
}
