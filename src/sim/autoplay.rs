//! Automated player
//!
//! Produces the same [`TickInput`] a human would: waits a moment in Ready,
//! launches, then chases the predicted landing point of the ball with a bit
//! of seeded error so it does not play perfectly.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::session::GamePhase;
use super::state::GameState;
use super::tick::TickInput;
use crate::lerp;

/// Vertical speed below which the ball is treated as not falling
const MIN_FALL_SPEED: f32 = 0.1;
/// Rate at which the paddle drifts to center while the ball rises
const CENTER_DRIFT: f32 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPlayerConfig {
    /// Seconds to wait on the paddle before launching
    pub launch_delay: f32,
    /// Max landing prediction error (± world units)
    pub prediction_error: f32,
    /// 1.0 = normal easing toward the target
    pub reaction_speed: f32,
}

impl Default for AutoPlayerConfig {
    fn default() -> Self {
        Self {
            launch_delay: 1.0,
            prediction_error: 0.5,
            reaction_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutoPlayer {
    config: AutoPlayerConfig,
    rng: Pcg32,
    wait: f32,
    target_x: f32,
    /// Error applied to the current descent
    error: f32,
    was_falling: bool,
}

impl AutoPlayer {
    pub fn new(seed: u64, config: AutoPlayerConfig) -> Self {
        Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            wait: 0.0,
            target_x: 0.0,
            error: 0.0,
            was_falling: false,
        }
    }

    pub fn target_x(&self) -> f32 {
        self.target_x
    }

    /// Decide this tick's input
    pub fn next_input(&mut self, state: &GameState, dt: f32) -> TickInput {
        let mut input = TickInput::default();
        let phase = state.session.phase();
        if !matches!(phase, GamePhase::Ready | GamePhase::Playing | GamePhase::Bonus) {
            self.wait = 0.0;
            return input;
        }

        let ball = &state.ball;
        if !ball.is_launched() {
            self.wait += dt;
            if self.wait >= self.config.launch_delay {
                log::debug!("Autoplayer launching");
                input.launch = true;
                self.wait = 0.0;
            }
            self.target_x = state.paddle.pos.x;
            self.was_falling = false;
            return input;
        }

        let falling = ball.vel.y < -MIN_FALL_SPEED;
        if falling {
            if !self.was_falling {
                let e = self.config.prediction_error;
                self.error = if e > 0.0 {
                    self.rng.random_range(-e..=e)
                } else {
                    0.0
                };
            }
            let left = state.field.left() + ball.radius;
            let right = state.field.right() - ball.radius;
            let landing = predict_landing_x(
                ball.pos.x,
                ball.pos.y,
                ball.vel.x,
                ball.vel.y,
                state.paddle.top() + ball.radius,
                left,
                right,
            );
            self.target_x = (landing + self.error).clamp(state.paddle.min_x, state.paddle.max_x);
        } else {
            self.target_x = lerp(self.target_x, 0.0, (dt * CENTER_DRIFT).min(1.0));
        }
        self.was_falling = falling;

        let t = (dt * 10.0 * self.config.reaction_speed).min(1.0);
        input.target_x = Some(lerp(state.paddle.pos.x, self.target_x, t));
        input
    }
}

/// X where a ball moving in a straight line reaches `target_y`, folding the
/// path back whenever it would cross the `left`/`right` walls
pub fn predict_landing_x(
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    target_y: f32,
    left: f32,
    right: f32,
) -> f32 {
    if vy.abs() < MIN_FALL_SPEED {
        return x;
    }
    let time = (y - target_y) / -vy;
    if time < 0.0 {
        return x;
    }

    let raw = x + vx * time;
    let width = right - left;
    if width <= 0.0 {
        return left;
    }
    let folded = (raw - left).rem_euclid(2.0 * width);
    left + if folded > width { 2.0 * width - folded } else { folded }
}
