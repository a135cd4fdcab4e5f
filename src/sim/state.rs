//! Game state and core simulation types
//!
//! Entities are plain data. Renderers read positions, sizes and active
//! flags straight off [`GameState`]; nothing here knows how it is drawn.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bonus::BonusRound;
use super::combo::ComboTracker;
use super::countdown::Countdown;
use super::events::EventBus;
use super::geometry::Rect;
use super::multiball::MultiBall;
use super::session::Session;
use super::skills::SkillSet;
use super::tick::TickInput;
use crate::stage::{BrickLayout, Cell, StageProgress};
use crate::tuning::Tuning;

/// Ball state - attached to paddle or free-moving
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BallState {
    /// Riding on the paddle at a fixed offset from its center
    Attached { offset: Vec2 },
    Free,
}

/// The main ball. Losing it costs a life
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Constant travel speed while free
    pub speed: f32,
    pub state: BallState,
}

impl Ball {
    pub fn new(id: u32, radius: f32, speed: f32, launch_offset: f32) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius,
            speed,
            state: BallState::Attached {
                offset: Vec2::new(0.0, launch_offset),
            },
        }
    }

    #[inline]
    pub fn is_launched(&self) -> bool {
        matches!(self.state, BallState::Free)
    }

    /// Snap an attached ball to the paddle
    pub fn update_attached(&mut self, paddle: &Paddle) {
        if let BallState::Attached { offset } = self.state {
            self.pos = paddle.pos + offset;
            self.vel = Vec2::ZERO;
        }
    }

    /// Re-attach to the paddle (after a loss or reset)
    pub fn attach(&mut self, paddle: &Paddle, launch_offset: f32) {
        self.state = BallState::Attached {
            offset: Vec2::new(0.0, launch_offset),
        };
        self.update_attached(paddle);
    }

    /// Leave the paddle along `direction` (unit vector)
    pub fn launch(&mut self, direction: Vec2) {
        if matches!(self.state, BallState::Attached { .. }) {
            self.vel = direction.normalize_or(Vec2::Y) * self.speed;
            self.state = BallState::Free;
        }
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Range the paddle center may occupy
    pub min_x: f32,
    pub max_x: f32,
}

impl Paddle {
    pub fn new(tuning: &Tuning, field: &Field) -> Self {
        let half = tuning.paddle_width / 2.0;
        Self {
            pos: Vec2::new(0.0, tuning.paddle_y()),
            width: tuning.paddle_width,
            height: tuning.paddle_height,
            min_x: field.left() + half,
            max_x: field.right() - half,
        }
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y + self.height / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y - self.height / 2.0
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, Vec2::new(self.width, self.height))
    }

    /// Move to `x`, clamped to the movement bounds
    pub fn set_x(&mut self, x: f32) {
        self.pos.x = x.clamp(self.min_x, self.max_x);
    }

    /// Move toward `target_x` by at most `max_speed * dt`
    pub fn move_toward(&mut self, target_x: f32, dt: f32, max_speed: f32) {
        let max_delta = max_speed * dt;
        let delta = (target_x - self.pos.x).clamp(-max_delta, max_delta);
        self.set_x(self.pos.x + delta);
    }
}

/// A destructible brick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: u32,
    pub rect: Rect,
    pub hp: u8,
    pub max_hp: u8,
    pub score: u32,
    pub active: bool,
}

impl Brick {
    /// Apply damage; returns true if this hit destroyed the brick
    pub fn damage(&mut self, amount: u8) -> bool {
        if !self.active {
            return false;
        }
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            self.active = false;
            true
        } else {
            false
        }
    }
}

/// Extra ball from the multi-ball gauge. Never costs a life
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubBall {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub speed: f32,
}

/// Power-up fish placed in the layout. Touching it releases kirimi
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpFish {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub active: bool,
}

/// A falling piece of fish the paddle can catch for points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallingKirimi {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub points: u32,
    pub gravity_scale: f32,
    /// Rare golden piece: slow fall, big payout
    pub gaming: bool,
}

/// Fish swimming across the field during the bonus phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusFish {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

/// Play-field bounds, centered on the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        -self.width / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.width / 2.0
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.height / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        -self.height / 2.0
    }

    pub fn rect(&self) -> Rect {
        Rect::new(Vec2::ZERO, Vec2::new(self.width, self.height))
    }
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Effective balance: `base_tuning` with active skills applied
    pub tuning: Tuning,
    pub base_tuning: Tuning,
    pub field: Field,
    pub paddle: Paddle,
    pub ball: Ball,
    pub bricks: Vec<Brick>,
    pub powerups: Vec<PowerUpFish>,
    pub kirimi: Vec<FallingKirimi>,
    pub multiball: MultiBall,
    pub bonus: BonusRound,
    pub session: Session,
    pub combo: ComboTracker,
    pub countdown: Countdown,
    pub skills: SkillSet,
    /// Position in a stage table, when the run has one
    pub progress: Option<StageProgress>,
    pub events: EventBus,
    /// Simulation tick counter (only advances while active)
    pub time_ticks: u64,
    /// Configured stage, rebuilt on restart
    pub(crate) layout: Option<BrickLayout>,
    /// Commands buffered between ticks
    pub(crate) pending: TickInput,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create an empty game on the title screen
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let field = Field::new(tuning.field_width, tuning.field_height);
        let paddle = Paddle::new(&tuning, &field);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            field,
            paddle,
            ball: Ball::new(0, tuning.ball_radius, tuning.ball_speed, tuning.ball_launch_offset),
            bricks: Vec::new(),
            powerups: Vec::new(),
            kirimi: Vec::new(),
            multiball: MultiBall::default(),
            bonus: BonusRound::default(),
            session: Session::new(&tuning),
            combo: ComboTracker::new(&tuning.combo),
            countdown: Countdown::new(&tuning.countdown),
            skills: SkillSet::default(),
            progress: None,
            events: EventBus::new(),
            time_ticks: 0,
            layout: None,
            pending: TickInput::default(),
            next_id: 1,
            base_tuning: tuning.clone(),
            tuning,
        };

        state.ball.id = state.next_entity_id();
        state.ball.update_attached(&state.paddle);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Bricks still standing
    pub fn active_bricks(&self) -> impl Iterator<Item = &Brick> {
        self.bricks.iter().filter(|b| b.active)
    }

    /// Whether a stage has been configured
    pub fn has_stage(&self) -> bool {
        self.layout.is_some()
    }

    /// Throw away all bricks and power-ups and lay the stage out again
    pub(crate) fn rebuild_bricks(&mut self) {
        self.bricks.clear();
        self.powerups.clear();

        let Some(layout) = self.layout.take() else {
            return;
        };
        for (pos, cell) in layout.placements() {
            match cell {
                Cell::Empty => {}
                Cell::Brick { hp, score } => {
                    let id = self.next_entity_id();
                    self.bricks.push(Brick {
                        id,
                        rect: Rect::new(pos, layout.brick_size),
                        hp,
                        max_hp: hp,
                        score,
                        active: true,
                    });
                }
                Cell::PowerUp => {
                    let id = self.next_entity_id();
                    self.powerups.push(PowerUpFish {
                        id,
                        pos,
                        radius: self.tuning.kirimi.powerup_radius,
                        active: true,
                    });
                }
            }
        }
        self.layout = Some(layout);
    }

    /// Recompute the effective tuning from the active skills
    pub(crate) fn apply_skills(&mut self) {
        self.tuning = self.skills.apply(&self.base_tuning);
        let x = self.paddle.pos.x;
        self.paddle = Paddle::new(&self.tuning, &self.field);
        self.paddle.set_x(x);
        self.ball.update_attached(&self.paddle);
    }

    /// Clear every transient entity and put the ball back on the paddle
    pub(crate) fn reset_entities(&mut self) {
        self.paddle.set_x(0.0);
        self.ball.attach(&self.paddle, self.tuning.ball_launch_offset);
        self.multiball.clear();
        self.kirimi.clear();
        self.bonus.clear();
        self.pending = TickInput::default();
        self.rebuild_bricks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_ball_on_paddle() {
        let state = GameState::new(1, Tuning::default());
        assert!(!state.ball.is_launched());
        let expected = state.paddle.pos + Vec2::new(0.0, state.tuning.ball_launch_offset);
        assert_eq!(state.ball.pos, expected);
        assert!(!state.has_stage());
    }

    #[test]
    fn test_paddle_clamped_to_field() {
        let tuning = Tuning::default();
        let field = Field::new(tuning.field_width, tuning.field_height);
        let mut paddle = Paddle::new(&tuning, &field);

        paddle.set_x(100.0);
        assert_eq!(paddle.pos.x, field.right() - tuning.paddle_width / 2.0);
        paddle.set_x(-100.0);
        assert_eq!(paddle.pos.x, field.left() + tuning.paddle_width / 2.0);
    }

    #[test]
    fn test_paddle_move_toward_respects_speed() {
        let tuning = Tuning::default();
        let field = Field::new(tuning.field_width, tuning.field_height);
        let mut paddle = Paddle::new(&tuning, &field);
        paddle.move_toward(5.0, 0.1, 10.0);
        assert!((paddle.pos.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_brick_damage() {
        let mut brick = Brick {
            id: 1,
            rect: Rect::new(Vec2::ZERO, Vec2::ONE),
            hp: 2,
            max_hp: 2,
            score: 1,
            active: true,
        };
        assert!(!brick.damage(1));
        assert!(brick.active);
        assert!(brick.damage(1));
        assert!(!brick.active);
        // Dead bricks stay dead
        assert!(!brick.damage(1));
    }

    #[test]
    fn test_ball_launch_keeps_speed() {
        let mut ball = Ball::new(1, 0.3, 8.0, 0.5);
        ball.launch(Vec2::new(1.0, 1.0));
        assert!(ball.is_launched());
        assert!((ball.vel.length() - 8.0).abs() < 1e-4);

        // Launching a free ball does nothing
        let vel = ball.vel;
        ball.launch(Vec2::NEG_Y);
        assert_eq!(ball.vel, vel);
    }

    #[test]
    fn test_entity_ids_unique() {
        let mut state = GameState::new(1, Tuning::default());
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert_ne!(a, b);
        assert_ne!(a, state.ball.id);
    }
}
