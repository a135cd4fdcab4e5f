//! Kirimi Breaker - deterministic breakout core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (collisions, combo scoring, game flow)
//! - `stage`: Stage table, brick layouts (pattern grids, alpha masks) and
//!   progress through the table
//! - `tuning`: Data-driven game balance
//! - `ranking`: Result summaries, grading and leaderboard
//! - `error`: Configuration errors surfaced at stage-load time
//!
//! Rendering, audio, input devices and persistence are external. They read
//! plain data off [`sim::GameState`] and consume [`sim::GameEvent`]s.

pub mod error;
pub mod ranking;
pub mod sim;
pub mod stage;
pub mod tuning;

pub use error::ConfigError;
pub use ranking::{GameSummary, Leaderboard, Rank};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Play-field dimensions (world units, centered on the origin, Y up)
    pub const FIELD_WIDTH: f32 = 16.0;
    pub const FIELD_HEIGHT: f32 = 20.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 3.0;
    pub const PADDLE_HEIGHT: f32 = 0.5;
    /// Distance from the field floor to the paddle center
    pub const PADDLE_FLOOR_OFFSET: f32 = 1.3;
    /// Keyboard-style paddle speed (units/s)
    pub const PADDLE_SPEED: f32 = 10.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.3;
    pub const BALL_SPEED: f32 = 8.0;
    /// Offset of the attached ball above the paddle center
    pub const BALL_LAUNCH_OFFSET: f32 = 0.5;
    /// Launch angle range (degrees from +X)
    pub const LAUNCH_ANGLE_MIN: f32 = 45.0;
    pub const LAUNCH_ANGLE_MAX: f32 = 135.0;

    /// Paddle rebound angles (degrees from +X): left edge, right edge
    pub const REBOUND_ANGLE_LEFT: f32 = 150.0;
    pub const REBOUND_ANGLE_RIGHT: f32 = 30.0;
    /// Minimum |vy| of the unit velocity (prevents horizontal ping-pong)
    pub const MIN_VERTICAL_RATIO: f32 = 0.3;
    /// How far below the paddle bottom a tunneled ball is still recovered
    pub const TUNNEL_MARGIN: f32 = 0.5;
    /// Gap left between the paddle top and a snapped ball
    pub const TUNNEL_SNAP_GAP: f32 = 0.05;

    /// Session defaults
    pub const INITIAL_LIVES: u32 = 5;
    pub const TIME_LIMIT: f32 = 90.0;
    pub const TIME_BONUS_PER_SECOND: u64 = 10;

    /// Brick defaults
    pub const BRICK_WIDTH: f32 = 0.9;
    pub const BRICK_HEIGHT: f32 = 0.9;
    pub const BRICK_SPACING: f32 = 0.05;
    pub const BRICK_SCORE: u32 = 1;
    /// Vertical offset of the layout center above the field center
    pub const LAYOUT_CENTER_Y: f32 = 0.5;
}

/// Unit vector for an angle in degrees measured from +X (90° = straight up)
#[inline]
pub fn direction_from_degrees(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Angle of a vector in degrees measured from +X, in (-180, 180]
#[inline]
pub fn degrees_of(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Linear interpolation, `t` is not clamped
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
