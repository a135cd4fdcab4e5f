//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (entities are stepped in storage order)
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod bonus;
pub mod collision;
pub mod combo;
pub mod countdown;
pub mod events;
pub mod geometry;
pub mod multiball;
pub mod pickups;
pub mod session;
pub mod skills;
pub mod state;
pub mod tick;

pub use autoplay::{AutoPlayer, AutoPlayerConfig, predict_landing_x};
pub use bonus::BonusRound;
pub use collision::{BrickBounce, Wall, WallHits};
pub use combo::{ComboTier, ComboTracker};
pub use countdown::Countdown;
pub use events::{BusEvent, EventBus, EventListener, GameEvent, ListenerId};
pub use geometry::{Contact, Rect};
pub use multiball::MultiBall;
pub use session::{BallLossOutcome, CompletionTarget, GamePhase, Session};
pub use skills::{Skill, SkillSet};
pub use state::{
    Ball, BallState, BonusFish, Brick, FallingKirimi, Field, GameState, Paddle, PowerUpFish,
    SubBall,
};
pub use tick::{FixedStepper, TickInput, tick};
