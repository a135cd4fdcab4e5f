//! Data-driven game balance
//!
//! Every number the simulation reads lives here. Defaults come from
//! [`crate::consts`]; a JSON file may override any subset of fields.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, require_non_negative, require_positive};
use crate::sim::collision::BrickBounce;
use crate::sim::combo::ComboTier;
use crate::sim::session::CompletionTarget;

/// Paddle rebound and anti-stall parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReboundTuning {
    /// Rebound angle at the paddle's left edge (degrees)
    pub left_angle: f32,
    /// Rebound angle at the paddle's right edge (degrees)
    pub right_angle: f32,
    /// Minimum |vy| of the unit velocity
    pub min_vertical_ratio: f32,
    /// Recovery band below the paddle for tunneled balls
    pub tunnel_margin: f32,
    /// How balls bounce off bricks
    pub brick_bounce: BrickBounce,
}

impl Default for ReboundTuning {
    fn default() -> Self {
        Self {
            left_angle: REBOUND_ANGLE_LEFT,
            right_angle: REBOUND_ANGLE_RIGHT,
            min_vertical_ratio: MIN_VERTICAL_RATIO,
            tunnel_margin: TUNNEL_MARGIN,
            brick_bounce: BrickBounce::Vertical,
        }
    }
}

/// Combo thresholds and display timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboTuning {
    pub tiers: Vec<ComboTier>,
    /// How long the combo banner stays visible after the last hit (s)
    pub display_time: f32,
}

impl Default for ComboTuning {
    fn default() -> Self {
        Self {
            tiers: vec![
                ComboTier::new(2, 1.5),
                ComboTier::new(3, 2.0),
                ComboTier::new(5, 3.0),
            ],
            display_time: 1.5,
        }
    }
}

/// Countdown sequencing (3, 2, 1, go)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownTuning {
    pub count_interval: f32,
    pub go_display_time: f32,
}

impl Default for CountdownTuning {
    fn default() -> Self {
        Self {
            count_interval: 1.0,
            go_display_time: 0.8,
        }
    }
}

/// Bonus (fever) phase after the last brick falls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusTuning {
    pub duration: f32,
    pub fish_spawn_interval: f32,
    pub fish_speed: f32,
    pub fish_radius: f32,
    pub fish_points: u32,
}

impl Default for BonusTuning {
    fn default() -> Self {
        Self {
            duration: 10.0,
            fish_spawn_interval: 0.3,
            fish_speed: 6.0,
            fish_radius: 0.5,
            fish_points: 1,
        }
    }
}

/// Multi-ball gauge and sub-ball parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiBallTuning {
    pub gauge_max: u32,
    pub gauge_per_brick: u32,
    pub sub_ball_speed: f32,
    pub sub_ball_radius: f32,
    /// Sub-balls spawn at a random X in [-spawn_x_range, spawn_x_range]
    pub spawn_x_range: f32,
    /// Distance below the ceiling where sub-balls appear
    pub spawn_top_margin: f32,
    /// Max horizontal component of the (unnormalized) spawn heading
    pub spawn_jitter: f32,
    /// Sub-balls dropped each time the gauge fills
    pub spawn_count: u32,
    /// Paddle knocks sub-balls back nearly straight up
    pub strong_rebound: bool,
    /// Horizontal speed kept by a strong rebound
    pub rebound_x_scale: f32,
    /// Rising sub-balls steer toward the nearest brick
    pub homing: bool,
    /// Per-tick blend of the heading toward the target
    pub homing_blend: f32,
    /// Max steering rate (degrees/s)
    pub homing_max_turn: f32,
}

impl Default for MultiBallTuning {
    fn default() -> Self {
        Self {
            gauge_max: 10,
            gauge_per_brick: 1,
            sub_ball_speed: BALL_SPEED,
            sub_ball_radius: 0.375,
            spawn_x_range: 2.0,
            spawn_top_margin: 1.0,
            spawn_jitter: 0.3,
            spawn_count: 1,
            strong_rebound: false,
            rebound_x_scale: 0.3,
            homing: false,
            homing_blend: 0.02,
            homing_max_turn: 120.0,
        }
    }
}

/// Falling kirimi spawned by power-up fish
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KirimiTuning {
    pub spawn_count: u32,
    /// Fan width around straight up (degrees)
    pub spread_angle: f32,
    /// Random per-piece angle jitter (± degrees)
    pub angle_jitter: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub gaming_chance: f32,
    pub normal_points: u32,
    pub gaming_points: u32,
    /// Base gravity (units/s²), scaled per kind
    pub gravity: f32,
    pub normal_gravity_scale: f32,
    pub gaming_gravity_scale: f32,
    /// Pickup radius of a normal piece (gaming pieces use double)
    pub radius: f32,
    /// Fraction of horizontal speed kept after a side-wall bounce
    pub wall_restitution: f32,
    /// Pickup radius of a power-up fish
    pub powerup_radius: f32,
}

impl Default for KirimiTuning {
    fn default() -> Self {
        Self {
            spawn_count: 3,
            spread_angle: 60.0,
            angle_jitter: 10.0,
            speed_min: 3.0,
            speed_max: 5.0,
            gaming_chance: 0.05,
            normal_points: 1,
            gaming_points: 10,
            gravity: 9.81,
            normal_gravity_scale: 1.2,
            gaming_gravity_scale: 0.3,
            radius: 0.175,
            wall_restitution: 0.8,
            powerup_radius: 0.5,
        }
    }
}

/// Strength of each acquirable skill
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillTuning {
    /// Paddle width multiplier for BigPaddle
    pub paddle_scale: f32,
    /// Bonus fish speed multiplier for SlowFish
    pub fish_speed_scale: f32,
    /// Gaming kirimi chance with GamingBoost
    pub boosted_gaming_chance: f32,
    /// Extra sub-balls per gauge fill with ExtraKnife
    pub extra_sub_balls: u32,
    /// Skills offered after a cleared stage
    pub choice_count: usize,
}

impl Default for SkillTuning {
    fn default() -> Self {
        Self {
            paddle_scale: 1.5,
            fish_speed_scale: 0.7,
            boosted_gaming_chance: 0.15,
            extra_sub_balls: 1,
            choice_count: 3,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Field ===
    pub field_width: f32,
    pub field_height: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_floor_offset: f32,
    pub paddle_speed: f32,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_speed: f32,
    pub ball_launch_offset: f32,
    pub launch_angle_min: f32,
    pub launch_angle_max: f32,

    // === Session ===
    pub initial_lives: u32,
    pub time_limit: f32,
    pub time_bonus_per_second: u64,
    pub completion: CompletionTarget,
    /// Hit points removed per brick contact
    pub brick_damage: u8,

    // === Subsystems ===
    pub rebound: ReboundTuning,
    pub combo: ComboTuning,
    pub countdown: CountdownTuning,
    pub bonus: BonusTuning,
    pub multiball: MultiBallTuning,
    pub kirimi: KirimiTuning,
    pub skills: SkillTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,

            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_floor_offset: PADDLE_FLOOR_OFFSET,
            paddle_speed: PADDLE_SPEED,

            ball_radius: BALL_RADIUS,
            ball_speed: BALL_SPEED,
            ball_launch_offset: BALL_LAUNCH_OFFSET,
            launch_angle_min: LAUNCH_ANGLE_MIN,
            launch_angle_max: LAUNCH_ANGLE_MAX,

            initial_lives: INITIAL_LIVES,
            time_limit: TIME_LIMIT,
            time_bonus_per_second: TIME_BONUS_PER_SECOND,
            completion: CompletionTarget::Bonus,
            brick_damage: 1,

            rebound: ReboundTuning::default(),
            combo: ComboTuning::default(),
            countdown: CountdownTuning::default(),
            bonus: BonusTuning::default(),
            multiball: MultiBallTuning::default(),
            kirimi: KirimiTuning::default(),
            skills: SkillTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse from JSON (missing fields keep their defaults) and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }

    /// Serialize to pretty JSON (useful as a template for overrides)
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("field_width", self.field_width)?;
        require_positive("field_height", self.field_height)?;
        require_positive("paddle_width", self.paddle_width)?;
        require_positive("paddle_height", self.paddle_height)?;
        require_positive("paddle_speed", self.paddle_speed)?;
        require_positive("ball_radius", self.ball_radius)?;
        require_positive("ball_speed", self.ball_speed)?;
        require_positive("time_limit", self.time_limit)?;
        require_positive("countdown.count_interval", self.countdown.count_interval)?;
        require_positive("bonus.fish_spawn_interval", self.bonus.fish_spawn_interval)?;
        require_positive("multiball.sub_ball_speed", self.multiball.sub_ball_speed)?;

        // Sampled as symmetric ranges or [min, max] ranges during play
        require_non_negative("multiball.spawn_x_range", self.multiball.spawn_x_range)?;
        require_non_negative("multiball.spawn_jitter", self.multiball.spawn_jitter)?;
        require_non_negative("kirimi.angle_jitter", self.kirimi.angle_jitter)?;
        require_non_negative("kirimi.speed_min", self.kirimi.speed_min)?;
        require_non_negative("kirimi.speed_max", self.kirimi.speed_max)?;
        if !(self.launch_angle_min.is_finite() && self.launch_angle_max.is_finite()) {
            return Err(ConfigError::OutOfRange {
                name: "launch_angle_min",
                value: self.launch_angle_min,
                range: "finite degrees",
            });
        }

        if self.paddle_width >= self.field_width {
            return Err(ConfigError::OutOfRange {
                name: "paddle_width",
                value: self.paddle_width,
                range: "(0, field_width)",
            });
        }
        if self.initial_lives == 0 {
            return Err(ConfigError::InvalidDimension {
                name: "initial_lives",
                value: 0.0,
            });
        }
        if self.brick_damage == 0 {
            return Err(ConfigError::InvalidDimension {
                name: "brick_damage",
                value: 0.0,
            });
        }
        if self.multiball.gauge_max == 0 {
            return Err(ConfigError::InvalidDimension {
                name: "multiball.gauge_max",
                value: 0.0,
            });
        }
        if self.multiball.spawn_count == 0 {
            return Err(ConfigError::InvalidDimension {
                name: "multiball.spawn_count",
                value: 0.0,
            });
        }
        require_non_negative("multiball.homing_max_turn", self.multiball.homing_max_turn)?;
        require_unit("multiball.rebound_x_scale", self.multiball.rebound_x_scale)?;
        require_unit("multiball.homing_blend", self.multiball.homing_blend)?;

        require_positive("skills.paddle_scale", self.skills.paddle_scale)?;
        require_positive("skills.fish_speed_scale", self.skills.fish_speed_scale)?;
        require_unit("skills.boosted_gaming_chance", self.skills.boosted_gaming_chance)?;
        if self.skills.choice_count == 0 {
            return Err(ConfigError::InvalidDimension {
                name: "skills.choice_count",
                value: 0.0,
            });
        }

        let ratio = self.rebound.min_vertical_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "rebound.min_vertical_ratio",
                value: ratio,
                range: "(0, 1)",
            });
        }

        require_unit("kirimi.gaming_chance", self.kirimi.gaming_chance)?;
        if self.kirimi.speed_min > self.kirimi.speed_max {
            return Err(ConfigError::OutOfRange {
                name: "kirimi.speed_min",
                value: self.kirimi.speed_min,
                range: "[0, speed_max]",
            });
        }
        if self.launch_angle_min > self.launch_angle_max {
            return Err(ConfigError::OutOfRange {
                name: "launch_angle_min",
                value: self.launch_angle_min,
                range: "[0, launch_angle_max]",
            });
        }

        let mut tiers = self.combo.tiers.clone();
        tiers.sort_by_key(|t| t.min_count);
        let mut last = 1.0_f32;
        for tier in &tiers {
            if tier.multiplier < last {
                return Err(ConfigError::NonMonotonicCombo {
                    min_count: tier.min_count,
                });
            }
            last = tier.multiplier;
        }

        Ok(())
    }

    /// Y of the paddle center
    pub fn paddle_y(&self) -> f32 {
        -self.field_height / 2.0 + self.paddle_floor_offset
    }
}

fn require_unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            range: "[0, 1]",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "ball_speed": 12.0, "initial_lives": 3 }"#).unwrap();
        assert_eq!(tuning.ball_speed, 12.0);
        assert_eq!(tuning.initial_lives, 3);
        assert_eq!(tuning.paddle_width, PADDLE_WIDTH);
        assert_eq!(tuning.combo.tiers.len(), 3);
    }

    #[test]
    fn test_nested_override() {
        let tuning =
            Tuning::from_json(r#"{ "completion": "GameClear", "bonus": { "duration": 4.0 } }"#)
                .unwrap();
        assert_eq!(tuning.completion, CompletionTarget::GameClear);
        assert_eq!(tuning.bonus.duration, 4.0);
        assert_eq!(tuning.bonus.fish_points, 1);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Tuning::from_json(r#"{ "ball_speed": 0.0 }"#),
            Err(ConfigError::InvalidDimension { name: "ball_speed", .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "rebound": { "min_vertical_ratio": 1.5 } }"#),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "initial_lives": 0 }"#),
            Err(ConfigError::InvalidDimension { .. })
        ));
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_negative_spawn_ranges() {
        assert!(matches!(
            Tuning::from_json(r#"{ "multiball": { "spawn_x_range": -1.0 } }"#),
            Err(ConfigError::OutOfRange { name: "multiball.spawn_x_range", .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "multiball": { "spawn_jitter": -0.3 } }"#),
            Err(ConfigError::OutOfRange { name: "multiball.spawn_jitter", .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "kirimi": { "angle_jitter": -5.0 } }"#),
            Err(ConfigError::OutOfRange { name: "kirimi.angle_jitter", .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "kirimi": { "speed_min": -2.0 } }"#),
            Err(ConfigError::OutOfRange { name: "kirimi.speed_min", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_skill_tuning() {
        assert!(matches!(
            Tuning::from_json(r#"{ "skills": { "boosted_gaming_chance": 1.5 } }"#),
            Err(ConfigError::OutOfRange { name: "skills.boosted_gaming_chance", .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "skills": { "paddle_scale": 0.0 } }"#),
            Err(ConfigError::InvalidDimension { name: "skills.paddle_scale", .. })
        ));
        assert!(matches!(
            Tuning::from_json(r#"{ "multiball": { "spawn_count": 0 } }"#),
            Err(ConfigError::InvalidDimension { name: "multiball.spawn_count", .. })
        ));
    }

    #[test]
    fn test_zero_spawn_ranges_allowed() {
        let tuning = Tuning::from_json(
            r#"{ "multiball": { "spawn_x_range": 0.0, "spawn_jitter": 0.0 }, "kirimi": { "angle_jitter": 0.0 } }"#,
        )
        .unwrap();
        assert_eq!(tuning.multiball.spawn_x_range, 0.0);
    }

    #[test]
    fn test_rejects_falling_combo_tiers() {
        let json = r#"{ "combo": { "tiers": [
            { "min_count": 2, "multiplier": 2.0 },
            { "min_count": 4, "multiplier": 1.5 }
        ] } }"#;
        assert!(matches!(
            Tuning::from_json(json),
            Err(ConfigError::NonMonotonicCombo { min_count: 4 })
        ));
    }

    #[test]
    fn test_json_round_trip_template() {
        let json = Tuning::default().to_json().unwrap();
        let back = Tuning::from_json(&json).unwrap();
        assert_eq!(back.time_limit, TIME_LIMIT);
    }

    #[test]
    fn test_paddle_y() {
        let tuning = Tuning::default();
        assert!((tuning.paddle_y() - (-FIELD_HEIGHT / 2.0 + PADDLE_FLOOR_OFFSET)).abs() < 1e-6);
    }
}
