//! Collision response for balls against walls, the paddle and bricks
//!
//! Pure functions: they take positions and velocities and return the
//! corrected velocity. Scoring, damage and events are the driver's job.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Contact, Rect, circle_intersects_rect, circle_rect_contact, reflect};
use super::state::{Brick, Field, Paddle};
use crate::consts::TUNNEL_SNAP_GAP;
use crate::tuning::ReboundTuning;
use crate::{direction_from_degrees, lerp};

/// How a ball leaves a brick it touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrickBounce {
    /// Invert the axis the ball approached along
    #[default]
    Vertical,
    /// Mirror off the contact normal, then apply the anti-stall floor
    Angled,
}

/// A field wall the ball can bounce off (the floor is not one)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Left,
    Right,
    Ceiling,
}

impl Wall {
    /// Normal pointing into the field
    pub fn normal(self) -> Vec2 {
        match self {
            Wall::Left => Vec2::X,
            Wall::Right => Vec2::NEG_X,
            Wall::Ceiling => Vec2::NEG_Y,
        }
    }
}

/// Walls touched this tick. A corner can touch a side and the ceiling at once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallHits {
    pub side: Option<Wall>,
    pub ceiling: bool,
}

impl WallHits {
    #[inline]
    pub fn any(&self) -> bool {
        self.side.is_some() || self.ceiling
    }
}

/// Find the walls a ball is pressing into (moving toward, and overlapping)
pub fn detect_walls(pos: Vec2, vel: Vec2, radius: f32, field: &Field) -> WallHits {
    let side = if pos.x - radius <= field.left() && vel.x < 0.0 {
        Some(Wall::Left)
    } else if pos.x + radius >= field.right() && vel.x > 0.0 {
        Some(Wall::Right)
    } else {
        None
    };
    WallHits {
        side,
        ceiling: pos.y + radius >= field.top() && vel.y > 0.0,
    }
}

/// Negate the velocity component along the wall normal
///
/// Only applies when the ball is moving into the wall, so a ball that is
/// still overlapping after a bounce is not flipped back.
pub fn resolve_wall_hit(vel: Vec2, wall_normal: Vec2) -> Vec2 {
    if vel.dot(wall_normal) < 0.0 {
        reflect(vel, wall_normal)
    } else {
        vel
    }
}

/// Bounce off every wall in `hits` and pull the ball back inside the field
pub fn apply_wall_hits(pos: &mut Vec2, vel: &mut Vec2, radius: f32, field: &Field, hits: WallHits) {
    if let Some(wall) = hits.side {
        *vel = resolve_wall_hit(*vel, wall.normal());
        pos.x = pos.x.clamp(field.left() + radius, field.right() - radius);
    }
    if hits.ceiling {
        *vel = resolve_wall_hit(*vel, Wall::Ceiling.normal());
        pos.y = pos.y.min(field.top() - radius);
    }
}

/// Where along the paddle the ball struck: -1 left edge, 0 center, 1 right edge
#[inline]
pub fn hit_point(ball_x: f32, paddle_x: f32, half_width: f32) -> f32 {
    if half_width <= 0.0 {
        return 0.0;
    }
    ((ball_x - paddle_x) / half_width).clamp(-1.0, 1.0)
}

/// Rebound angle in degrees for a hit point in [-1, 1]
#[inline]
pub fn rebound_angle(hit_point: f32, left_angle: f32, right_angle: f32) -> f32 {
    lerp(left_angle, right_angle, (hit_point + 1.0) * 0.5)
}

/// Velocity after striking the paddle
///
/// The angle depends only on where the ball hit, never on its incoming
/// direction.
pub fn resolve_paddle_hit(ball_pos: Vec2, paddle: &Rect, speed: f32, rebound: &ReboundTuning) -> Vec2 {
    let hp = hit_point(ball_pos.x, paddle.center.x, paddle.half_size.x);
    let angle = rebound_angle(hp, rebound.left_angle, rebound.right_angle);
    let dir = direction_from_degrees(angle);

    // Shallow tuning angles still have to climb
    enforce_min_vertical(Vec2::new(dir.x, dir.y.max(0.0)), speed, rebound.min_vertical_ratio)
}

/// Restore `|vel| == speed` and keep |vy| at or above `min_ratio * speed`
///
/// A near-zero velocity cannot be renormalized; it is replaced by the
/// shallowest allowed upward heading.
pub fn enforce_min_vertical(vel: Vec2, speed: f32, min_ratio: f32) -> Vec2 {
    let len = vel.length();
    let floor_x = (1.0 - min_ratio * min_ratio).max(0.0).sqrt();

    if len < 1e-6 || !len.is_finite() {
        log::warn!("Degenerate ball velocity {:?}, substituting fallback heading", vel);
        return Vec2::new(floor_x, min_ratio) * speed;
    }

    let mut dir = vel / len;
    if dir.y.abs() < min_ratio {
        let sy = if dir.y < 0.0 { -1.0 } else { 1.0 };
        let sx = if dir.x < 0.0 { -1.0 } else { 1.0 };
        dir = Vec2::new(sx * floor_x, sy * min_ratio);
    }
    dir * speed
}

/// A downward ball overlapping the paddle from above
pub fn paddle_contact(pos: Vec2, vel: Vec2, radius: f32, paddle: &Paddle) -> bool {
    vel.y < 0.0 && pos.y >= paddle.pos.y && circle_intersects_rect(pos, radius, &paddle.rect())
}

/// A downward ball whose center already slipped below the paddle top
///
/// Covers a step that carried the ball past the thin paddle without an
/// overlap ever being observed.
pub fn tunneled_through_paddle(pos: Vec2, vel: Vec2, radius: f32, paddle: &Paddle, margin: f32) -> bool {
    vel.y < 0.0
        && pos.x >= paddle.pos.x - paddle.half_width() - radius
        && pos.x <= paddle.pos.x + paddle.half_width() + radius
        && pos.y < paddle.top()
        && pos.y > paddle.bottom() - margin
}

/// Put a tunneled ball back on top of the paddle
#[inline]
pub fn snap_above_paddle(pos: &mut Vec2, radius: f32, paddle: &Paddle) {
    pos.y = paddle.top() + radius + TUNNEL_SNAP_GAP;
}

/// The single brick a ball touches this tick
///
/// When several overlap (corner between two bricks) the deepest contact
/// wins; ties go to the lowest index.
pub fn find_brick_hit(pos: Vec2, radius: f32, bricks: &[Brick]) -> Option<(usize, Contact)> {
    let mut best: Option<(usize, Contact)> = None;
    for (i, brick) in bricks.iter().enumerate() {
        if !brick.active {
            continue;
        }
        if let Some(contact) = circle_rect_contact(pos, radius, &brick.rect) {
            let deeper = best
                .as_ref()
                .is_none_or(|(_, b)| contact.penetration > b.penetration);
            if deeper {
                best = Some((i, contact));
            }
        }
    }
    best
}

/// Velocity after bouncing off a brick along `normal`
pub fn resolve_brick_bounce(
    vel: Vec2,
    normal: Vec2,
    mode: BrickBounce,
    speed: f32,
    min_ratio: f32,
) -> Vec2 {
    let bounced = match mode {
        BrickBounce::Vertical => {
            let mut v = vel;
            if normal.y.abs() >= normal.x.abs() {
                v.y = normal.y.signum() * vel.y.abs();
            } else {
                v.x = normal.x.signum() * vel.x.abs();
            }
            v
        }
        BrickBounce::Angled => resolve_wall_hit(vel, normal),
    };
    enforce_min_vertical(bounced, speed, min_ratio)
}

/// Push a circle out of the contact it overlaps
#[inline]
pub fn separate(pos: &mut Vec2, contact: &Contact) {
    *pos += contact.normal * contact.penetration;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::degrees_of;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn paddle_rect() -> Rect {
        Rect::new(Vec2::new(0.0, -8.7), Vec2::new(3.0, 0.5))
    }

    #[test]
    fn test_rebound_angle_bounds() {
        assert!((rebound_angle(-1.0, 150.0, 30.0) - 150.0).abs() < 1e-4);
        assert!((rebound_angle(0.0, 150.0, 30.0) - 90.0).abs() < 1e-4);
        assert!((rebound_angle(1.0, 150.0, 30.0) - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_paddle_hit_edges_and_center() {
        let rebound = ReboundTuning::default();
        let rect = paddle_rect();

        let left = resolve_paddle_hit(Vec2::new(-1.5, -8.3), &rect, 8.0, &rebound);
        let center = resolve_paddle_hit(Vec2::new(0.0, -8.3), &rect, 8.0, &rebound);
        let right = resolve_paddle_hit(Vec2::new(1.5, -8.3), &rect, 8.0, &rebound);

        assert!((degrees_of(left) - 150.0).abs() < 1e-3);
        assert!((degrees_of(center) - 90.0).abs() < 1e-3);
        assert!((degrees_of(right) - 30.0).abs() < 1e-3);
        assert!((left.length() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_paddle_hit_beyond_edge_clamps() {
        let rebound = ReboundTuning::default();
        let v = resolve_paddle_hit(Vec2::new(9.0, -8.3), &paddle_rect(), 8.0, &rebound);
        assert!((degrees_of(v) - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_paddle_hit_shallow_angles_forced_up() {
        let rebound = ReboundTuning {
            left_angle: 175.0,
            right_angle: 5.0,
            ..Default::default()
        };
        let v = resolve_paddle_hit(Vec2::new(1.5, -8.3), &paddle_rect(), 8.0, &rebound);
        assert!(v.y / 8.0 >= rebound.min_vertical_ratio - 1e-5);
        assert!((v.length() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_wall_hit_inverts_normal_component() {
        let v = resolve_wall_hit(Vec2::new(-3.0, 4.0), Wall::Left.normal());
        assert_eq!(v, Vec2::new(3.0, 4.0));
        let v = resolve_wall_hit(Vec2::new(3.0, 4.0), Wall::Ceiling.normal());
        assert_eq!(v, Vec2::new(3.0, -4.0));
        // Already leaving: untouched
        let v = resolve_wall_hit(Vec2::new(3.0, 4.0), Wall::Left.normal());
        assert_eq!(v, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_detect_walls_corner() {
        let tuning = Tuning::default();
        let field = Field::new(tuning.field_width, tuning.field_height);
        let hits = detect_walls(Vec2::new(7.9, 9.9), Vec2::new(1.0, 1.0), 0.3, &field);
        assert_eq!(hits.side, Some(Wall::Right));
        assert!(hits.ceiling);

        let none = detect_walls(Vec2::ZERO, Vec2::new(1.0, 1.0), 0.3, &field);
        assert!(!none.any());
    }

    #[test]
    fn test_min_vertical_floor() {
        let v = enforce_min_vertical(Vec2::new(8.0, -0.1), 8.0, 0.3);
        assert!((v.length() - 8.0).abs() < 1e-4);
        assert!((v.y / 8.0 + 0.3).abs() < 1e-5);
        assert!(v.x > 0.0);
    }

    #[test]
    fn test_min_vertical_degenerate_fallback() {
        let v = enforce_min_vertical(Vec2::ZERO, 8.0, 0.3);
        assert!((v.length() - 8.0).abs() < 1e-4);
        assert!((v.y - 2.4).abs() < 1e-4);
    }

    #[test]
    fn test_brick_vertical_bounce() {
        // Ball coming up into the underside of a brick
        let v = resolve_brick_bounce(Vec2::new(2.0, 7.0), Vec2::NEG_Y, BrickBounce::Vertical, 8.0, 0.3);
        assert!(v.y < 0.0);
        assert!(v.x > 0.0);

        // Side hit flips x only
        let v = resolve_brick_bounce(Vec2::new(6.0, 5.0), Vec2::NEG_X, BrickBounce::Vertical, 8.0, 0.3);
        assert!(v.x < 0.0 && v.y > 0.0);
    }

    #[test]
    fn test_corner_between_two_bricks_hits_once() {
        let make = |id: u32, x: f32| Brick {
            id,
            rect: Rect::new(Vec2::new(x, 0.0), Vec2::new(0.9, 0.9)),
            hp: 1,
            max_hp: 1,
            score: 1,
            active: true,
        };
        let bricks = vec![make(1, -0.475), make(2, 0.475)];

        // Centered on the seam, touching both equally: lowest index wins
        let (idx, _) = find_brick_hit(Vec2::new(0.0, -0.6), 0.3, &bricks).unwrap();
        assert_eq!(idx, 0);

        // Closer to the right brick: it wins
        let (idx, _) = find_brick_hit(Vec2::new(0.2, -0.6), 0.3, &bricks).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_tunnel_detection() {
        let tuning = Tuning::default();
        let field = Field::new(tuning.field_width, tuning.field_height);
        let paddle = Paddle::new(&tuning, &field);

        let inside = Vec2::new(0.5, paddle.pos.y);
        assert!(tunneled_through_paddle(inside, Vec2::new(0.0, -8.0), 0.3, &paddle, 0.5));
        // Moving up is never a tunnel
        assert!(!tunneled_through_paddle(inside, Vec2::new(0.0, 8.0), 0.3, &paddle, 0.5));
        // Far to the side
        let beside = Vec2::new(5.0, paddle.pos.y);
        assert!(!tunneled_through_paddle(beside, Vec2::new(0.0, -8.0), 0.3, &paddle, 0.5));

        let mut pos = inside;
        snap_above_paddle(&mut pos, 0.3, &paddle);
        assert!(pos.y > paddle.top() + 0.3);
    }

    proptest! {
        #[test]
        fn prop_paddle_rebound_stays_upward(offset in -3.0f32..3.0, speed in 1.0f32..30.0) {
            let rebound = ReboundTuning::default();
            let rect = paddle_rect();
            let v = resolve_paddle_hit(Vec2::new(offset, -8.3), &rect, speed, &rebound);
            prop_assert!((v.length() - speed).abs() < 1e-3 * speed);
            prop_assert!(v.y >= rebound.min_vertical_ratio * speed - 1e-4);
            let deg = degrees_of(v);
            prop_assert!((30.0 - 1e-3..=150.0 + 1e-3).contains(&deg));
        }

        #[test]
        fn prop_min_vertical_preserves_speed(x in -10.0f32..10.0, y in -10.0f32..10.0) {
            let v = enforce_min_vertical(Vec2::new(x, y), 8.0, 0.3);
            prop_assert!((v.length() - 8.0).abs() < 1e-3);
            prop_assert!(v.y.abs() >= 0.3 * 8.0 - 1e-4);
        }
    }
}
