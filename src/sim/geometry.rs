//! Axis-aligned rectangle and circle geometry
//!
//! Everything the collision resolver needs: rect bounds, circle-vs-rect
//! overlap via the clamped nearest point, contact normals and reflection.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub half_size: Vec2,
}

impl Rect {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half_size: size * 0.5,
        }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_size: (max - min) * 0.5,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_size
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_size
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.center.x - self.half_size.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.center.x + self.half_size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.center.y + self.half_size.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.center.y - self.half_size.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.half_size.x * 2.0
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.half_size.y * 2.0
    }

    /// Check if a point is inside (edges inclusive)
    pub fn contains_point(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        d.x <= self.half_size.x && d.y <= self.half_size.y
    }

    /// Nearest point on (or in) the rectangle to `p`
    #[inline]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }
}

/// Contact between a circle and a rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Nearest point on the rectangle
    pub point: Vec2,
    /// Unit normal pointing from the rectangle toward the circle center
    pub normal: Vec2,
    /// Overlap depth along the normal
    pub penetration: f32,
}

/// Standard AABB-vs-circle overlap test using the clamped nearest point
#[inline]
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect: &Rect) -> bool {
    let nearest = rect.closest_point(center);
    (center - nearest).length_squared() < radius * radius
}

/// Circle-vs-circle overlap
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    (a - b).length_squared() < r * r
}

/// Full contact info for a circle overlapping a rectangle
///
/// When the circle center is inside the rectangle (deep tunneling) the normal
/// is the axis of least penetration.
pub fn circle_rect_contact(center: Vec2, radius: f32, rect: &Rect) -> Option<Contact> {
    let nearest = rect.closest_point(center);
    let delta = center - nearest;
    let dist_sq = delta.length_squared();

    if dist_sq >= radius * radius {
        return None;
    }

    if dist_sq > f32::EPSILON {
        let dist = dist_sq.sqrt();
        return Some(Contact {
            point: nearest,
            normal: delta / dist,
            penetration: radius - dist,
        });
    }

    // Center inside: push out along the shallowest axis
    let local = center - rect.center;
    let overlap_x = rect.half_size.x - local.x.abs();
    let overlap_y = rect.half_size.y - local.y.abs();
    let (normal, depth) = if overlap_y <= overlap_x {
        (Vec2::new(0.0, sign_or_up(local.y)), overlap_y)
    } else {
        (Vec2::new(sign_or_up(local.x), 0.0), overlap_x)
    };

    Some(Contact {
        point: center - normal * depth,
        normal,
        penetration: depth + radius,
    })
}

/// Reflect a velocity off a surface: v' = v - 2(v·n)n
#[inline]
pub fn reflect(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

#[inline]
fn sign_or_up(v: f32) -> f32 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_rect() -> Rect {
        Rect::new(Vec2::ZERO, Vec2::new(2.0, 1.0))
    }

    #[test]
    fn test_rect_bounds() {
        let r = unit_rect();
        assert_eq!(r.left(), -1.0);
        assert_eq!(r.right(), 1.0);
        assert_eq!(r.top(), 0.5);
        assert_eq!(r.bottom(), -0.5);
        assert_eq!(r.width(), 2.0);
        assert_eq!(r.height(), 1.0);

        let r2 = Rect::from_min_max(Vec2::new(-1.0, -0.5), Vec2::new(1.0, 0.5));
        assert_eq!(r, r2);
    }

    #[test]
    fn test_circle_intersects_rect_sides_and_corner() {
        let r = unit_rect();
        // Above the top edge, overlapping
        assert!(circle_intersects_rect(Vec2::new(0.0, 0.7), 0.3, &r));
        // Above the top edge, clear
        assert!(!circle_intersects_rect(Vec2::new(0.0, 0.9), 0.3, &r));
        // Near the corner: within radius along x and y but not diagonally
        assert!(!circle_intersects_rect(Vec2::new(1.25, 0.75), 0.3, &r));
        assert!(circle_intersects_rect(Vec2::new(1.15, 0.65), 0.3, &r));
        // Center inside
        assert!(circle_intersects_rect(Vec2::ZERO, 0.1, &r));
    }

    #[test]
    fn test_contact_normal_points_to_circle() {
        let r = unit_rect();
        let c = circle_rect_contact(Vec2::new(0.2, 0.7), 0.3, &r).unwrap();
        assert!((c.normal - Vec2::Y).length() < 1e-5);
        assert!((c.penetration - 0.1).abs() < 1e-5);

        let side = circle_rect_contact(Vec2::new(-1.2, 0.0), 0.3, &r).unwrap();
        assert!((side.normal - Vec2::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_contact_center_inside_uses_shallow_axis() {
        let r = unit_rect();
        let c = circle_rect_contact(Vec2::new(0.1, -0.4), 0.2, &r).unwrap();
        assert_eq!(c.normal, Vec2::NEG_Y);
    }

    #[test]
    fn test_reflect() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect(Vec2::new(100.0, 20.0), Vec2::NEG_X);
        assert!((reflected.x + 100.0).abs() < 1e-4);
        assert!((reflected.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0), 1.0));
        assert!(!circles_overlap(Vec2::ZERO, 1.0, Vec2::new(2.5, 0.0), 1.0));
    }
}
