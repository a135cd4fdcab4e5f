//! Power-up fish and the kirimi they release
//!
//! A ball touching a power-up fish consumes it (no bounce) and fans a few
//! kirimi pieces upward. They fall under gravity, bounce off the side walls
//! and score when the paddle or a sub-ball catches them.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::geometry::{circle_intersects_rect, circles_overlap};
use super::state::{FallingKirimi, Field, Paddle, PowerUpFish};
use crate::direction_from_degrees;
use crate::tuning::KirimiTuning;

/// Consume the first live power-up the ball touches; returns its position
pub fn catch_powerup(powerups: &mut [PowerUpFish], pos: Vec2, radius: f32) -> Option<Vec2> {
    let fish = powerups
        .iter_mut()
        .find(|p| p.active && circles_overlap(pos, radius, p.pos, p.radius))?;
    fish.active = false;
    Some(fish.pos)
}

/// Fan `ids.len()` kirimi out of `origin`, centered on straight up
pub fn spawn_kirimi(
    origin: Vec2,
    ids: &[u32],
    rng: &mut Pcg32,
    tuning: &KirimiTuning,
) -> Vec<FallingKirimi> {
    let count = ids.len();
    let step = if count > 1 {
        tuning.spread_angle / (count - 1) as f32
    } else {
        0.0
    };
    let start = 90.0 - tuning.spread_angle / 2.0;

    ids.iter()
        .enumerate()
        .map(|(i, &id)| {
            let gaming = rng.random::<f32>() < tuning.gaming_chance;
            let base = if count > 1 { start + step * i as f32 } else { 90.0 };
            let angle = base + rng.random_range(-tuning.angle_jitter..=tuning.angle_jitter);
            let speed = rng.random_range(tuning.speed_min..=tuning.speed_max);

            if gaming {
                log::debug!("Gaming kirimi spawned at {:?}", origin);
            }

            FallingKirimi {
                id,
                pos: origin,
                vel: direction_from_degrees(angle) * speed,
                radius: if gaming { tuning.radius * 2.0 } else { tuning.radius },
                points: if gaming {
                    tuning.gaming_points
                } else {
                    tuning.normal_points
                },
                gravity_scale: if gaming {
                    tuning.gaming_gravity_scale
                } else {
                    tuning.normal_gravity_scale
                },
                gaming,
            }
        })
        .collect()
}

/// Move, bounce, collect and cull falling kirimi
///
/// `catchers` are extra circles (sub-balls) that collect on contact.
/// Returns the points of every piece collected this step.
pub fn update_kirimi(
    kirimi: &mut Vec<FallingKirimi>,
    paddle: &Paddle,
    catchers: &[(Vec2, f32)],
    field: &Field,
    tuning: &KirimiTuning,
    dt: f32,
) -> Vec<u32> {
    let mut collected = Vec::new();
    let paddle_rect = paddle.rect();

    kirimi.retain_mut(|k| {
        k.vel.y -= tuning.gravity * k.gravity_scale * dt;
        k.pos += k.vel * dt;

        if k.pos.x < field.left() {
            k.pos.x = field.left();
            k.vel.x = k.vel.x.abs() * tuning.wall_restitution;
        } else if k.pos.x > field.right() {
            k.pos.x = field.right();
            k.vel.x = -k.vel.x.abs() * tuning.wall_restitution;
        }

        let caught = circle_intersects_rect(k.pos, k.radius, &paddle_rect)
            || catchers
                .iter()
                .any(|&(c, r)| circles_overlap(k.pos, k.radius, c, r));
        if caught {
            collected.push(k.points);
            return false;
        }

        k.pos.y + k.radius >= field.bottom()
    });

    collected
}
