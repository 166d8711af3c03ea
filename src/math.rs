use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::animation;

pub fn wrap_angle(mut radians: f32) -> f32 {
    let two_pi = 2.0 * std::f32::consts::PI;
    while radians > std::f32::consts::PI {
        radians -= two_pi;
    }
    while radians < -std::f32::consts::PI {
        radians += two_pi;
    }
    radians
}

/// Heading from `a` to `b` in radians.
pub fn point_to(a: Vec2, b: Vec2) -> f32 {
    (b.y - a.y).atan2(b.x - a.x)
}

pub fn polar(angle: f32, magnitude: f32) -> Vec2 {
    Vec2::from_angle(angle) * magnitude
}

pub fn lerp_vec2(u: f32, a: Vec2, b: Vec2) -> Vec2 {
    animation::lerp(u, a, b)
}

/// Parameter along the second line `s2 + d2 * t` where it crosses `s1 + d1 * t`.
/// Parallel lines give a non-finite result.
pub fn line_intersect_line_t(s1: Vec2, d1: Vec2, s2: Vec2, d2: Vec2) -> f32 {
    (d1.x * (s1.y - s2.y) + d1.y * (s2.x - s1.x)) / d1.perp_dot(d2)
}

pub fn line_intersect_line_pos(s1: Vec2, d1: Vec2, s2: Vec2, d2: Vec2) -> Vec2 {
    s2 + d2 * line_intersect_line_t(s1, d1, s2, d2)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec2,
    pub dist: f32,
}

/// Nearest crossing of the ray `s1 + d1 * t` with any of `lines` (each `(start, direction)`).
pub fn closest_intersection(s1: Vec2, d1: Vec2, lines: &[(Vec2, Vec2)]) -> Option<RayHit> {
    let mut best: Option<RayHit> = None;
    for &(s2, d2) in lines {
        let point = line_intersect_line_pos(s1, d1, s2, d2);
        if !point.is_finite() || d1.dot(point - s1) <= 0.0 {
            continue;
        }
        let dist = point.distance(s1);
        if best.map_or(true, |hit| dist < hit.dist) {
            best = Some(RayHit { point, dist });
        }
    }
    best
}

pub fn pick_randomly<'a, T, R: Rng + ?Sized>(rng: &mut R, choices: &'a [T]) -> Option<&'a T> {
    choices.choose(rng)
}
