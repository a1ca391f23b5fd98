//! Collision tests
//!
//! Everything here is discrete: each test samples the current frame's
//! positions only. Fast movers can tunnel through thin hazards between frames.

use glam::{Vec2, Vec3};

/// Below this squared length a segment is treated as a point
const DEGENERATE_SEGMENT_SQ: f32 = 1e-6;

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Box around a sphere
    pub fn around_sphere(center: Vec3, radius: f32) -> Self {
        Self::from_center(center, Vec3::splat(radius))
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }
}

/// Strict circle overlap (touching circles do not overlap)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// Player centre is over a platform footprint, padded by the player radius
#[inline]
pub fn over_footprint(p: Vec3, radius: f32, center: Vec3, half_extents: Vec2) -> bool {
    p.x > center.x - half_extents.x - radius
        && p.x < center.x + half_extents.x + radius
        && p.z > center.z - half_extents.y - radius
        && p.z < center.z + half_extents.y + radius
}

/// Player sphere sits within `tolerance` of a surface at height `top`
#[inline]
pub fn near_surface(p: Vec3, radius: f32, top: f32, tolerance: f32) -> bool {
    p.y >= top - radius && p.y <= top + radius + tolerance
}

/// Squared distance from `p` to segment `a..b`; `None` for a degenerate segment
pub fn point_segment_distance_sq(p: Vec3, a: Vec3, b: Vec3) -> Option<f32> {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if !(len_sq > DEGENERATE_SEGMENT_SQ) {
        return None;
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    let closest = a + seg * t;
    Some(p.distance_squared(closest))
}

/// Sphere of radius `radius` touches a beam of radius `beam_radius`
///
/// A zero-length beam never touches anything.
pub fn beam_contact(p: Vec3, radius: f32, a: Vec3, b: Vec3, beam_radius: f32) -> bool {
    point_segment_distance_sq(p, a, b)
        .map(|d_sq| d_sq < (radius + beam_radius) * (radius + beam_radius))
        .unwrap_or(false)
}

/// Sphere touches an expanding ring wall (measured on the XZ plane)
pub fn ring_contact(
    p: Vec3,
    radius: f32,
    ring_center: Vec3,
    ring_radius: f32,
    thickness: f32,
) -> bool {
    let horizontal = Vec2::new(p.x - ring_center.x, p.z - ring_center.z).length();
    (horizontal - ring_radius).abs() < thickness / 2.0 + radius
}
