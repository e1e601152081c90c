//! Geometry on the planet surface
//!
//! Everything that moves is glued to a sphere of radius `R` centered on the
//! origin. Motion is expressed as rotation about an axis through the center,
//! which preserves distance from the center, so positions never need to be
//! re-projected onto the surface.

use glam::{Mat3, Quat, Vec3};

/// Squared length below which a direction is treated as degenerate
const DEGENERATE_EPS: f32 = 1e-6;

/// Chord distance between two points
#[inline]
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    a.distance(b)
}

/// Rotate `point` about `axis` (through the world center) by `angle` radians.
///
/// The axis does not need to be unit length. A zero axis leaves the point
/// where it is.
pub fn rotate_around_axis(point: Vec3, axis: Vec3, angle: f32) -> Vec3 {
    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, angle) * point,
        None => point,
    }
}

/// Project `v` onto the tangent plane with the given unit `normal`, normalized.
///
/// Returns `None` when `v` is (nearly) parallel to the normal.
pub fn project_onto_tangent_plane(v: Vec3, normal: Vec3) -> Option<Vec3> {
    let projected = v - normal * v.dot(normal);
    if projected.length_squared() < DEGENERATE_EPS {
        return None;
    }
    projected.try_normalize()
}

/// Outward surface normal ("up") at a point
#[inline]
pub fn surface_normal(point: Vec3) -> Option<Vec3> {
    point.try_normalize()
}

/// Axis that rotates `from` toward `to` along their great circle
pub fn great_circle_axis(from: Vec3, to: Vec3) -> Option<Vec3> {
    let axis = from.cross(to);
    if axis.length_squared() < DEGENERATE_EPS {
        return None;
    }
    axis.try_normalize()
}

/// Orientation with +Y along the surface normal and +Z along `forward`
/// (projected onto the tangent plane).
///
/// Falls back to any tangent direction when `forward` is unusable, so callers
/// always get a valid rotation for a point off the origin.
pub fn surface_frame(position: Vec3, forward: Vec3) -> Quat {
    let Some(up) = surface_normal(position) else {
        return Quat::IDENTITY;
    };
    let forward = project_onto_tangent_plane(forward, up).unwrap_or_else(|| up.any_orthonormal_vector());
    let right = up.cross(forward);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

/// Distribute `count` points over a sphere of `radius` along a spiral
pub fn fibonacci_sphere(count: usize, radius: f32) -> Vec<Vec3> {
    use std::f32::consts::PI;

    let n = count as f32;
    (0..count)
        .map(|i| {
            let phi = (-1.0 + (2.0 * i as f32) / n).acos();
            let theta = (n * PI).sqrt() * phi;
            Vec3::new(
                radius * theta.cos() * phi.sin(),
                radius * theta.sin() * phi.sin(),
                radius * phi.cos(),
            )
        })
        .collect()
}
