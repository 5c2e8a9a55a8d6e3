//! Angle utilities shared by shape geometry and line filtering.
use std::f64::consts::PI;

/// Normalizes an angle into the range [0, π).
#[inline]
pub fn normalize_half_turn(angle: f64) -> f64 {
    let norm = angle.rem_euclid(PI);
    if norm >= PI - 1e-12 {
        0.0
    } else {
        norm
    }
}

/// Angular distance of a Hough normal angle from a vertical line.
///
/// A line in normal form `x·cos θ + y·sin θ = ρ` is vertical for θ = 0 and
/// θ = π, so the distance is folded to [0, π/2].
#[inline]
pub fn deviation_from_vertical(theta: f64) -> f64 {
    let t = normalize_half_turn(theta);
    t.min(PI - t)
}

/// True when the line with normal angle `theta` is within `tolerance` of vertical.
#[inline]
pub fn is_near_vertical(theta: f64, tolerance: f64) -> bool {
    deviation_from_vertical(theta) <= tolerance
}

/// Rotate `p` by `angle` the way shapes rotate in image coordinates
/// (y axis pointing down): `[x cos + y sin, −x sin + y cos]`.
#[inline]
pub fn rotate_image_frame(p: [f64; 2], angle: f64) -> [f64; 2] {
    let (s, c) = angle.sin_cos();
    [p[0] * c + p[1] * s, -p[0] * s + p[1] * c]
}
