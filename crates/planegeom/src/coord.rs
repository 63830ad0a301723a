//! Small vector helpers over `geo::Coord<f64>`.
//!
//! All geometry in this crate lives in a local, projected plane: `x` grows to
//! the east and `y` grows to the north, both in metres.

use std::f64::consts::TAU;

use geo::Coord;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Length of the vector `v`.
#[inline] pub fn norm(v: Coord<f64>) -> f64 { v.x.hypot(v.y) }

#[inline] pub fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.x + a.y * b.y }

/// z component of the 3D cross product of `a` and `b`.
#[inline] pub fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.y - a.y * b.x }

/// Orientation of `c` relative to the directed line `a → b`:
/// positive if `c` is to the left, negative if to the right, zero if collinear.
#[inline]
pub fn orientation(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    cross(b - a, c - a)
}

/// Linear interpolation between `a` (t = 0) and `b` (t = 1).
#[inline]
pub fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord { x: a.x + (b.x - a.x) * t, y: a.y + (b.y - a.y) * t }
}

/// Clockwise angle of `v`, seen from above, measured from the positive y
/// axis.  Always in `[0, 2π)`.
#[inline]
pub fn clockwise_angle(v: Coord<f64>) -> f64 {
    let angle = v.x.atan2(v.y);
    if angle < 0.0 { angle + TAU } else { angle }
}

/// Hashable key for exact coordinate matching.  `-0.0` and `0.0` map to the
/// same key.
#[inline]
pub fn coord_key(c: Coord<f64>) -> (u64, u64) {
    ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits())
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    #[test]
    fn clockwise_angle_quadrants() {
        assert_eq!(clockwise_angle(Coord { x: 0.0, y: 1.0 }), 0.0);
        assert!((clockwise_angle(Coord { x: 1.0, y: 0.0 }) - FRAC_PI_2).abs() < 1e-12);
        assert!((clockwise_angle(Coord { x: 0.0, y: -1.0 }) - PI).abs() < 1e-12);
        assert!((clockwise_angle(Coord { x: -1.0, y: 0.0 }) - 3.0 * FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn orientation_sign() {
        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 1.0, y: 0.0 };
        assert!(orientation(a, b, Coord { x: 0.5, y: 1.0 }) > 0.0);
        assert!(orientation(a, b, Coord { x: 0.5, y: -1.0 }) < 0.0);
        assert_eq!(orientation(a, b, Coord { x: 2.0, y: 0.0 }), 0.0);
    }

    #[test]
    fn negative_zero_shares_key() {
        assert_eq!(coord_key(Coord { x: -0.0, y: 1.0 }), coord_key(Coord { x: 0.0, y: 1.0 }));
    }
}
