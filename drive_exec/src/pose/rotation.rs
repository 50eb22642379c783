//! Planar rotation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::UnitComplex;
use serde::{Deserialize, Serialize};

use super::{epsilon_eq, Interpolable, Translation, EPSILON};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A rotation in the plane, stored as a point on the unit circle.
///
/// Composition renormalises the result so that repeated composition does not
/// drift off the unit circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    complex: UnitComplex<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rotation {
    /// The zero rotation.
    pub fn identity() -> Self {
        Self {
            complex: UnitComplex::identity(),
        }
    }

    /// Create a rotation pointing along the vector `(x, y)`.
    ///
    /// A vector too short to have a direction gives the identity.
    pub fn new(x: f64, y: f64) -> Self {
        let magnitude = x.hypot(y);
        if magnitude > EPSILON {
            Self::from_cos_sin(x / magnitude, y / magnitude)
        } else {
            Self::identity()
        }
    }

    pub fn from_radians(angle_rad: f64) -> Self {
        Self::from_cos_sin(angle_rad.cos(), angle_rad.sin())
    }

    pub fn from_degrees(angle_deg: f64) -> Self {
        Self::from_radians(angle_deg.to_radians())
    }

    fn from_cos_sin(cos: f64, sin: f64) -> Self {
        Self {
            complex: UnitComplex::from_cos_sin_unchecked(cos, sin),
        }
    }

    pub fn cos(&self) -> f64 {
        self.complex.cos_angle()
    }

    pub fn sin(&self) -> f64 {
        self.complex.sin_angle()
    }

    /// Tangent of the angle, infinite when the rotation is vertical.
    pub fn tan(&self) -> f64 {
        if self.cos().abs() < EPSILON {
            if self.sin() >= 0.0 {
                std::f64::INFINITY
            } else {
                std::f64::NEG_INFINITY
            }
        } else {
            self.sin() / self.cos()
        }
    }

    /// Angle in `(-pi, pi]`.
    pub fn radians(&self) -> f64 {
        self.sin().atan2(self.cos())
    }

    pub fn degrees(&self) -> f64 {
        self.radians().to_degrees()
    }

    /// Compose two rotations by adding their angles.
    pub fn rotate_by(&self, other: &Rotation) -> Rotation {
        Rotation::new(
            self.cos() * other.cos() - self.sin() * other.sin(),
            self.cos() * other.sin() + self.sin() * other.cos(),
        )
    }

    /// The rotation a quarter turn anticlockwise of this one.
    pub fn normal(&self) -> Rotation {
        Self::from_cos_sin(-self.sin(), self.cos())
    }

    pub fn inverse(&self) -> Rotation {
        Self::from_cos_sin(self.cos(), -self.sin())
    }

    /// Whether the two rotations point along the same line, in either sense.
    pub fn is_parallel(&self, other: &Rotation) -> bool {
        epsilon_eq(self.to_translation().cross(&other.to_translation()), 0.0)
    }

    /// The unit vector along this rotation.
    pub fn to_translation(&self) -> Translation {
        Translation::new(self.cos(), self.sin())
    }
}

impl Interpolable for Rotation {
    /// Interpolate along the shortest arc.
    fn interpolate(&self, other: &Self, x: f64) -> Self {
        if x <= 0.0 {
            return *self;
        } else if x >= 1.0 {
            return *other;
        }

        let angle_diff = self.inverse().rotate_by(other).radians();
        self.rotate_by(&Rotation::from_radians(angle_diff * x))
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3} deg)", self.degrees())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_construction() {
        let rot = Rotation::identity();
        assert_eq!(rot.cos(), 1.0);
        assert_eq!(rot.sin(), 0.0);
        assert_eq!(rot.degrees(), 0.0);

        let rot = Rotation::new(1.0, 1.0);
        assert_abs_diff_eq!(rot.cos(), 0.5_f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(rot.sin(), 0.5_f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(rot.degrees(), 45.0, epsilon = 1e-9);

        // Degenerate vectors fall back to identity
        let rot = Rotation::new(0.0, 0.0);
        assert_eq!(rot.cos(), 1.0);
        assert_eq!(rot.sin(), 0.0);

        let rot = Rotation::from_degrees(30.0);
        assert_abs_diff_eq!(rot.cos(), 3.0_f64.sqrt() / 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(rot.sin(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_and_compose() {
        let rot = Rotation::from_degrees(-30.0).inverse();
        assert_abs_diff_eq!(rot.degrees(), 30.0, epsilon = 1e-9);

        let rot = Rotation::from_degrees(90.0).rotate_by(&Rotation::from_degrees(45.0));
        assert_abs_diff_eq!(rot.degrees(), 135.0, epsilon = 1e-9);

        let rot = Rotation::from_degrees(160.0).rotate_by(&Rotation::from_degrees(40.0));
        assert_abs_diff_eq!(rot.degrees(), -160.0, epsilon = 1e-9);

        let rot = Rotation::from_degrees(10.0).normal();
        assert_abs_diff_eq!(rot.degrees(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tan_and_parallel() {
        assert_eq!(Rotation::from_degrees(90.0).tan(), std::f64::INFINITY);
        assert_eq!(Rotation::from_degrees(-90.0).tan(), std::f64::NEG_INFINITY);
        assert_abs_diff_eq!(Rotation::from_degrees(45.0).tan(), 1.0, epsilon = 1e-9);

        assert!(Rotation::from_degrees(10.0).is_parallel(&Rotation::from_degrees(190.0)));
        assert!(!Rotation::from_degrees(10.0).is_parallel(&Rotation::from_degrees(100.0)));
    }

    #[test]
    fn test_interpolate_shortest_arc() {
        let a = Rotation::from_degrees(170.0);
        let b = Rotation::from_degrees(-170.0);
        assert_abs_diff_eq!(a.interpolate(&b, 0.5).degrees().abs(), 180.0, epsilon = 1e-9);

        let a = Rotation::from_degrees(10.0);
        let b = Rotation::from_degrees(50.0);
        assert_abs_diff_eq!(a.interpolate(&b, 0.25).degrees(), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a.interpolate(&b, 2.0).degrees(), 50.0, epsilon = 1e-9);
    }
}
