//! Planar translation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

use super::{Interpolable, Rotation};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A translation in the plane, also used as a point or a vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation {
    vec: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Translation {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            vec: Vector2::new(x, y),
        }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// The vector pointing from `start` to `end`.
    pub fn between(start: &Translation, end: &Translation) -> Self {
        Self {
            vec: end.vec - start.vec,
        }
    }

    pub fn x(&self) -> f64 {
        self.vec.x
    }

    pub fn y(&self) -> f64 {
        self.vec.y
    }

    pub fn norm(&self) -> f64 {
        self.vec.norm()
    }

    pub fn norm_squared(&self) -> f64 {
        self.vec.norm_squared()
    }

    /// Add another translation to this one.
    pub fn translate_by(&self, other: &Translation) -> Translation {
        *self + *other
    }

    /// Rotate this translation about the origin.
    pub fn rotate_by(&self, rotation: &Rotation) -> Translation {
        Translation::new(
            self.x() * rotation.cos() - self.y() * rotation.sin(),
            self.x() * rotation.sin() + self.y() * rotation.cos(),
        )
    }

    /// The direction this vector points in.
    pub fn direction(&self) -> Rotation {
        Rotation::new(self.x(), self.y())
    }

    pub fn inverse(&self) -> Translation {
        -*self
    }

    pub fn scale(&self, s: f64) -> Translation {
        *self * s
    }

    /// Point on the line through `self` and `other` at fraction `x`, which
    /// may lie outside `[0, 1]`.
    pub fn extrapolate(&self, other: &Translation, x: f64) -> Translation {
        Translation::between(self, other).scale(x).translate_by(self)
    }

    pub fn dot(&self, other: &Translation) -> f64 {
        self.vec.dot(&other.vec)
    }

    /// z component of the 3D cross product.
    pub fn cross(&self, other: &Translation) -> f64 {
        self.vec.perp(&other.vec)
    }

    /// The unsigned angle between two vectors.
    ///
    /// Degenerate (zero length) vectors give the identity rotation.
    pub fn get_angle(a: &Translation, b: &Translation) -> Rotation {
        let cos_angle = a.dot(b) / (a.norm() * b.norm());
        if cos_angle.is_nan() {
            return Rotation::identity();
        }
        Rotation::from_radians(util::maths::clamp(cos_angle, -1.0, 1.0).acos())
    }
}

impl Add for Translation {
    type Output = Translation;

    fn add(self, rhs: Translation) -> Translation {
        Translation { vec: self.vec + rhs.vec }
    }
}

impl Sub for Translation {
    type Output = Translation;

    fn sub(self, rhs: Translation) -> Translation {
        Translation { vec: self.vec - rhs.vec }
    }
}

impl Neg for Translation {
    type Output = Translation;

    fn neg(self) -> Translation {
        Translation { vec: -self.vec }
    }
}

impl Mul<f64> for Translation {
    type Output = Translation;

    fn mul(self, rhs: f64) -> Translation {
        Translation { vec: self.vec * rhs }
    }
}

impl Interpolable for Translation {
    fn interpolate(&self, other: &Self, x: f64) -> Self {
        if x <= 0.0 {
            *self
        } else if x >= 1.0 {
            *other
        } else {
            self.extrapolate(other, x)
        }
    }
}

impl std::fmt::Display for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x(), self.y())
    }
}
