//! # Pose algebra
//!
//! Rigid transforms of the plane (SE(2)) used for every pose, pose delta and
//! velocity in the drive software. All types are immutable `Copy` values so
//! they can be shared between threads freely.
//!
//! Units are inches and radians.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod rotation;
mod transform;
mod translation;
mod twist;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use rotation::Rotation;
pub use transform::RigidTransform;
pub use translation::Translation;
pub use twist::Twist;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance below which geometric quantities are treated as zero.
pub const EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A value which can be linearly interpolated towards another of its type.
///
/// `x` is the fraction of the way from `self` to `other`. Implementations
/// for the pose types clamp `x` into `[0, 1]`.
pub trait Interpolable {
    fn interpolate(&self, other: &Self, x: f64) -> Self;
}

impl Interpolable for f64 {
    fn interpolate(&self, other: &Self, x: f64) -> Self {
        util::maths::interpolate(*self, *other, x)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Whether `a` and `b` are within [`EPSILON`] of each other.
pub fn epsilon_eq(a: f64, b: f64) -> bool {
    util::maths::epsilon_eq(a, b, EPSILON)
}
