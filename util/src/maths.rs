//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Clamp a value into `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    value.max(min).min(max)
}

/// Linearly interpolate between `a` and `b`, with `x` clamped to `[0, 1]`.
pub fn interpolate<T>(a: T, b: T, x: T) -> T
where
    T: Float,
{
    let x = clamp(x, T::zero(), T::one());
    a + (b - a) * x
}

/// Whether two values are within `epsilon` of each other (inclusive).
pub fn epsilon_eq<T>(a: T, b: T, epsilon: T) -> bool
where
    T: Float,
{
    (a - epsilon <= b) && (a + epsilon >= b)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// Due to floating point round off the result can equal `rhs.abs()` when
/// `lhs` is a tiny negative number.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle into `(-pi, pi]`.
pub fn wrap_to_pi<T>(angle_rad: T) -> T
where
    T: Float,
{
    let pi = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau = pi + pi;

    let wrapped = pi - rem_euclid(pi - angle_rad, tau);

    // rem_euclid may return tau on round off, which lands us on -pi
    if wrapped <= -pi {
        wrapped + tau
    } else {
        wrapped
    }
}
