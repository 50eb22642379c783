//! # Drivetrain kinematics
//!
//! Forward and inverse kinematics of a differential drive. Skidding of the
//! wheels while turning is modelled with a scrub factor applied to the
//! differential wheel speed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::pose::{RigidTransform, Rotation, Twist, EPSILON};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometry of the drivetrain.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Kinematics {
    /// Distance between the left and right wheels in inches
    pub track_width: f64,

    /// Fraction of the differential wheel speed which turns into rotation
    pub scrub_factor: f64,
}

/// Left and right wheel velocities in inches/second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DriveVelocity {
    pub left: f64,
    pub right: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            track_width: 26.655,
            scrub_factor: 0.924,
        }
    }
}

impl Kinematics {
    /// Forward kinematics from the wheel deltas alone, with the rotation
    /// implied by the difference between the wheels.
    ///
    /// Less accurate than using a gyro, but usable for predicting motion.
    pub fn forward(&self, left_delta: f64, right_delta: f64) -> Twist {
        let delta_v = (right_delta - left_delta) / 2.0 * self.scrub_factor;
        let delta_rotation = delta_v * 2.0 / self.track_width;
        Self::forward_with_rotation(left_delta, right_delta, delta_rotation)
    }

    /// Forward kinematics with an explicitly measured rotation.
    pub fn forward_with_rotation(left_delta: f64, right_delta: f64, delta_rotation: f64) -> Twist {
        Twist::new((left_delta + right_delta) / 2.0, 0.0, delta_rotation)
    }

    /// Forward kinematics between two absolute headings, for instance two
    /// gyro readings.
    pub fn forward_with_gyro(
        prev_heading: &Rotation,
        left_delta: f64,
        right_delta: f64,
        current_heading: &Rotation,
    ) -> Twist {
        Self::forward_with_rotation(
            left_delta,
            right_delta,
            prev_heading.inverse().rotate_by(current_heading).radians(),
        )
    }

    /// Apply a forward kinematics result to a pose.
    pub fn integrate(pose: &RigidTransform, delta: &Twist) -> RigidTransform {
        pose.transform_by(&RigidTransform::exp(delta))
    }

    /// Apply wheel deltas and a new gyro heading to a pose.
    pub fn integrate_with_gyro(
        pose: &RigidTransform,
        left_delta: f64,
        right_delta: f64,
        current_heading: &Rotation,
    ) -> RigidTransform {
        let delta =
            Self::forward_with_gyro(&pose.rotation(), left_delta, right_delta, current_heading);
        Self::integrate(pose, &delta)
    }

    /// Wheel velocities which achieve the given body velocity.
    pub fn inverse(&self, velocity: &Twist) -> DriveVelocity {
        if velocity.dtheta.abs() < EPSILON {
            return DriveVelocity {
                left: velocity.dx,
                right: velocity.dx,
            };
        }

        let delta_v = self.track_width * velocity.dtheta / (2.0 * self.scrub_factor);
        DriveVelocity {
            left: velocity.dx - delta_v,
            right: velocity.dx + delta_v,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pose::Translation;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_straight() {
        let k = Kinematics::default();

        let t = k.forward(10.0, 10.0);
        assert_eq!(t, Twist::new(10.0, 0.0, 0.0));

        let v = k.inverse(&Twist::new(10.0, 0.0, 0.0));
        assert_eq!(v, DriveVelocity { left: 10.0, right: 10.0 });
    }

    #[test]
    fn test_inverse_of_forward() {
        let k = Kinematics::default();

        let v = k.inverse(&Twist::new(20.0, 0.0, 0.5));
        assert!(v.right > v.left);
        assert_abs_diff_eq!((v.left + v.right) / 2.0, 20.0, epsilon = 1e-9);

        let t = k.forward(v.left, v.right);
        assert_abs_diff_eq!(t.dx, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.dtheta, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_gyro_rotation() {
        let t = Kinematics::forward_with_gyro(
            &Rotation::from_degrees(170.0),
            5.0,
            7.0,
            &Rotation::from_degrees(-170.0),
        );
        assert_abs_diff_eq!(t.dx, 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.dtheta, 20f64.to_radians(), epsilon = 1e-9);
    }

    #[test]
    fn test_integrate() {
        let pose = RigidTransform::new(Translation::new(1.0, 2.0), Rotation::from_degrees(90.0));
        let next = Kinematics::integrate_with_gyro(&pose, 10.0, 10.0, &Rotation::from_degrees(90.0));

        assert_abs_diff_eq!(next.translation().x(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(next.translation().y(), 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(next.rotation().degrees(), 90.0, epsilon = 1e-9);
    }
}
