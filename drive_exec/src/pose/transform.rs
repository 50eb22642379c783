//! Rigid transforms

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{epsilon_eq, Interpolable, Rotation, Translation, Twist, EPSILON};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A translation followed by a rotation, i.e. a pose in some parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RigidTransform {
    translation: Translation,
    rotation: Rotation,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RigidTransform {
    pub fn new(translation: Translation, rotation: Rotation) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_translation(translation: Translation) -> Self {
        Self::new(translation, Rotation::identity())
    }

    pub fn from_rotation(rotation: Rotation) -> Self {
        Self::new(Translation::identity(), rotation)
    }

    pub fn translation(&self) -> Translation {
        self.translation
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// The transform reached by driving along `delta` for unit time.
    pub fn exp(delta: &Twist) -> RigidTransform {
        let sin_theta = delta.dtheta.sin();
        let cos_theta = delta.dtheta.cos();

        let (s, c) = if delta.dtheta.abs() < EPSILON {
            (
                1.0 - delta.dtheta * delta.dtheta / 6.0,
                0.5 * delta.dtheta,
            )
        } else {
            (
                sin_theta / delta.dtheta,
                (1.0 - cos_theta) / delta.dtheta,
            )
        };

        RigidTransform::new(
            Translation::new(
                delta.dx * s - delta.dy * c,
                delta.dx * c + delta.dy * s,
            ),
            Rotation::new(cos_theta, sin_theta),
        )
    }

    /// The twist which `exp` maps onto this transform.
    pub fn log(&self) -> Twist {
        let dtheta = self.rotation.radians();
        let half_dtheta = 0.5 * dtheta;
        let cos_minus_one = self.rotation.cos() - 1.0;

        let half_theta_by_tan_of_half_dtheta = if cos_minus_one.abs() < EPSILON {
            1.0 - dtheta * dtheta / 12.0
        } else {
            -(half_dtheta * self.rotation.sin()) / cos_minus_one
        };

        // Rotate by (half_theta_by_tan, -half_dtheta), which is not a unit
        // vector so the rotation type can't be used here
        let a = half_theta_by_tan_of_half_dtheta;
        let b = -half_dtheta;
        let t = self.translation;

        Twist::new(t.x() * a - t.y() * b, t.x() * b + t.y() * a, dtheta)
    }

    /// Compose two transforms, `other` being expressed in the frame of
    /// `self`. Not commutative.
    pub fn transform_by(&self, other: &RigidTransform) -> RigidTransform {
        RigidTransform::new(
            self.translation
                .translate_by(&other.translation.rotate_by(&self.rotation)),
            self.rotation.rotate_by(&other.rotation),
        )
    }

    pub fn inverse(&self) -> RigidTransform {
        let rotation_inverted = self.rotation.inverse();
        RigidTransform::new(
            self.translation.inverse().rotate_by(&rotation_inverted),
            rotation_inverted,
        )
    }

    /// The same position with the heading turned a quarter turn
    /// anticlockwise.
    pub fn normal(&self) -> RigidTransform {
        RigidTransform::new(self.translation, self.rotation.normal())
    }

    /// Where the heading rays of the two transforms cross.
    ///
    /// Parallel rays give `(+inf, +inf)`.
    pub fn intersection(&self, other: &RigidTransform) -> Translation {
        if self.rotation.is_parallel(&other.rotation) {
            return Translation::new(std::f64::INFINITY, std::f64::INFINITY);
        }

        // Solve using the tangent of whichever ray is further from vertical
        if self.rotation.cos().abs() < other.rotation.cos().abs() {
            Self::intersection_internal(self, other)
        } else {
            Self::intersection_internal(other, self)
        }
    }

    /// Whether `other` lies on the heading line of `self` with the same
    /// heading.
    pub fn is_colinear(&self, other: &RigidTransform) -> bool {
        let twist = self.inverse().transform_by(other).log();
        epsilon_eq(twist.dy, 0.0) && epsilon_eq(twist.dtheta, 0.0)
    }

    fn intersection_internal(a: &RigidTransform, b: &RigidTransform) -> Translation {
        let a_r = a.rotation;
        let b_r = b.rotation;
        let a_t = a.translation;
        let b_t = b.translation;

        let tan_b = b_r.tan();
        let t = ((a_t.x() - b_t.x()) * tan_b + b_t.y() - a_t.y())
            / (a_r.sin() - a_r.cos() * tan_b);

        a_t.translate_by(&a_r.to_translation().scale(t))
    }
}

impl Interpolable for RigidTransform {
    /// Interpolate along the constant curvature arc joining the two poses.
    fn interpolate(&self, other: &Self, x: f64) -> Self {
        if x <= 0.0 {
            return *self;
        } else if x >= 1.0 {
            return *other;
        }

        let twist = self.inverse().transform_by(other).log();
        self.transform_by(&RigidTransform::exp(&twist.scaled(x)))
    }
}

impl std::fmt::Display for RigidTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T: {}, R: {}", self.translation, self.rotation)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_transform_by() {
        let pose1 = RigidTransform::new(Translation::new(3.0, 4.0), Rotation::from_degrees(90.0));
        let pose2 = RigidTransform::new(Translation::new(1.0, 0.0), Rotation::from_degrees(0.0));
        let pose3 = pose1.transform_by(&pose2);
        assert_abs_diff_eq!(pose3.translation().x(), 3.0, epsilon = EPS);
        assert_abs_diff_eq!(pose3.translation().y(), 5.0, epsilon = EPS);
        assert_abs_diff_eq!(pose3.rotation().degrees(), 90.0, epsilon = EPS);

        let pose2 = RigidTransform::new(Translation::new(1.0, 0.0), Rotation::from_degrees(-90.0));
        let pose3 = pose1.transform_by(&pose2);
        assert_abs_diff_eq!(pose3.translation().x(), 3.0, epsilon = EPS);
        assert_abs_diff_eq!(pose3.translation().y(), 5.0, epsilon = EPS);
        assert_abs_diff_eq!(pose3.rotation().degrees(), 0.0, epsilon = EPS);
    }

    #[test]
    fn test_interpolate() {
        let pose1 = RigidTransform::new(Translation::new(3.0, 4.0), Rotation::from_degrees(90.0));
        let pose2 = RigidTransform::new(Translation::new(13.0, -6.0), Rotation::from_degrees(0.0));

        // The two poses sit on a circle of radius 10 centred at (3, -6)
        let pose3 = pose1.interpolate(&pose2, 0.5);
        let expected = PI / 4.0;
        assert_abs_diff_eq!(pose3.translation().x(), 3.0 + 10.0 * expected.cos(), epsilon = EPS);
        assert_abs_diff_eq!(pose3.translation().y(), -6.0 + 10.0 * expected.sin(), epsilon = EPS);
        assert_abs_diff_eq!(pose3.rotation().radians(), expected, epsilon = EPS);

        let pose3 = pose1.interpolate(&pose2, 0.75);
        let expected = PI / 8.0;
        assert_abs_diff_eq!(pose3.translation().x(), 3.0 + 10.0 * expected.cos(), epsilon = EPS);
        assert_abs_diff_eq!(pose3.translation().y(), -6.0 + 10.0 * expected.sin(), epsilon = EPS);
        assert_abs_diff_eq!(pose3.rotation().radians(), expected, epsilon = EPS);
    }

    #[test]
    fn test_exp_and_log() {
        let twist = Twist::new(1.0, 0.0, 0.0);
        let pose = RigidTransform::exp(&twist);
        assert_abs_diff_eq!(pose.translation().x(), 1.0, epsilon = EPS);
        assert_abs_diff_eq!(pose.translation().y(), 0.0, epsilon = EPS);
        assert_abs_diff_eq!(pose.rotation().degrees(), 0.0, epsilon = EPS);

        let pose = RigidTransform::exp(&twist.scaled(2.5));
        assert_abs_diff_eq!(pose.translation().x(), 2.5, epsilon = EPS);

        let pose = RigidTransform::new(Translation::new(2.0, 2.0), Rotation::from_radians(PI / 2.0));
        let twist = pose.log();
        assert_abs_diff_eq!(twist.dx, PI, epsilon = EPS);
        assert_abs_diff_eq!(twist.dy, 0.0, epsilon = EPS);
        assert_abs_diff_eq!(twist.dtheta, PI / 2.0, epsilon = EPS);

        let new_pose = RigidTransform::exp(&twist);
        assert_abs_diff_eq!(new_pose.translation().x(), 2.0, epsilon = EPS);
        assert_abs_diff_eq!(new_pose.translation().y(), 2.0, epsilon = EPS);
        assert_abs_diff_eq!(new_pose.rotation().degrees(), 90.0, epsilon = EPS);
    }

    #[test]
    fn test_intersection() {
        let a = RigidTransform::new(Translation::new(0.0, 0.0), Rotation::from_degrees(0.0));
        let b = RigidTransform::new(Translation::new(5.0, 5.0), Rotation::from_degrees(-90.0));
        let i = a.intersection(&b);
        assert_abs_diff_eq!(i.x(), 5.0, epsilon = EPS);
        assert_abs_diff_eq!(i.y(), 0.0, epsilon = EPS);

        let a = RigidTransform::new(Translation::new(1.0, 0.0), Rotation::from_degrees(45.0));
        let b = RigidTransform::new(Translation::new(3.0, 0.0), Rotation::from_degrees(135.0));
        let i = b.intersection(&a);
        assert_abs_diff_eq!(i.x(), 2.0, epsilon = EPS);
        assert_abs_diff_eq!(i.y(), 1.0, epsilon = EPS);

        // Parallel rays never meet
        let c = RigidTransform::new(Translation::new(0.0, 3.0), Rotation::from_degrees(45.0));
        let i = a.intersection(&c);
        assert!(i.x().is_infinite() && i.x() > 0.0);
        assert!(i.y().is_infinite() && i.y() > 0.0);
    }

    #[test]
    fn test_is_colinear() {
        let a = RigidTransform::new(Translation::new(1.0, 1.0), Rotation::from_degrees(45.0));
        let b = RigidTransform::new(Translation::new(4.0, 4.0), Rotation::from_degrees(45.0));
        let c = RigidTransform::new(Translation::new(4.0, 5.0), Rotation::from_degrees(45.0));
        let d = RigidTransform::new(Translation::new(4.0, 4.0), Rotation::from_degrees(50.0));

        assert!(a.is_colinear(&b));
        assert!(!a.is_colinear(&c));
        assert!(!a.is_colinear(&d));
    }
}
