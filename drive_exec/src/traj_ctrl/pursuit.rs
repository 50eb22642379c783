//! # Adaptive pure pursuit
//!
//! Steers the robot along a [`Path`] by fitting, at each update, the circle
//! which leaves the robot tangent to its heading and passes through a
//! lookahead point on the path. The lookahead distance adapts to the
//! profiled speed of the path at the robot's position.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Serialize;

use crate::path::{Lookahead, Path};
use crate::pose::{Interpolable, RigidTransform, Rotation, Translation, Twist};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Radii above this are treated as straight lines.
const MAX_ARC_RADIUS: f64 = 1e6;

/// Lookahead speeds below this count as stopping.
const STOPPED_SPEED: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Steering output of one pursuit update.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SteeringCommand {
    /// Motion along the arc to the lookahead point
    pub delta: Twist,

    pub cross_track_error: f64,

    /// Maximum speed of the segment holding the lookahead point
    pub max_velocity: f64,

    /// Profiled speed at the lookahead point, signed by direction of travel
    pub end_velocity: f64,

    pub lookahead_point: Translation,

    pub remaining_path_length: f64,
}

/// The circular arc from a pose to a point.
#[derive(Debug, Clone, Copy)]
pub struct Arc {
    pub center: Translation,
    pub radius: f64,
    pub length: f64,
}

/// Pure pursuit controller following a path.
#[derive(Debug, Clone)]
pub struct AdaptivePurePursuit {
    path: Path,
    reversed: bool,
    lookahead: Lookahead,
    at_end_of_path: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AdaptivePurePursuit {
    /// Follow `path`, driving backwards along it if `reversed` is set.
    pub fn new(path: Path, reversed: bool, lookahead: Lookahead) -> Self {
        Self {
            path,
            reversed,
            lookahead,
            at_end_of_path: false,
        }
    }

    /// Compute the steering command for the robot at `pose`.
    ///
    /// Advances the path's cursor as segments are completed.
    pub fn update(&mut self, pose: &RigidTransform) -> SteeringCommand {
        let pose = if self.reversed {
            RigidTransform::new(
                pose.translation(),
                pose.rotation()
                    .rotate_by(&Rotation::from_radians(std::f64::consts::PI)),
            )
        } else {
            *pose
        };

        let report = self
            .path
            .get_target_point(&pose.translation(), &self.lookahead);

        if self.is_finished() {
            return SteeringCommand {
                delta: Twist::identity(),
                cross_track_error: report.closest_point_distance,
                max_velocity: report.max_speed,
                end_velocity: 0.0,
                lookahead_point: report.lookahead_point,
                remaining_path_length: report.remaining_path_distance,
            };
        }

        let arc = Arc::new(&pose, &report.lookahead_point);

        // Once the lookahead point has stopped, scale the arc down so that we
        // don't drive past the end of the path
        let mut scale_factor = 1.0;
        if report.lookahead_point_speed < STOPPED_SPEED
            && report.remaining_path_distance < arc.length
        {
            scale_factor = (report.remaining_path_distance / arc.length).max(0.0);
            if !self.at_end_of_path {
                debug!(
                    "Reached end of path with {:.3} remaining",
                    report.remaining_path_distance
                );
            }
            self.at_end_of_path = true;
        } else {
            self.at_end_of_path = false;
        }

        if self.reversed {
            scale_factor *= -1.0;
        }

        SteeringCommand {
            delta: Twist::new(
                scale_factor * arc.length,
                0.0,
                arc.length * get_direction(&pose, &report.lookahead_point) * scale_factor.abs()
                    / arc.radius,
            ),
            cross_track_error: report.closest_point_distance,
            max_velocity: report.max_speed,
            end_velocity: report.lookahead_point_speed * sign(scale_factor),
            lookahead_point: report.lookahead_point,
            remaining_path_length: report.remaining_path_distance,
        }
    }

    pub fn has_passed_marker(&self, marker: &str) -> bool {
        self.path.has_passed_marker(marker)
    }

    /// Whether the end of the path has been reached.
    pub fn is_finished(&self) -> bool {
        self.at_end_of_path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }
}

impl Arc {
    /// The arc leaving `pose` along its heading and ending at `point`.
    pub fn new(pose: &RigidTransform, point: &Translation) -> Self {
        let center = get_center(pose, point);
        let radius = Translation::between(&center, point).norm();
        let length = arc_length(pose, point, &center, radius);

        Self {
            center,
            radius,
            length,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Center of the circle tangent to `pose`'s heading which passes through
/// `point`.
///
/// The center lies where the perpendicular bisector of pose and point meets
/// the normal to the heading. For a point straight ahead these are parallel
/// and the center is at infinity.
pub fn get_center(pose: &RigidTransform, point: &Translation) -> Translation {
    let pose_to_point_halfway = pose.translation().interpolate(point, 0.5);
    let normal = pose
        .translation()
        .inverse()
        .translate_by(&pose_to_point_halfway)
        .direction()
        .normal();
    let perpendicular_bisector = RigidTransform::new(pose_to_point_halfway, normal);
    let normal_from_pose = RigidTransform::new(pose.translation(), pose.rotation().normal());

    if normal_from_pose.is_colinear(&perpendicular_bisector.normal()) {
        return pose_to_point_halfway;
    }

    normal_from_pose.intersection(&perpendicular_bisector)
}

/// Radius of the arc from `pose` to `point`.
pub fn get_radius(pose: &RigidTransform, point: &Translation) -> f64 {
    let center = get_center(pose, point);
    Translation::between(&center, point).norm()
}

/// Length of the arc from `pose` to `point`.
pub fn get_length(pose: &RigidTransform, point: &Translation) -> f64 {
    let center = get_center(pose, point);
    let radius = Translation::between(&center, point).norm();
    arc_length(pose, point, &center, radius)
}

/// Which way to turn to reach `point`: `1.0` for anticlockwise, `-1.0` for
/// clockwise.
pub fn get_direction(pose: &RigidTransform, point: &Translation) -> f64 {
    let pose_to_point = Translation::between(&pose.translation(), point);
    let robot = pose.rotation().to_translation();

    if robot.cross(&pose_to_point) < 0.0 {
        -1.0
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn arc_length(pose: &RigidTransform, point: &Translation, center: &Translation, radius: f64) -> f64 {
    if radius < MAX_ARC_RADIUS {
        let center_to_point = Translation::between(center, point);
        let center_to_pose = Translation::between(center, &pose.translation());

        // Points behind the pose need the long way round the circle
        let behind = pose
            .rotation()
            .normal()
            .to_translation()
            .cross(&Translation::between(&pose.translation(), point))
            > 0.0;
        let angle = Translation::get_angle(&center_to_pose, &center_to_point)
            .radians()
            .abs();

        radius
            * if behind {
                2.0 * std::f64::consts::PI - angle
            } else {
                angle
            }
    } else {
        Translation::between(&pose.translation(), point).norm()
    }
}

/// Sign of `x`, with zero for zero.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
