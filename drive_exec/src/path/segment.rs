//! # Path segments
//!
//! A segment is either a straight line or a circular arc, and carries a speed
//! profile along its length.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::Serialize;

use crate::motion::{
    generate_profile, MotionProfile, MotionProfileConstraints, MotionProfileGoal, MotionState,
};
use crate::pose::{Rotation, Translation};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single segment of a [`super::Path`].
#[derive(Debug, Clone, Serialize)]
pub struct PathSegment {
    start: Translation,
    end: Translation,
    shape: SegmentShape,

    /// Maximum speed allowed on the segment
    max_speed: f64,

    /// Maximum acceleration used when generating the speed profile
    max_accel: f64,

    /// Speed along the segment as a function of distance from the start
    #[serde(skip)]
    speed_profile: MotionProfile,

    /// Allow lookahead points past the end of the segment
    extrapolate_lookahead: bool,

    marker: Option<String>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Geometry of a segment.
#[derive(Debug, Clone, Copy, Serialize)]
pub enum SegmentShape {
    Line {
        /// Vector from the start to the end
        delta: Translation,
    },

    Arc {
        center: Translation,

        /// Vector from the center to the start
        delta_start: Translation,

        /// Vector from the center to the end
        delta_end: Translation,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathSegment {
    /// Create a straight segment, generating its speed profile from
    /// `start_state` to `end_speed`.
    pub fn new_line(
        start: Translation,
        end: Translation,
        max_speed: f64,
        max_accel: f64,
        start_state: &MotionState,
        end_speed: f64,
        marker: Option<String>,
    ) -> Self {
        let mut segment = Self {
            start,
            end,
            shape: SegmentShape::Line {
                delta: Translation::between(&start, &end),
            },
            max_speed,
            max_accel,
            speed_profile: MotionProfile::new(),
            extrapolate_lookahead: false,
            marker,
        };
        segment.create_speed_profile(start_state, end_speed);
        segment
    }

    /// Create an arc segment about `center`, generating its speed profile
    /// from `start_state` to `end_speed`.
    #[allow(clippy::too_many_arguments)]
    pub fn new_arc(
        start: Translation,
        end: Translation,
        center: Translation,
        max_speed: f64,
        max_accel: f64,
        start_state: &MotionState,
        end_speed: f64,
        marker: Option<String>,
    ) -> Self {
        let mut segment = Self {
            start,
            end,
            shape: SegmentShape::Arc {
                center,
                delta_start: Translation::between(&center, &start),
                delta_end: Translation::between(&center, &end),
            },
            max_speed,
            max_accel,
            speed_profile: MotionProfile::new(),
            extrapolate_lookahead: false,
            marker,
        };
        segment.create_speed_profile(start_state, end_speed);
        segment
    }

    /// Regenerate the speed profile of the segment.
    pub fn create_speed_profile(&mut self, start_state: &MotionState, end_speed: f64) {
        let constraints = MotionProfileConstraints::new(self.max_speed, self.max_accel);
        let goal = MotionProfileGoal::with_vel(self.length(), end_speed);
        self.speed_profile = generate_profile(&constraints, &goal, start_state);
    }

    pub fn start(&self) -> Translation {
        self.start
    }

    pub fn end(&self) -> Translation {
        self.end
    }

    pub fn shape(&self) -> &SegmentShape {
        &self.shape
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    pub fn speed_profile(&self) -> &MotionProfile {
        &self.speed_profile
    }

    pub fn set_extrapolate_lookahead(&mut self, extrapolate: bool) {
        self.extrapolate_lookahead = extrapolate;
    }

    pub fn extrapolate_lookahead(&self) -> bool {
        self.extrapolate_lookahead
    }

    /// Length of the segment along its shape.
    pub fn length(&self) -> f64 {
        match self.shape {
            SegmentShape::Line { delta } => delta.norm(),
            SegmentShape::Arc {
                delta_start,
                delta_end,
                ..
            } => delta_start.norm() * Translation::get_angle(&delta_start, &delta_end).radians(),
        }
    }

    /// The point on the segment closest to `position`.
    pub fn closest_point(&self, position: &Translation) -> Translation {
        match self.shape {
            SegmentShape::Line { delta } => {
                let u = ((position.x() - self.start.x()) * delta.x()
                    + (position.y() - self.start.y()) * delta.y())
                    / delta.norm_squared();

                if (0.0..=1.0).contains(&u) {
                    self.start.translate_by(&delta.scale(u))
                } else if u < 0.0 {
                    self.start
                } else {
                    self.end
                }
            }
            SegmentShape::Arc {
                center,
                delta_start,
                delta_end,
            } => {
                let delta_position = Translation::between(&center, position);
                let delta_position = delta_position.scale(delta_start.norm() / delta_position.norm());

                // Between the start and end rays the projection lands on the arc
                if delta_position.cross(&delta_start) * delta_position.cross(&delta_end) < 0.0 {
                    center.translate_by(&delta_position)
                } else {
                    let start_dist = Translation::between(position, &self.start).norm();
                    let end_dist = Translation::between(position, &self.end).norm();
                    if end_dist < start_dist {
                        self.end
                    } else {
                        self.start
                    }
                }
            }
        }
    }

    /// The point `dist` along the segment from its start.
    ///
    /// Distances past the end are clamped unless the segment extrapolates its
    /// lookahead.
    pub fn point_by_distance(&self, dist: f64) -> Translation {
        let length = self.length();
        let dist = if !self.extrapolate_lookahead && dist > length {
            length
        } else {
            dist
        };

        match self.shape {
            SegmentShape::Line { delta } => self.start.translate_by(&delta.scale(dist / length)),
            SegmentShape::Arc {
                center,
                delta_start,
                delta_end,
            } => {
                let direction = if delta_start.cross(&delta_end) >= 0.0 {
                    1.0
                } else {
                    -1.0
                };
                let delta_angle = Translation::get_angle(&delta_start, &delta_end).radians()
                    * direction
                    * dist
                    / length;
                center.translate_by(&delta_start.rotate_by(&Rotation::from_radians(delta_angle)))
            }
        }
    }

    /// Distance left to the end of the segment from `position`, which must
    /// already lie on the segment.
    pub fn remaining_distance(&self, position: &Translation) -> f64 {
        match self.shape {
            SegmentShape::Line { .. } => Translation::between(&self.end, position).norm(),
            SegmentShape::Arc {
                center,
                delta_start,
                delta_end,
            } => {
                let delta_position = Translation::between(&center, position);
                let angle = Translation::get_angle(&delta_end, &delta_position).radians();
                let total_angle = Translation::get_angle(&delta_start, &delta_end).radians();
                angle / total_angle * self.length()
            }
        }
    }

    fn distance_travelled(&self, robot_position: &Translation) -> f64 {
        let path_position = self.closest_point(robot_position);
        self.length() - self.remaining_distance(&path_position)
    }

    /// Profiled speed `dist` along the segment.
    pub fn speed_by_distance(&self, dist: f64) -> f64 {
        let dist = util::maths::clamp(
            dist,
            self.speed_profile.start_pos(),
            self.speed_profile.end_pos(),
        );

        match self.speed_profile.first_state_by_pos(dist) {
            Some(state) => state.vel,
            None => {
                warn!("No profiled speed at {:.3} along segment {}", dist, self);
                0.0
            }
        }
    }

    /// Profiled speed at the point of the segment closest to the robot.
    pub fn speed_by_closest_point(&self, robot_position: &Translation) -> f64 {
        self.speed_by_distance(self.distance_travelled(robot_position))
    }

    pub fn start_state(&self) -> Option<MotionState> {
        self.speed_profile.start_state()
    }

    pub fn end_state(&self) -> Option<MotionState> {
        self.speed_profile.end_state()
    }
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.shape {
            SegmentShape::Line { .. } => write!(
                f,
                "(start: {}, end: {}, speed: {})",
                self.start, self.end, self.max_speed
            ),
            SegmentShape::Arc { center, .. } => write!(
                f,
                "(start: {}, end: {}, center: {}, speed: {})",
                self.start, self.end, center, self.max_speed
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 1e-9;

    fn stopped() -> MotionState {
        MotionState::new(0.0, 0.0, 0.0, 0.0)
    }

    fn line(x1: f64, y1: f64, x2: f64, y2: f64, speed: f64) -> PathSegment {
        PathSegment::new_line(
            Translation::new(x1, y1),
            Translation::new(x2, y2),
            speed,
            120.0,
            &stopped(),
            0.0,
            None,
        )
    }

    fn assert_point(p: Translation, x: f64, y: f64) {
        assert_abs_diff_eq!(p.x(), x, epsilon = EPS);
        assert_abs_diff_eq!(p.y(), y, epsilon = EPS);
    }

    #[test]
    fn test_axis_aligned_line() {
        let segment = line(0.0, 0.0, 100.0, 0.0, 50.0);
        assert_abs_diff_eq!(segment.length(), 100.0, epsilon = EPS);

        // On the path
        let closest = segment.closest_point(&Translation::new(50.0, 0.0));
        assert_point(closest, 50.0, 0.0);
        assert_abs_diff_eq!(segment.remaining_distance(&closest), 50.0, epsilon = EPS);
        assert_point(segment.point_by_distance(75.0), 75.0, 0.0);

        // Off the path
        let closest = segment.closest_point(&Translation::new(20.0, 50.0));
        assert_point(closest, 20.0, 0.0);
        assert_abs_diff_eq!(segment.remaining_distance(&closest), 80.0, epsilon = EPS);

        // Behind the start
        let closest = segment.closest_point(&Translation::new(-30.0, -30.0));
        assert_point(closest, 0.0, 0.0);
        assert_abs_diff_eq!(segment.remaining_distance(&closest), 100.0, epsilon = EPS);

        // Past the end
        let closest = segment.closest_point(&Translation::new(120.0, 150.0));
        assert_point(closest, 100.0, 0.0);
        assert_abs_diff_eq!(segment.remaining_distance(&closest), 0.0, epsilon = EPS);
    }

    #[test]
    fn test_skewed_line() {
        let segment = line(10.0, -12.0, -30.0, -120.0, 100.0);
        assert_abs_diff_eq!(segment.length(), 115.169440391, epsilon = EPS);

        let closest = segment.closest_point(&Translation::new(-20.0, -93.0));
        assert_point(closest, -20.0, -93.0);
        assert_abs_diff_eq!(segment.remaining_distance(&closest), 28.7923600978, epsilon = EPS);

        assert_point(
            segment.point_by_distance(75.0),
            -16.048576686769547,
            -82.33115705427778,
        );

        let closest = segment.closest_point(&Translation::new(30.0, -39.0));
        assert_point(closest, 3.618817852834706, -29.2291917973462);
        assert_abs_diff_eq!(segment.remaining_distance(&closest), 96.79651096803562, epsilon = EPS);

        let closest = segment.closest_point(&Translation::new(30.0, 30.0));
        assert_point(closest, 10.0, -12.0);
        assert_abs_diff_eq!(segment.remaining_distance(&closest), 115.169440391, epsilon = EPS);

        let closest = segment.closest_point(&Translation::new(-21.0, -150.0));
        assert_point(closest, -30.0, -120.0);
        assert_abs_diff_eq!(segment.remaining_distance(&closest), 0.0, epsilon = EPS);
    }

    #[test]
    fn test_quarter_arc() {
        // Anticlockwise quarter circle of radius 10 about the origin
        let segment = PathSegment::new_arc(
            Translation::new(10.0, 0.0),
            Translation::new(0.0, 10.0),
            Translation::new(0.0, 0.0),
            50.0,
            120.0,
            &stopped(),
            0.0,
            None,
        );
        let quarter = 10.0 * std::f64::consts::FRAC_PI_2;
        assert_abs_diff_eq!(segment.length(), quarter, epsilon = EPS);

        let half_way = segment.point_by_distance(quarter / 2.0);
        let diag = 10.0 / 2.0_f64.sqrt();
        assert_point(half_way, diag, diag);

        // Projection of an outside point onto the arc
        let closest = segment.closest_point(&Translation::new(20.0, 20.0));
        assert_point(closest, diag, diag);
        assert_abs_diff_eq!(segment.remaining_distance(&closest), quarter / 2.0, epsilon = 1e-6);

        // Points outside the arc's sweep snap to the nearest end
        assert_point(segment.closest_point(&Translation::new(5.0, -20.0)), 10.0, 0.0);
        assert_point(segment.closest_point(&Translation::new(-20.0, 5.0)), 0.0, 10.0);

        // Clamped without extrapolation
        assert_point(segment.point_by_distance(2.0 * quarter), 0.0, 10.0);
    }

    #[test]
    fn test_speed_profile() {
        let segment = line(0.0, 0.0, 100.0, 0.0, 50.0);

        assert_abs_diff_eq!(segment.speed_by_distance(0.0), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(segment.speed_by_distance(50.0), 50.0, epsilon = 1e-6);
        assert_abs_diff_eq!(segment.speed_by_distance(100.0), 0.0, epsilon = 1e-6);

        // Clamped to the profile
        assert_abs_diff_eq!(segment.speed_by_distance(-10.0), 0.0, epsilon = 1e-6);

        // 10.4 inches in at 120 in/s^2 gives sqrt(2 * 120 * 10.4) = 49.96 in/s
        let v = segment.speed_by_closest_point(&Translation::new(10.4, 3.0));
        assert_abs_diff_eq!(v, (2.0 * 120.0 * 10.4_f64).sqrt(), epsilon = 1e-6);

        let end = segment.end_state().map(|s| s.vel);
        assert_eq!(end.map(|v| v.abs() < 1e-6), Some(true));
    }
}
