//! # Paths
//!
//! A path is an ordered list of line and arc segments, each carrying a speed
//! profile. The path is traversed with a cursor: once the robot's projection
//! reaches the end of the head segment the cursor moves on to the next one,
//! recording the segment's marker if it has one.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod builder;
mod lookahead;
mod params;
mod segment;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::HashSet;

use log::info;
use serde::Serialize;

use crate::motion::MotionState;
use crate::pose::Translation;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use builder::{build_path_from_waypoints, Waypoint};
pub use lookahead::Lookahead;
pub use params::PathParams;
pub use segment::{PathSegment, SegmentShape};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path made of line and arc segments.
///
/// Always contains at least one segment.
#[derive(Debug, Clone, Serialize)]
pub struct Path {
    segments: Vec<PathSegment>,

    /// Index of the segment currently being followed. Equal to the number
    /// of segments once the last one is complete.
    cursor: usize,

    markers_crossed: HashSet<String>,

    max_accel: f64,
    completion_tolerance: f64,
}

/// Result of looking for the steering target on a path.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TargetPointReport {
    /// Point on the head segment closest to the robot
    pub closest_point: Translation,

    /// Distance from the robot to the closest point (cross track error)
    pub closest_point_distance: f64,

    /// Profiled speed at the closest point
    pub closest_point_speed: f64,

    /// Point to steer towards
    pub lookahead_point: Translation,

    /// Maximum speed of the segment holding the lookahead point
    pub max_speed: f64,

    /// Profiled speed at the lookahead point
    pub lookahead_point_speed: f64,

    /// Distance left along the head segment
    pub remaining_segment_distance: f64,

    /// Distance left along the whole path
    pub remaining_path_distance: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("A path needs at least 2 waypoints, got {0}")]
    NotEnoughWaypoints(usize),

    #[error("The waypoints produced no segments with non-zero length")]
    EmptyPath,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Create a path from already built segments.
    pub fn from_segments(segments: Vec<PathSegment>, params: &PathParams) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::EmptyPath);
        }

        Ok(Self {
            segments,
            cursor: 0,
            markers_crossed: HashSet::new(),
            max_accel: params.max_accel,
            completion_tolerance: params.segment_completion_tolerance,
        })
    }

    /// All segments of the path, including completed ones.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Segments which have not yet been completed.
    pub fn remaining_segments(&self) -> &[PathSegment] {
        &self.segments[self.cursor..]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether every segment has been completed.
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.segments.len()
    }

    /// Total length of all segments.
    pub fn length(&self) -> f64 {
        self.segments.iter().map(|s| s.length()).sum()
    }

    pub fn end_position(&self) -> Translation {
        self.segments[self.segments.len() - 1].end()
    }

    /// Let the final segment place lookahead points past its end.
    pub fn extrapolate_last(&mut self) {
        if let Some(last) = self.segments.last_mut() {
            last.set_extrapolate_lookahead(true);
        }
    }

    /// Index of the segment being followed. After completion the last
    /// segment keeps being used for geometry.
    fn head_index(&self) -> usize {
        self.cursor.min(self.segments.len() - 1)
    }

    fn head(&self) -> &PathSegment {
        &self.segments[self.head_index()]
    }

    /// Distance left on the head segment from the robot's projection.
    pub fn segment_remaining_distance(&self, robot: &Translation) -> f64 {
        let head = self.head();
        head.remaining_distance(&head.closest_point(robot))
    }

    pub fn segment_length(&self) -> f64 {
        self.head().length()
    }

    /// Profiled speed at the robot's projection onto the head segment.
    pub fn speed(&self, robot: &Translation) -> f64 {
        self.head().speed_by_closest_point(robot)
    }

    /// Find the steering target for a robot at `robot`.
    ///
    /// The lookahead distance depends on the profiled speed at the robot's
    /// projection, and may span several segments. Completes the head segment
    /// if the projection has reached its end.
    pub fn get_target_point(&mut self, robot: &Translation, lookahead: &Lookahead) -> TargetPointReport {
        let head_index = self.head_index();
        let last_index = self.segments.len() - 1;
        let head = &self.segments[head_index];

        let closest_point = head.closest_point(robot);
        let closest_point_distance = Translation::between(robot, &closest_point).norm();

        let remaining_segment_distance = head.remaining_distance(&closest_point);
        let remaining_path_distance = remaining_segment_distance
            + self.segments[head_index + 1..]
                .iter()
                .map(|s| s.length())
                .sum::<f64>();

        let closest_point_speed = head.speed_by_distance(head.length() - remaining_segment_distance);

        // Walk forward through the segments to find the one holding the
        // lookahead point, leaving the distance along it
        let mut lookahead_distance =
            lookahead.lookahead_for_speed(closest_point_speed) + closest_point_distance;
        let mut target_index = head_index;

        if remaining_segment_distance < lookahead_distance && head_index < last_index {
            lookahead_distance -= remaining_segment_distance;
            for i in (head_index + 1)..=last_index {
                target_index = i;
                let length = self.segments[i].length();
                if length < lookahead_distance && i < last_index {
                    lookahead_distance -= length;
                } else {
                    break;
                }
            }
        } else {
            lookahead_distance += head.length() - remaining_segment_distance;
        }

        let target = &self.segments[target_index];
        let report = TargetPointReport {
            closest_point,
            closest_point_distance,
            closest_point_speed,
            lookahead_point: target.point_by_distance(lookahead_distance),
            max_speed: target.max_speed(),
            lookahead_point_speed: target.speed_by_distance(lookahead_distance),
            remaining_segment_distance,
            remaining_path_distance,
        };

        self.check_segment_done(&closest_point);

        report
    }

    /// Complete the head segment if `robot` projects to within the
    /// completion tolerance of its end.
    pub fn check_segment_done(&mut self, robot: &Translation) {
        if self.is_complete() {
            return;
        }

        if self.segment_remaining_distance(robot) < self.completion_tolerance {
            self.remove_current_segment();
        }
    }

    /// Move the cursor past the head segment, recording its marker.
    pub fn remove_current_segment(&mut self) {
        if self.is_complete() {
            return;
        }

        let segment = &self.segments[self.cursor];
        if let Some(marker) = segment.marker() {
            info!("Passed path marker \"{}\"", marker);
            self.markers_crossed.insert(marker.to_string());
        }
        self.cursor += 1;
    }

    /// Make the speed profiles of the path feasible.
    ///
    /// Walks backwards from the end of the path, where the robot must be at
    /// rest, limiting each segment's entry speed to what can still be slowed
    /// down to the next segment's entry speed at the maximum deceleration.
    /// The speed profiles are then regenerated front to back.
    pub fn verify_speeds(&mut self) {
        let n = self.segments.len();
        let mut start_speeds = vec![0.0; n + 1];
        let mut max_start_speed: f64 = 0.0;

        for i in (0..n).rev() {
            let segment = &self.segments[i];
            max_start_speed =
                (max_start_speed.powi(2) + 2.0 * self.max_accel * segment.length()).sqrt();
            let authored = segment.start_state().map_or(0.0, |s| s.vel);
            start_speeds[i] = authored.min(max_start_speed);
            max_start_speed = start_speeds[i];
        }

        for i in 0..n {
            let start_vel = if i > 0 {
                self.segments[i - 1].end_state().map_or(0.0, |s| s.vel)
            } else {
                0.0
            };
            let start_state = MotionState::new(0.0, 0.0, start_vel, 0.0);
            self.segments[i].create_speed_profile(&start_state, start_speeds[i + 1]);
        }
    }

    pub fn has_passed_marker(&self, marker: &str) -> bool {
        self.markers_crossed.contains(marker)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for s in self.segments.iter() {
            writeln!(f, "{}", s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn straight_path(marker: Option<&str>) -> Path {
        let end = match marker {
            Some(m) => Waypoint::with_marker(100.0, 0.0, 0.0, 50.0, m),
            None => Waypoint::new(100.0, 0.0, 0.0, 50.0),
        };
        build_path_from_waypoints(&[Waypoint::new(0.0, 0.0, 0.0, 50.0), end], &PathParams::default())
            .unwrap()
    }

    /// Check that no segment requires more than `max_accel` to slow to its
    /// exit speed.
    fn assert_feasible(path: &Path, max_accel: f64) {
        for s in path.segments() {
            let v0 = s.start_state().map_or(0.0, |st| st.vel);
            let v1 = s.end_state().map_or(0.0, |st| st.vel);
            assert!(
                v0 * v0 - v1 * v1 <= 2.0 * max_accel * s.length() + 1e-3,
                "segment {} enters at {} and leaves at {}",
                s,
                v0,
                v1
            );
        }
    }

    #[test]
    fn test_target_point_on_straight_path() {
        let mut path = straight_path(None);
        let lookahead = Lookahead::new(12.0, 24.0, 9.0, 120.0);

        let report = path.get_target_point(&Translation::new(0.0, 0.0), &lookahead);
        assert_abs_diff_eq!(report.closest_point_distance, 0.0);
        assert_abs_diff_eq!(report.closest_point_speed, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(report.lookahead_point.x(), 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(report.lookahead_point.y(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(report.lookahead_point_speed, 50.0, epsilon = 1e-6);
        assert_abs_diff_eq!(report.max_speed, 50.0);
        assert_abs_diff_eq!(report.remaining_segment_distance, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(report.remaining_path_distance, 100.0, epsilon = 1e-9);

        // Off the path
        let report = path.get_target_point(&Translation::new(50.0, 3.0), &lookahead);
        assert_abs_diff_eq!(report.closest_point_distance, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(report.remaining_path_distance, 50.0, epsilon = 1e-9);
        assert!(!path.is_complete());
    }

    #[test]
    fn test_final_segment_extrapolates() {
        let mut path = straight_path(None);
        let lookahead = Lookahead::new(12.0, 24.0, 9.0, 120.0);

        let report = path.get_target_point(&Translation::new(95.0, 0.0), &lookahead);
        assert!(report.lookahead_point.x() > 100.0);
        assert!(report.lookahead_point_speed.abs() < 1e-6);
    }

    #[test]
    fn test_cursor_and_markers() {
        let mut path = straight_path(Some("done"));
        let lookahead = Lookahead::default();

        path.get_target_point(&Translation::new(60.0, 0.0), &lookahead);
        assert!(!path.has_passed_marker("done"));
        assert_eq!(path.remaining_segments().len(), 1);

        path.get_target_point(&Translation::new(99.95, 0.0), &lookahead);
        assert!(path.is_complete());
        assert!(path.has_passed_marker("done"));
        assert!(!path.has_passed_marker("other"));
        assert!(path.remaining_segments().is_empty());

        // Still usable once complete
        let report = path.get_target_point(&Translation::new(100.0, 0.0), &lookahead);
        assert_abs_diff_eq!(report.remaining_path_distance, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lookahead_spans_segments() {
        let w = [
            Waypoint::new(0.0, 0.0, 0.0, 60.0),
            Waypoint::new(50.0, 0.0, 10.0, 60.0),
            Waypoint::new(50.0, 50.0, 0.0, 60.0),
        ];
        let mut path = build_path_from_waypoints(&w, &PathParams::default()).unwrap();
        let lookahead = Lookahead::new(12.0, 24.0, 9.0, 120.0);

        let report = path.get_target_point(&Translation::new(38.0, 0.0), &lookahead);
        let arc_length = 10.0 * std::f64::consts::FRAC_PI_2;
        assert_abs_diff_eq!(report.remaining_segment_distance, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            report.remaining_path_distance,
            2.0 + arc_length + 40.0,
            epsilon = 1e-9
        );

        // The lookahead point lies on the arc about (40, 10)
        let to_center = Translation::between(&Translation::new(40.0, 10.0), &report.lookahead_point);
        assert_abs_diff_eq!(to_center.norm(), 10.0, epsilon = 1e-6);
        assert!(report.lookahead_point.x() > 40.0);
    }

    #[test]
    fn test_verify_speeds_limits_entry_speed() {
        // A fast line into a sharp corner followed by a very short line
        let w = [
            Waypoint::new(0.0, 0.0, 0.0, 120.0),
            Waypoint::new(100.0, 0.0, 0.0, 120.0),
            Waypoint::new(100.0, 2.0, 0.0, 120.0),
        ];
        let params = PathParams::default();
        let path = build_path_from_waypoints(&w, &params).unwrap();
        assert_eq!(path.len(), 2);
        assert_feasible(&path, params.max_accel);

        // Entry to the last line is limited to what can stop within it
        let entry = path.segments()[1].start_state().map_or(0.0, |s| s.vel);
        assert_abs_diff_eq!(entry, (2.0 * params.max_accel * 2.0_f64).sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_verify_speeds_on_built_paths() {
        let params = PathParams::default();
        let paths = vec![
            vec![
                Waypoint::new(0.0, 0.0, 0.0, 60.0),
                Waypoint::new(50.0, 0.0, 10.0, 60.0),
                Waypoint::new(50.0, 50.0, 0.0, 60.0),
            ],
            vec![
                Waypoint::new(16.0, 160.0, 0.0, 0.0),
                Waypoint::new(90.0, 160.0, 0.0, 120.0),
                Waypoint::new(205.0, 160.0, 40.0, 120.0),
                Waypoint::new(205.0, 240.0, 30.0, 120.0),
                Waypoint::new(240.0, 275.0, 0.0, 60.0),
            ],
            vec![
                Waypoint::new(0.0, 0.0, 0.0, 100.0),
                Waypoint::new(20.0, 0.0, 5.0, 100.0),
                Waypoint::new(20.0, 20.0, 5.0, 100.0),
                Waypoint::new(0.0, 20.0, 0.0, 100.0),
            ],
        ];

        for w in paths.iter() {
            let path = build_path_from_waypoints(w, &params).unwrap();
            assert_feasible(&path, params.max_accel);

            let last = path.segments()[path.len() - 1].end_state().map_or(0.0, |s| s.vel);
            assert_abs_diff_eq!(last, 0.0, epsilon = 1e-6);
        }
    }
}
