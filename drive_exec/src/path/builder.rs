//! # Path builder
//!
//! Turns a list of sparse waypoints into a continuous path. Consecutive
//! waypoints are joined by straight lines, and each interior waypoint is
//! rounded off with an arc of the waypoint's radius tangent to both lines.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{Path, PathError, PathParams, PathSegment};
use crate::motion::MotionState;
use crate::pose::{RigidTransform, Translation};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Lines shorter than this are fully consumed by their arcs.
const MIN_LINE_LENGTH: f64 = 1e-9;

/// Arcs with radii outside `(MIN_ARC_RADIUS, MAX_ARC_RADIUS)` are dropped.
const MIN_ARC_RADIUS: f64 = 1e-9;
const MAX_ARC_RADIUS: f64 = 1e9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point the path should pass near.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,

    /// Radius of the arc used to round the corner at this waypoint
    #[serde(default)]
    pub radius: f64,

    /// Target speed of the line ending at this waypoint
    pub speed: f64,

    /// Marker recorded once the robot passes the line ending here
    #[serde(default)]
    pub marker: Option<String>,
}

/// A line between two waypoints, shortened at each end by the waypoint's
/// corner radius.
struct Line<'w> {
    b: &'w Waypoint,
    start: Translation,
    end: Translation,
    slope: Translation,
}

/// The fillet joining two lines at their shared waypoint.
struct Arc<'w> {
    a: Line<'w>,
    b: Line<'w>,
    center: Translation,
    radius: f64,
    speed: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    pub fn new(x: f64, y: f64, radius: f64, speed: f64) -> Self {
        Self {
            x,
            y,
            radius,
            speed,
            marker: None,
        }
    }

    pub fn with_marker(x: f64, y: f64, radius: f64, speed: f64, marker: &str) -> Self {
        Self {
            marker: Some(marker.to_string()),
            ..Self::new(x, y, radius, speed)
        }
    }

    pub fn position(&self) -> Translation {
        Translation::new(self.x, self.y)
    }
}

impl<'w> Line<'w> {
    fn new(a: &'w Waypoint, b: &'w Waypoint) -> Self {
        let slope = Translation::between(&a.position(), &b.position());
        let norm = slope.norm();

        Self {
            b,
            start: a.position().translate_by(&slope.scale(a.radius / norm)),
            end: b.position().translate_by(&slope.scale(-b.radius / norm)),
            slope,
        }
    }

    fn add_to(&self, segments: &mut Vec<PathSegment>, end_speed: f64, params: &PathParams) {
        let length = Translation::between(&self.end, &self.start).norm();
        if length > MIN_LINE_LENGTH {
            let start_state = last_motion_state(segments);
            segments.push(PathSegment::new_line(
                self.start,
                self.end,
                self.b.speed,
                params.max_accel,
                &start_state,
                end_speed,
                self.b.marker.clone(),
            ));
        }
    }
}

impl<'w> Arc<'w> {
    fn new(a: &'w Waypoint, b: &'w Waypoint, c: &'w Waypoint) -> Self {
        let a = Line::new(a, b);
        let b = Line::new(b, c);

        let line_a = RigidTransform::new(a.end, a.slope.direction().normal());
        let line_b = RigidTransform::new(b.start, b.slope.direction().normal());
        let center = line_a.intersection(&line_b);

        Self {
            speed: (a.b.speed + b.b.speed) / 2.0,
            radius: Translation::between(&center, &a.end).norm(),
            center,
            a,
            b,
        }
    }

    fn add_to(&self, segments: &mut Vec<PathSegment>, params: &PathParams) {
        self.a.add_to(segments, self.speed, params);

        if self.radius > MIN_ARC_RADIUS && self.radius < MAX_ARC_RADIUS {
            let start_state = last_motion_state(segments);
            segments.push(PathSegment::new_arc(
                self.a.end,
                self.b.start,
                self.center,
                self.speed,
                params.max_accel,
                &start_state,
                self.b.b.speed,
                None,
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build a path through the given waypoints.
///
/// The first waypoint's radius should be zero. The path ends at rest on the
/// last waypoint, and its final segment extrapolates lookahead points past
/// its end. Speeds are made feasible with [`Path::verify_speeds`].
pub fn build_path_from_waypoints(
    waypoints: &[Waypoint],
    params: &PathParams,
) -> Result<Path, PathError> {
    if waypoints.len() < 2 {
        return Err(PathError::NotEnoughWaypoints(waypoints.len()));
    }

    let mut segments = Vec::new();

    for triple in waypoints.windows(3) {
        Arc::new(&triple[0], &triple[1], &triple[2]).add_to(&mut segments, params);
    }

    let n = waypoints.len();
    Line::new(&waypoints[n - 2], &waypoints[n - 1]).add_to(&mut segments, 0.0, params);

    let mut path = Path::from_segments(segments, params)?;
    path.extrapolate_last();
    path.verify_speeds();

    debug!("Built path:\n{}", path);
    info!(
        "Built path of {} segments from {} waypoints, length {:.3}",
        path.len(),
        n,
        path.length()
    );

    Ok(path)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Start state for the next segment, continuing the speed of the last one.
fn last_motion_state(segments: &[PathSegment]) -> MotionState {
    match segments.last().and_then(|s| s.end_state()) {
        Some(end) => MotionState::new(0.0, 0.0, end.vel, end.acc),
        None => MotionState::new(0.0, 0.0, 0.0, 0.0),
    }
}
