//! # Motion profiles
//!
//! One dimensional trapezoidal motion profiles. A profile is a time ordered
//! list of constant acceleration segments, generated from a start state, a
//! goal and a set of velocity and acceleration constraints.
//!
//! The [`ProfileFollower`] wraps generation and sampling into a velocity
//! controller which can be called every cycle with the measured state.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod follower;
mod generator;
mod goal;
mod heading;
mod profile;
mod segment;
mod setpoint;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use follower::{ProfileFollower, ProfileGains};
pub use generator::generate_profile;
pub use goal::{
    CompletionBehavior, MotionProfileConstraints, MotionProfileGoal, DEFAULT_POS_TOLERANCE,
    DEFAULT_VEL_TOLERANCE,
};
pub use heading::{canonicalize, HeadingProfileFollower};
pub use profile::MotionProfile;
pub use segment::MotionSegment;
pub use setpoint::{Setpoint, SetpointGenerator};
pub use state::MotionState;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used when comparing times, positions and velocities of states.
pub const EPSILON: f64 = 1e-6;
