//! # Drive library
//!
//! Motion control core of the robot: where it is, how it follows paths, and
//! where the goals are. Used by the `drive_exec` executable and available to
//! other crates in the workspace.
//!
//! All units are inches, seconds and radians. Every timestamp is supplied
//! by the caller, nothing in the library reads the clock.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Goal tracker - smooths and ranks the goal positions seen by vision
pub mod goal_tracker;

/// Localisation - pose history, odometry and vision fusion
pub mod loc;

/// Motion profiles - 1D trapezoidal profile generation and following
pub mod motion;

/// Executable parameters
pub mod params;

/// Paths - line and arc paths built from waypoints
pub mod path;

/// Pose algebra - rigid transforms of the plane
pub mod pose;

/// Trajectory control - keeps the robot on the given path
pub mod traj_ctrl;
