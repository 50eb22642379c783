//! # Trajectory control module
//!
//! Trajectory control keeps the robot on a path. Steering comes from an
//! adaptive pure pursuit controller, which fits an arc from the robot to a
//! lookahead point on the path. Speed along that arc comes from a motion
//! profile follower, so the robot accelerates and brakes within its limits
//! and comes to rest at the end of the path.
//!
//! The [`PathFollower`] combines the two into a body frame velocity command,
//! and [`TrajCtrl`] wraps it in a cyclic module which also converts the
//! command into wheel velocities.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod follower;
pub mod params;
pub mod pursuit;
pub mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use follower::{PathFollower, PathFollowerDebug};
pub use params::PathFollowerParams;
pub use pursuit::{AdaptivePurePursuit, SteeringCommand};
pub use state::*;
