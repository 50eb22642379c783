//! Path following parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::motion::{ProfileGains, EPSILON};
use crate::path::{Lookahead, PathParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the path follower, loaded from `path_follower.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathFollowerParams {
    /// Speed dependent lookahead of the steering controller
    pub lookahead: Lookahead,

    /// Gain increasing the effective curvature with speed, to account for
    /// the robot's inertia when turning.
    pub inertia_gain: f64,

    /// Gains of the speed profile follower
    pub profile_gains: ProfileGains,

    /// Maximum absolute speed of the speed profile in inches/second
    pub profile_max_abs_vel: f64,

    /// Maximum absolute acceleration of the speed profile in
    /// inches/second^2
    pub profile_max_abs_acc: f64,

    /// Distance from the goal within which the profile is complete, in
    /// inches
    pub goal_pos_tolerance: f64,

    /// Speed error within which the profile is complete, in inches/second
    pub goal_vel_tolerance: f64,

    /// Once the remaining path is shorter than this the steering command is
    /// no longer updated, in inches
    pub stop_steering_distance: f64,

    /// Tolerance used to decide whether the speed profile must be
    /// regenerated
    pub regen_tolerance: f64,

    /// Minimum velocity command in inches/second
    pub min_output: f64,

    /// Maximum velocity command in inches/second
    pub max_output: f64,

    /// Path construction parameters
    pub path: PathParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PathFollowerParams {
    fn default() -> Self {
        Self {
            lookahead: Lookahead::new(12.0, 24.0, 9.0, 120.0),
            inertia_gain: 0.0,
            profile_gains: ProfileGains {
                kp: 5.0,
                ki: 0.03,
                kv: 0.02,
                kffv: 1.0,
                kffa: 0.05,
            },
            profile_max_abs_vel: 120.0,
            profile_max_abs_acc: 120.0,
            goal_pos_tolerance: 0.75,
            goal_vel_tolerance: 12.0,
            stop_steering_distance: 9.0,
            regen_tolerance: EPSILON,
            min_output: std::f64::NEG_INFINITY,
            max_output: std::f64::INFINITY,
            path: PathParams::default(),
        }
    }
}
