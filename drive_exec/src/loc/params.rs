//! Robot state parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::Kinematics;
use crate::goal_tracker::GoalTrackerParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the robot state, loaded from `robot_state.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RobotStateParams {
    /// Number of poses kept in the history
    pub history_capacity: usize,

    /// Position of the camera in the vehicle frame, in inches
    pub camera_x_offset: f64,
    pub camera_y_offset: f64,

    /// Height of the camera above the ground, in inches
    pub camera_z_offset: f64,

    /// Upwards pitch of the camera, in degrees
    pub camera_pitch_deg: f64,

    /// Yaw of the camera relative to the vehicle's heading, in degrees
    pub camera_yaw_deg: f64,

    /// Horizontal target coordinates within this band are treated as zero
    pub camera_deadband: f64,

    /// Height of the top of the vision target, in inches
    pub target_height: f64,

    /// Distance from the vision target to the centre of the goal, in inches
    pub target_radius: f64,

    pub kinematics: Kinematics,

    pub goal_tracker: GoalTrackerParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RobotStateParams {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            camera_x_offset: -3.3211,
            camera_y_offset: 0.0,
            camera_z_offset: 20.9,
            camera_pitch_deg: 29.56,
            camera_yaw_deg: 0.0,
            camera_deadband: 0.0,
            target_height: 88.0,
            target_radius: 7.5,
            kinematics: Kinematics::default(),
            goal_tracker: GoalTrackerParams::default(),
        }
    }
}
