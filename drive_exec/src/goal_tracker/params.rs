//! Goal tracker parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the goal tracker, the `goal_tracker` table of
/// `robot_state.toml`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GoalTrackerParams {
    /// Observations older than this are dropped from a track, in seconds
    pub max_track_age: f64,

    /// Maximum distance between a track and a new observation for the
    /// observation to be added to the track, in inches
    pub max_tracker_distance: f64,

    /// Rate at which the camera produces frames, in frames/second
    pub camera_frame_rate: f64,

    /// Ranking weight for the stability of a track
    pub stability_weight: f64,

    /// Ranking weight for how recently a track was seen
    pub age_weight: f64,

    /// Ranking bonus for the track which was aimed at last
    pub switching_weight: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for GoalTrackerParams {
    fn default() -> Self {
        Self {
            max_track_age: 1.0,
            max_tracker_distance: 18.0,
            camera_frame_rate: 30.0,
            stability_weight: 1.0,
            age_weight: 1.0,
            switching_weight: 3.0,
        }
    }
}
