//! # Drive executable parameters
//!
//! Parameters of the simulated drive executable, loaded from
//! `drive_exec.toml`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::path::Waypoint;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecParams {
    /// Target period of one control cycle, in seconds
    pub cycle_period_s: f64,

    /// Simulated time after which the executable stops, in seconds
    pub run_duration_s: f64,

    /// Period of the simulated camera, in seconds
    pub vision_period_s: f64,

    /// Latency reported by the simulated camera, in milliseconds
    pub vision_latency_ms: u64,

    /// Position of the simulated goal in the field frame, in inches
    pub goal_position: [f64; 2],

    /// Waypoints of the demonstration path
    pub waypoints: Vec<Waypoint>,

    /// Drive the path backwards
    pub reversed: bool,
}

impl Default for ExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.01,
            run_duration_s: 15.0,
            vision_period_s: 1.0 / 30.0,
            vision_latency_ms: 40,
            goal_position: [200.0, 60.0],
            waypoints: vec![
                Waypoint::new(0.0, 0.0, 0.0, 60.0),
                Waypoint::new(100.0, 0.0, 0.0, 60.0),
            ],
            reversed: false,
        }
    }
}
