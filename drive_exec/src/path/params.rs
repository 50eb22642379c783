//! Path construction parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters used when building and traversing a path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PathParams {
    /// Maximum acceleration (and deceleration) of the speed profiles, in
    /// inches/second^2.
    pub max_accel: f64,

    /// Distance from the end of the current segment at which it is
    /// considered complete, in inches.
    pub segment_completion_tolerance: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PathParams {
    fn default() -> Self {
        Self {
            max_accel: 120.0,
            segment_completion_tolerance: 0.1,
        }
    }
}
