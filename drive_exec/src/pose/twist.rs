//! Velocities and pose deltas

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A movement along a constant curvature arc, expressed in the body frame.
///
/// Used both as a velocity (per second) and as an integrated pose delta.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist {
    pub dx: f64,
    pub dy: f64,
    pub dtheta: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Twist {
    pub fn new(dx: f64, dy: f64, dtheta: f64) -> Self {
        Self { dx, dy, dtheta }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn scaled(&self, scale: f64) -> Twist {
        Twist::new(self.dx * scale, self.dy * scale, self.dtheta * scale)
    }

    /// Curvature of the arc, `dtheta / dx`.
    ///
    /// Not finite for a pure rotation.
    pub fn curvature(&self) -> f64 {
        self.dtheta / self.dx
    }
}

impl std::fmt::Display for Twist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(dx: {:.3}, dy: {:.3}, dtheta: {:.3} deg)",
            self.dx,
            self.dy,
            self.dtheta.to_degrees()
        )
    }
}
