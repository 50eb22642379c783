//! Speed dependent lookahead distance

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Maps the robot's speed onto a lookahead distance.
///
/// The distance is interpolated linearly between `min_distance` at
/// `min_speed` and `max_distance` at `max_speed`, and clamped outside that
/// band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lookahead {
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Lookahead {
    pub fn new(min_distance: f64, max_distance: f64, min_speed: f64, max_speed: f64) -> Self {
        Self {
            min_distance,
            max_distance,
            min_speed,
            max_speed,
        }
    }

    pub fn lookahead_for_speed(&self, speed: f64) -> f64 {
        let lookahead = util::maths::lin_map(
            (self.min_speed, self.max_speed),
            (self.min_distance, self.max_distance),
            speed,
        );

        if lookahead.is_nan() {
            self.min_distance
        } else {
            util::maths::clamp(lookahead, self.min_distance, self.max_distance)
        }
    }
}

impl Default for Lookahead {
    fn default() -> Self {
        Self::new(12.0, 24.0, 9.0, 120.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_lookahead_for_speed() {
        let l = Lookahead::new(12.0, 24.0, 9.0, 120.0);

        assert_abs_diff_eq!(l.lookahead_for_speed(9.0), 12.0);
        assert_abs_diff_eq!(l.lookahead_for_speed(120.0), 24.0);
        assert_abs_diff_eq!(l.lookahead_for_speed(64.5), 18.0, epsilon = 1e-9);

        // Clamped outside the band
        assert_abs_diff_eq!(l.lookahead_for_speed(0.0), 12.0);
        assert_abs_diff_eq!(l.lookahead_for_speed(500.0), 24.0);
    }

    #[test]
    fn test_degenerate_band() {
        // Zero width speed band with equal distances gives 0/0
        let l = Lookahead::new(16.0, 16.0, 10.0, 10.0);
        assert_abs_diff_eq!(l.lookahead_for_speed(10.0), 16.0);
        assert_abs_diff_eq!(l.lookahead_for_speed(50.0), 16.0);
    }
}
