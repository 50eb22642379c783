//! Constant acceleration segments

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};
use util::maths::epsilon_eq;

use super::{MotionState, EPSILON};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pair of states joined by a period of constant acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSegment {
    pub start: MotionState,
    pub end: MotionState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionSegment {
    pub fn new(start: MotionState, end: MotionState) -> Self {
        Self { start, end }
    }

    /// Whether the segment is kinematically consistent.
    ///
    /// The acceleration must be constant, velocity may not change sign
    /// (unless one end is stationary) and the start must extrapolate onto the
    /// end. A zero duration segment with infinite acceleration is allowed as
    /// an instantaneous velocity change.
    pub fn is_valid(&self) -> bool {
        if !epsilon_eq(self.start.acc, self.end.acc, EPSILON) {
            trace!("Segment acceleration is not constant: {:?}", self);
            return false;
        }

        if self.start.vel.signum() * self.end.vel.signum() < 0.0
            && !epsilon_eq(self.start.vel, 0.0, EPSILON)
            && !epsilon_eq(self.end.vel, 0.0, EPSILON)
        {
            trace!("Segment velocity reverses: {:?}", self);
            return false;
        }

        if !self
            .start
            .extrapolate(self.end.t)
            .epsilon_eq(&self.end, EPSILON)
        {
            if self.start.t == self.end.t && self.start.acc.is_infinite() {
                return true;
            }
            trace!("Segment start does not reach its end: {:?}", self);
            return false;
        }

        true
    }

    pub fn contains_time(&self, t: f64) -> bool {
        t >= self.start.t && t <= self.end.t
    }

    pub fn contains_pos(&self, pos: f64) -> bool {
        (pos >= self.start.pos && pos <= self.end.pos)
            || (pos <= self.start.pos && pos >= self.end.pos)
    }

    /// The segment mirrored about zero position.
    pub fn flipped(&self) -> MotionSegment {
        MotionSegment::new(self.start.flipped(), self.end.flipped())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_valid() {
        // Acceleration changes
        let a = MotionSegment::new(
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            MotionState::new(0.0, 0.0, 0.0, 1.0),
        );
        assert!(!a.is_valid());

        // End doesn't match the start's extrapolation
        let a = MotionSegment::new(
            MotionState::new(0.0, 0.0, 0.0, 1.0),
            MotionState::new(1.0, 0.0, 1.0, 1.0),
        );
        assert!(!a.is_valid());

        let a = MotionSegment::new(
            MotionState::new(0.0, 0.0, 0.0, 1.0),
            MotionState::new(1.0, 0.5, 1.0, 1.0),
        );
        assert!(a.is_valid());

        // Velocity sign flip
        let a = MotionSegment::new(
            MotionState::new(0.0, 0.0, 1.0, -1.0),
            MotionState::new(2.0, 0.0, -1.0, -1.0),
        );
        assert!(!a.is_valid());

        // Instantaneous velocity change
        let a = MotionSegment::new(
            MotionState::new(1.0, 2.0, 9.0, std::f64::NEG_INFINITY),
            MotionState::new(1.0, 2.0, 5.0, std::f64::NEG_INFINITY),
        );
        assert!(a.is_valid());
    }

    #[test]
    fn test_contains() {
        let a = MotionSegment::new(
            MotionState::new(1.0, 2.0, -1.0, 0.0),
            MotionState::new(2.0, 1.0, -1.0, 0.0),
        );
        assert!(a.contains_time(1.5));
        assert!(!a.contains_time(2.5));
        assert!(a.contains_pos(1.5));
        assert!(!a.contains_pos(0.5));
    }
}
