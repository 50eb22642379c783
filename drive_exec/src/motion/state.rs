//! One dimensional kinematic state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::epsilon_eq;

use super::EPSILON;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Time, position, velocity and acceleration of a 1D system.
///
/// Acceleration is assumed constant when extrapolating forward or backward in
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionState {
    pub t: f64,
    pub pos: f64,
    pub vel: f64,
    pub acc: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionState {
    pub fn new(t: f64, pos: f64, vel: f64, acc: f64) -> Self {
        Self { t, pos, vel, acc }
    }

    pub fn vel2(&self) -> f64 {
        self.vel * self.vel
    }

    /// The state at time `t`, keeping the current acceleration.
    pub fn extrapolate(&self, t: f64) -> MotionState {
        self.extrapolate_with_acc(t, self.acc)
    }

    /// The state at time `t` when applying `acc` from this state.
    pub fn extrapolate_with_acc(&self, t: f64, acc: f64) -> MotionState {
        let dt = t - self.t;
        MotionState::new(
            t,
            self.pos + self.vel * dt + 0.5 * acc * dt * dt,
            self.vel + acc * dt,
            acc,
        )
    }

    /// The earliest time, no earlier than `self.t`, at which `pos` is reached.
    ///
    /// Returns `NAN` if the position is never reached.
    pub fn next_time_at_pos(&self, pos: f64) -> f64 {
        if epsilon_eq(pos, self.pos, EPSILON) {
            return self.t;
        }

        if epsilon_eq(self.acc, 0.0, EPSILON) {
            let delta_pos = pos - self.pos;
            if !epsilon_eq(self.vel, 0.0, EPSILON) && delta_pos.signum() == self.vel.signum() {
                return delta_pos / self.vel + self.t;
            }
            return std::f64::NAN;
        }

        let disc = self.vel2() - 2.0 * self.acc * (self.pos - pos);
        if disc < 0.0 {
            return std::f64::NAN;
        }

        let sqrt_disc = disc.sqrt();
        let max_dt = (-self.vel + sqrt_disc) / self.acc;
        let min_dt = (-self.vel - sqrt_disc) / self.acc;

        if min_dt >= 0.0 && (max_dt < 0.0 || min_dt < max_dt) {
            self.t + min_dt
        } else if max_dt >= 0.0 {
            self.t + max_dt
        } else {
            std::f64::NAN
        }
    }

    /// The same state mirrored about zero position.
    pub fn flipped(&self) -> MotionState {
        MotionState::new(self.t, -self.pos, -self.vel, -self.acc)
    }

    /// Whether every field is within `epsilon` of `other`.
    pub fn epsilon_eq(&self, other: &MotionState, epsilon: f64) -> bool {
        self.coincident_within(other, epsilon) && epsilon_eq(self.acc, other.acc, epsilon)
    }

    /// Whether time, position and velocity match, ignoring acceleration.
    pub fn coincident(&self, other: &MotionState) -> bool {
        self.coincident_within(other, EPSILON)
    }

    fn coincident_within(&self, other: &MotionState, epsilon: f64) -> bool {
        epsilon_eq(self.t, other.t, epsilon)
            && epsilon_eq(self.pos, other.pos, epsilon)
            && epsilon_eq(self.vel, other.vel, epsilon)
    }
}

impl std::fmt::Display for MotionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(t={:.4}, pos={:.4}, vel={:.4}, acc={:.4})",
            self.t, self.pos, self.vel, self.acc
        )
    }
}
