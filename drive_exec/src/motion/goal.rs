//! Profile goals and constraints

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::epsilon_eq;

use super::MotionState;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const DEFAULT_POS_TOLERANCE: f64 = 1e-3;
pub const DEFAULT_VEL_TOLERANCE: f64 = 1e-2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state a profile should finish in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfileGoal {
    pos: f64,
    max_abs_vel: f64,
    completion_behavior: CompletionBehavior,
    pos_tolerance: f64,
    vel_tolerance: f64,
}

/// Velocity and acceleration limits of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionProfileConstraints {
    max_abs_vel: f64,
    max_abs_acc: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What to do when the goal velocity can't be met at the goal position
/// without breaking the constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionBehavior {
    /// Overshoot the goal, then come back to it.
    Overshoot,

    /// Arrive at the goal faster than the goal velocity.
    ViolateMaxAbsVel,

    /// Decelerate harder than the constraints allow.
    ViolateMaxAccel,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for CompletionBehavior {
    fn default() -> Self {
        CompletionBehavior::Overshoot
    }
}

impl MotionProfileGoal {
    /// A goal to come to rest at `pos`.
    pub fn new(pos: f64) -> Self {
        Self::with_vel(pos, 0.0)
    }

    /// A goal to pass `pos` at no more than `max_abs_vel`.
    pub fn with_vel(pos: f64, max_abs_vel: f64) -> Self {
        Self::with_behavior(pos, max_abs_vel, CompletionBehavior::default())
    }

    pub fn with_behavior(pos: f64, max_abs_vel: f64, completion_behavior: CompletionBehavior) -> Self {
        Self::with_tolerances(
            pos,
            max_abs_vel,
            completion_behavior,
            DEFAULT_POS_TOLERANCE,
            DEFAULT_VEL_TOLERANCE,
        )
    }

    /// Create a fully specified goal.
    ///
    /// Overshooting can't reach a non-zero goal velocity, so a goal with a
    /// velocity above the velocity tolerance is switched to
    /// [`CompletionBehavior::ViolateMaxAccel`].
    pub fn with_tolerances(
        pos: f64,
        max_abs_vel: f64,
        completion_behavior: CompletionBehavior,
        pos_tolerance: f64,
        vel_tolerance: f64,
    ) -> Self {
        let completion_behavior = if max_abs_vel > vel_tolerance
            && completion_behavior == CompletionBehavior::Overshoot
        {
            CompletionBehavior::ViolateMaxAccel
        } else {
            completion_behavior
        };

        Self {
            pos,
            max_abs_vel,
            completion_behavior,
            pos_tolerance,
            vel_tolerance,
        }
    }

    pub fn pos(&self) -> f64 {
        self.pos
    }

    pub fn max_abs_vel(&self) -> f64 {
        self.max_abs_vel
    }

    pub fn completion_behavior(&self) -> CompletionBehavior {
        self.completion_behavior
    }

    pub fn pos_tolerance(&self) -> f64 {
        self.pos_tolerance
    }

    pub fn vel_tolerance(&self) -> f64 {
        self.vel_tolerance
    }

    /// The goal mirrored about zero position.
    pub fn flipped(&self) -> Self {
        Self::with_tolerances(
            -self.pos,
            self.max_abs_vel,
            self.completion_behavior,
            self.pos_tolerance,
            self.vel_tolerance,
        )
    }

    pub fn at_goal_pos(&self, pos: f64) -> bool {
        epsilon_eq(pos, self.pos, self.pos_tolerance)
    }

    /// Whether `state` satisfies the goal.
    ///
    /// With [`CompletionBehavior::ViolateMaxAbsVel`] any velocity at the goal
    /// position is accepted.
    pub fn at_goal_state(&self, state: &MotionState) -> bool {
        self.at_goal_pos(state.pos)
            && (state.vel.abs() < (self.max_abs_vel + self.vel_tolerance)
                || self.completion_behavior == CompletionBehavior::ViolateMaxAbsVel)
    }

    /// Whether the goals differ by more than `tolerance` in position or
    /// velocity, or differ in any other setting.
    pub fn differs_from(&self, other: &Self, tolerance: f64) -> bool {
        !epsilon_eq(self.pos, other.pos, tolerance)
            || !epsilon_eq(self.max_abs_vel, other.max_abs_vel, tolerance)
            || self.completion_behavior != other.completion_behavior
            || self.pos_tolerance != other.pos_tolerance
            || self.vel_tolerance != other.vel_tolerance
    }
}

impl MotionProfileConstraints {
    /// Create constraints, the sign of the limits is ignored.
    pub fn new(max_abs_vel: f64, max_abs_acc: f64) -> Self {
        Self {
            max_abs_vel: max_abs_vel.abs(),
            max_abs_acc: max_abs_acc.abs(),
        }
    }

    pub fn max_abs_vel(&self) -> f64 {
        self.max_abs_vel
    }

    pub fn max_abs_acc(&self) -> f64 {
        self.max_abs_acc
    }

    /// Whether either limit differs by more than `tolerance`.
    pub fn differs_from(&self, other: &Self, tolerance: f64) -> bool {
        !epsilon_eq(self.max_abs_vel, other.max_abs_vel, tolerance)
            || !epsilon_eq(self.max_abs_acc, other.max_abs_acc, tolerance)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_behavior_sanity_check() {
        let goal = MotionProfileGoal::new(10.0);
        assert_eq!(goal.completion_behavior(), CompletionBehavior::Overshoot);

        let goal = MotionProfileGoal::with_vel(10.0, 5.0);
        assert_eq!(goal.completion_behavior(), CompletionBehavior::ViolateMaxAccel);

        let goal = MotionProfileGoal::with_behavior(10.0, 5.0, CompletionBehavior::ViolateMaxAbsVel);
        assert_eq!(goal.completion_behavior(), CompletionBehavior::ViolateMaxAbsVel);
    }

    #[test]
    fn test_at_goal() {
        let goal = MotionProfileGoal::with_vel(10.0, 5.0);
        assert!(goal.at_goal_pos(10.0005));
        assert!(!goal.at_goal_pos(10.1));
        assert!(goal.at_goal_state(&MotionState::new(0.0, 10.0, -5.0, 0.0)));
        assert!(!goal.at_goal_state(&MotionState::new(0.0, 10.0, 6.0, 0.0)));

        let flipped = goal.flipped();
        assert_eq!(flipped.pos(), -10.0);
        assert_eq!(flipped.max_abs_vel(), 5.0);
        assert!(flipped.at_goal_state(&MotionState::new(0.0, -10.0, -5.0, 0.0)));

        let goal = MotionProfileGoal::with_behavior(1.0, 0.0, CompletionBehavior::ViolateMaxAbsVel);
        assert!(goal.at_goal_state(&MotionState::new(0.0, 1.0, 100.0, 0.0)));
    }

    #[test]
    fn test_differs_from() {
        let a = MotionProfileGoal::new(10.0);
        assert!(!a.differs_from(&MotionProfileGoal::new(10.0 + 1e-9), 1e-6));
        assert!(a.differs_from(&MotionProfileGoal::new(10.1), 1e-6));

        let c = MotionProfileConstraints::new(-10.0, 5.0);
        assert_eq!(c.max_abs_vel(), 10.0);
        assert!(!c.differs_from(&MotionProfileConstraints::new(10.0, 5.0), 1e-6));
        assert!(c.differs_from(&MotionProfileConstraints::new(10.0, 6.0), 1e-6));
    }
}
