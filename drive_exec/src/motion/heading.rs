//! Profile following for angular positions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::wrap_to_pi;

use super::{MotionProfileConstraints, MotionProfileGoal, MotionState, ProfileFollower, ProfileGains};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A [`ProfileFollower`] for headings in radians.
///
/// Setpoints and measured states are unwrapped around the goal before each
/// update, so the heading always takes the short way round.
#[derive(Debug, Clone)]
pub struct HeadingProfileFollower {
    follower: ProfileFollower,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HeadingProfileFollower {
    pub fn new(gains: ProfileGains, regen_tolerance: f64) -> Self {
        Self {
            follower: ProfileFollower::new(gains, regen_tolerance),
        }
    }

    pub fn follower(&self) -> &ProfileFollower {
        &self.follower
    }

    pub fn follower_mut(&mut self) -> &mut ProfileFollower {
        &mut self.follower
    }

    pub fn set_goal_and_constraints(
        &mut self,
        goal: MotionProfileGoal,
        constraints: MotionProfileConstraints,
    ) {
        self.follower.set_goal_and_constraints(goal, constraints);
    }

    /// Compute the angular velocity command at time `t`.
    ///
    /// Inside the goal's position tolerance the command is zero and the
    /// integral is cleared.
    pub fn update(&mut self, latest_state: &MotionState, t: f64) -> f64 {
        let goal = match self.follower.goal() {
            Some(g) => g,
            None => return self.follower.update(latest_state, t),
        };

        let unwrap = |pos: f64| goal.pos() + wrap_to_pi(pos - goal.pos());

        self.follower.map_setpoint_pos(unwrap);

        let unwrapped_state = MotionState::new(
            latest_state.t,
            unwrap(latest_state.pos),
            latest_state.vel,
            latest_state.acc,
        );

        let output = self.follower.update(&unwrapped_state, t);

        if (unwrapped_state.pos - goal.pos()).abs() < goal.pos_tolerance() {
            self.follower.reset_integral();
            return 0.0;
        }

        output
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Wrap the position of an angular state into (-pi, pi].
pub fn canonicalize(state: &MotionState) -> MotionState {
    MotionState::new(state.t, wrap_to_pi(state.pos), state.vel, state.acc)
}
