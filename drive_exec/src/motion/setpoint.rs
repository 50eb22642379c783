//! Cached profile sampling

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use super::{generate_profile, MotionProfile, MotionProfileConstraints, MotionProfileGoal, MotionState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A sample of the active profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoint {
    pub motion_state: MotionState,

    /// Set once the profile is exhausted or its goal has been reached.
    pub final_setpoint: bool,
}

/// Samples a profile, regenerating it only when the request changes.
///
/// The profile is regenerated when the goal or constraints differ from the
/// cached ones, or when the previous state no longer lies on the cached
/// profile, all compared with `regen_tolerance`.
#[derive(Debug, Clone)]
pub struct SetpointGenerator {
    profile: Option<MotionProfile>,
    goal: Option<MotionProfileGoal>,
    constraints: Option<MotionProfileConstraints>,
    regen_tolerance: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SetpointGenerator {
    fn default() -> Self {
        Self::new(super::EPSILON)
    }
}

impl SetpointGenerator {
    pub fn new(regen_tolerance: f64) -> Self {
        Self {
            profile: None,
            goal: None,
            constraints: None,
            regen_tolerance,
        }
    }

    /// Forget the cached profile.
    pub fn reset(&mut self) {
        self.profile = None;
        self.goal = None;
        self.constraints = None;
    }

    /// The remaining part of the cached profile.
    pub fn profile(&self) -> Option<&MotionProfile> {
        self.profile.as_ref()
    }

    /// Get the setpoint at time `t` for a profile from `prev_state`.
    ///
    /// A final setpoint is snapped onto the goal position with zero
    /// acceleration.
    pub fn get_setpoint(
        &mut self,
        constraints: &MotionProfileConstraints,
        goal: &MotionProfileGoal,
        prev_state: &MotionState,
        t: f64,
    ) -> Setpoint {
        let regenerate = self.needs_regeneration(constraints, goal, prev_state);

        if regenerate {
            trace!("Regenerating profile from {} to goal {:?}", prev_state, goal);
            self.constraints = Some(*constraints);
            self.goal = Some(*goal);
            self.profile = Some(generate_profile(constraints, goal, prev_state));
        }

        let mut setpoint = Setpoint {
            motion_state: *prev_state,
            final_setpoint: true,
        };

        if let Some(ref mut profile) = self.profile {
            if !profile.is_empty() && profile.is_valid() {
                if let Some(state) = profile.state_by_time_clamped(t) {
                    profile.trim_before_time(t);
                    setpoint = Setpoint {
                        motion_state: state,
                        final_setpoint: profile.is_empty() || goal.at_goal_state(&state),
                    };
                }
            }
        }

        if setpoint.final_setpoint {
            let state = setpoint.motion_state;
            setpoint.motion_state = MotionState::new(
                state.t,
                goal.pos(),
                state.vel.signum() * goal.max_abs_vel().max(state.vel.abs()),
                0.0,
            );
        }

        setpoint
    }

    fn needs_regeneration(
        &self,
        constraints: &MotionProfileConstraints,
        goal: &MotionProfileGoal,
        prev_state: &MotionState,
    ) -> bool {
        let tol = self.regen_tolerance;

        let request_changed = match (&self.constraints, &self.goal, &self.profile) {
            (Some(c), Some(g), Some(_)) => c.differs_from(constraints, tol) || g.differs_from(goal, tol),
            _ => true,
        };
        if request_changed {
            return true;
        }

        match self.profile {
            Some(ref p) if !p.is_empty() => match p.state_by_time(prev_state.t) {
                Some(expected) => !expected.epsilon_eq(prev_state, tol),
                None => true,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion::CompletionBehavior;

    #[test]
    fn test_follows_cached_profile() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let goal = MotionProfileGoal::new(100.0);
        let mut gen = SetpointGenerator::default();

        let mut state = MotionState::new(0.0, 0.0, 0.0, 0.0);
        let dt = 0.01;
        let mut t = 0.0;
        let mut finished = false;
        for _ in 0..1500 {
            t += dt;
            let sp = gen.get_setpoint(&constraints, &goal, &state, t);
            state = sp.motion_state;
            if sp.final_setpoint {
                finished = true;
                break;
            }
        }

        assert!(finished);
        assert_eq!(state.pos, 100.0);
        assert!(goal.at_goal_state(&state));
        // The trapezoid takes 11 s
        assert!((t - 11.0).abs() < 2.0 * dt);
    }

    #[test]
    fn test_regenerates_on_divergence() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let goal = MotionProfileGoal::new(100.0);
        let mut gen = SetpointGenerator::new(1e-6);

        let start = MotionState::new(0.0, 0.0, 0.0, 0.0);
        let sp = gen.get_setpoint(&constraints, &goal, &start, 1.0);
        assert!(!sp.final_setpoint);
        assert_eq!(gen.profile().unwrap().start_time(), 1.0);

        // Jump well off the cached profile, the remaining profile now starts
        // from the new state
        let off_profile = MotionState::new(1.0, 50.0, 0.0, 0.0);
        let sp = gen.get_setpoint(&constraints, &goal, &off_profile, 1.5);
        assert!(sp.motion_state.pos > 50.0);
    }

    #[test]
    fn test_final_setpoint_snaps_to_goal() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let goal = MotionProfileGoal::with_behavior(10.0, 5.0, CompletionBehavior::ViolateMaxAccel);
        let mut gen = SetpointGenerator::default();

        let sp = gen.get_setpoint(
            &constraints,
            &goal,
            &MotionState::new(0.0, 0.0, 0.0, 0.0),
            100.0,
        );
        assert!(sp.final_setpoint);
        assert_eq!(sp.motion_state.pos, 10.0);
        assert_eq!(sp.motion_state.vel, 5.0);
        assert_eq!(sp.motion_state.acc, 0.0);
    }
}
