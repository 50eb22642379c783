//! Closed loop profile following

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;
use serde::Deserialize;

use super::{
    CompletionBehavior, MotionProfileConstraints, MotionProfileGoal, MotionState, Setpoint,
    SetpointGenerator,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains of the profile follower.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ProfileGains {
    /// Proportional gain on position error
    pub kp: f64,

    /// Integral gain on position error
    pub ki: f64,

    /// Proportional gain on velocity error
    pub kv: f64,

    /// Velocity feedforward
    pub kffv: f64,

    /// Acceleration feedforward
    pub kffa: f64,
}

/// Follows a motion profile with position PID plus velocity and acceleration
/// feedforward, outputting a velocity command.
///
/// The profile is generated internally from the goal and constraints and is
/// regenerated from the latest setpoint whenever either changes.
#[derive(Debug, Clone)]
pub struct ProfileFollower {
    gains: ProfileGains,
    min_output: f64,
    max_output: f64,

    goal: Option<MotionProfileGoal>,
    constraints: Option<MotionProfileConstraints>,
    setpoint_generator: SetpointGenerator,

    initial_state: Option<MotionState>,
    latest_actual_state: Option<MotionState>,
    latest_setpoint: Option<Setpoint>,

    latest_pos_error: f64,
    latest_vel_error: f64,
    total_error: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProfileFollower {
    /// Create a new follower with unlimited output.
    pub fn new(gains: ProfileGains, regen_tolerance: f64) -> Self {
        Self {
            gains,
            min_output: std::f64::NEG_INFINITY,
            max_output: std::f64::INFINITY,
            goal: None,
            constraints: None,
            setpoint_generator: SetpointGenerator::new(regen_tolerance),
            initial_state: None,
            latest_actual_state: None,
            latest_setpoint: None,
            latest_pos_error: std::f64::NAN,
            latest_vel_error: std::f64::NAN,
            total_error: 0.0,
        }
    }

    pub fn set_gains(&mut self, gains: ProfileGains) {
        self.gains = gains;
    }

    pub fn set_min_output(&mut self, min_output: f64) {
        self.min_output = min_output;
    }

    pub fn set_max_output(&mut self, max_output: f64) {
        self.max_output = max_output;
    }

    /// Drop the profile, goal and all controller state.
    pub fn reset_profile(&mut self) {
        self.latest_pos_error = std::f64::NAN;
        self.latest_vel_error = std::f64::NAN;
        self.latest_actual_state = None;
        self.setpoint_generator.reset();
        self.goal = None;
        self.constraints = None;
        self.reset_setpoint();
    }

    /// Restart the profile from the next reported state.
    pub fn reset_setpoint(&mut self) {
        self.total_error = 0.0;
        self.initial_state = None;
        self.latest_setpoint = None;
    }

    pub fn reset_integral(&mut self) {
        self.total_error = 0.0;
    }

    /// Set a new goal and constraints, used from the next update.
    ///
    /// Changing the goal clears the finished flag of the latest setpoint.
    pub fn set_goal_and_constraints(
        &mut self,
        goal: MotionProfileGoal,
        constraints: MotionProfileConstraints,
    ) {
        if let (Some(old_goal), Some(setpoint)) = (self.goal, self.latest_setpoint.as_mut()) {
            if old_goal != goal {
                setpoint.final_setpoint = false;
            }
        }
        self.goal = Some(goal);
        self.constraints = Some(constraints);
    }

    pub fn set_goal(&mut self, goal: MotionProfileGoal) {
        match self.constraints {
            Some(c) => self.set_goal_and_constraints(goal, c),
            None => {
                self.goal = Some(goal);
            }
        }
    }

    pub fn set_constraints(&mut self, constraints: MotionProfileConstraints) {
        self.constraints = Some(constraints);
    }

    pub fn goal(&self) -> Option<MotionProfileGoal> {
        self.goal
    }

    /// The latest setpoint state, if any update has been made.
    pub fn setpoint(&self) -> Option<MotionState> {
        self.latest_setpoint.map(|s| s.motion_state)
    }

    /// Compute the velocity command at time `t` given the measured state.
    ///
    /// Without a goal and constraints no command can be made and zero is
    /// returned.
    pub fn update(&mut self, latest_state: &MotionState, t: f64) -> f64 {
        let (goal, constraints) = match (self.goal, self.constraints) {
            (Some(g), Some(c)) => (g, c),
            _ => {
                warn!("Profile follower updated without a goal and constraints");
                return 0.0;
            }
        };

        self.latest_actual_state = Some(*latest_state);

        let prev_state = match self.latest_setpoint {
            Some(sp) => sp.motion_state,
            None => {
                self.initial_state = Some(*latest_state);
                *latest_state
            }
        };

        let dt = (t - prev_state.t).max(0.0);
        let setpoint = self
            .setpoint_generator
            .get_setpoint(&constraints, &goal, &prev_state, t);
        self.latest_setpoint = Some(setpoint);

        let sp = setpoint.motion_state;
        self.latest_pos_error = sp.pos - latest_state.pos;
        self.latest_vel_error = sp.vel - latest_state.vel;

        let acc_ff = if sp.acc.is_nan() {
            0.0
        } else {
            self.gains.kffa * sp.acc
        };
        let mut output = self.gains.kp * self.latest_pos_error
            + self.gains.kv * self.latest_vel_error
            + self.gains.kffv * sp.vel
            + acc_ff;

        // Only integrate while the output is not saturated
        if output >= self.min_output && output <= self.max_output {
            self.total_error += self.latest_pos_error * dt;
            output += self.gains.ki * self.total_error;
        } else {
            self.total_error = 0.0;
        }

        util::maths::clamp(output, self.min_output, self.max_output)
    }

    pub fn pos_error(&self) -> f64 {
        self.latest_pos_error
    }

    pub fn vel_error(&self) -> f64 {
        self.latest_vel_error
    }

    /// Whether the setpoint has reached the end of the profile.
    pub fn is_finished_profile(&self) -> bool {
        self.goal.is_some()
            && self
                .latest_setpoint
                .map_or(false, |sp| sp.final_setpoint)
    }

    /// Whether the measured state satisfies the goal.
    ///
    /// For goals which don't require the goal velocity exactly, having
    /// passed the goal position also counts.
    pub fn on_target(&self) -> bool {
        let goal = match self.goal {
            Some(g) => g,
            None => return false,
        };
        let (initial, actual) = match (self.initial_state, self.latest_actual_state) {
            (Some(i), Some(a)) if self.latest_setpoint.is_some() => (i, a),
            _ => return false,
        };

        let goal_to_start = goal.pos() - initial.pos;
        let goal_to_actual = goal.pos() - actual.pos;
        let passed_goal_state = goal_to_start.signum() * goal_to_actual.signum() < 0.0;

        goal.at_goal_state(&actual)
            || (goal.completion_behavior() != CompletionBehavior::Overshoot && passed_goal_state)
    }

    /// Rewrite the latest setpoint's position, used to unwrap angles.
    pub(super) fn map_setpoint_pos<F: FnOnce(f64) -> f64>(&mut self, f: F) {
        if let Some(ref mut sp) = self.latest_setpoint {
            sp.motion_state.pos = f(sp.motion_state.pos);
        }
    }
}

#[cfg(test)]
pub(super) mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Plant which reaches the commanded velocity exactly in one step.
    pub fn ideal_step(state: &MotionState, command_vel: f64, dt: f64) -> MotionState {
        let acc = (command_vel - state.vel) / dt;
        state.extrapolate_with_acc(state.t + dt, acc)
    }

    /// Plant with a deadband on the commanded velocity.
    fn deadband_step(state: &MotionState, command_vel: f64, dt: f64, deadband: f64) -> MotionState {
        let command_vel = if command_vel.abs() < deadband {
            0.0
        } else {
            command_vel.signum() * (command_vel.abs() - deadband)
        };
        ideal_step(state, command_vel, dt)
    }

    fn follow<P>(follower: &mut ProfileFollower, start: MotionState, dt: f64, max_iterations: usize, plant: P) -> MotionState
    where
        P: Fn(&MotionState, f64, f64) -> MotionState,
    {
        let mut state = start;
        for _ in 0..max_iterations {
            if follower.on_target() {
                break;
            }
            let t = state.t + dt;
            let command_vel = follower.update(&state, t);
            state = plant(&state, command_vel, dt);
        }
        state
    }

    fn gains(kp: f64, ki: f64, kv: f64, kffv: f64, kffa: f64) -> ProfileGains {
        ProfileGains { kp, ki, kv, kffv, kffa }
    }

    #[test]
    fn test_stationary_to_stationary_feedforward() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let goal = MotionProfileGoal::new(100.0);
        let mut follower = ProfileFollower::new(gains(0.0, 0.0, 0.0, 1.0, 0.0), 1e-6);
        follower.set_goal_and_constraints(goal, constraints);

        let end = follow(&mut follower, MotionState::new(0.0, 0.0, 0.0, 0.0), 0.01, 1500, ideal_step);
        assert!(goal.at_goal_state(&end), "{}", end);
        assert!(follower.is_finished_profile());
    }

    #[test]
    fn test_stationary_to_stationary_feedback() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let goal = MotionProfileGoal::with_tolerances(100.0, 0.0, CompletionBehavior::Overshoot, 1.0, 1.0);
        let mut follower = ProfileFollower::new(gains(0.5, 0.001, 0.5, 1.0, 0.1), 1e-6);
        follower.set_goal_and_constraints(goal, constraints);

        let end = follow(
            &mut follower,
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            0.01,
            3000,
            |s, v, dt| deadband_step(s, v, dt, 2.0),
        );
        assert!(goal.at_goal_state(&end), "{}", end);
    }

    #[test]
    fn test_moving_away_recovers() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let goal = MotionProfileGoal::new(50.0);
        let mut follower = ProfileFollower::new(gains(0.0, 0.0, 0.0, 1.0, 0.0), 1e-6);
        follower.set_goal_and_constraints(goal, constraints);

        let end = follow(&mut follower, MotionState::new(0.0, 0.0, -10.0, 0.0), 0.01, 2000, ideal_step);
        assert!(goal.at_goal_state(&end), "{}", end);
    }

    #[test]
    fn test_output_limits_and_reset() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let mut follower = ProfileFollower::new(gains(1.0, 1.0, 0.0, 1.0, 0.0), 1e-6);
        follower.set_max_output(1.0);
        follower.set_min_output(-1.0);

        // No goal, no command
        assert_eq!(follower.update(&MotionState::new(0.0, 0.0, 0.0, 0.0), 0.01), 0.0);

        follower.set_goal_and_constraints(MotionProfileGoal::new(100.0), constraints);
        // The first update starts the profile from the reported state, so
        // only the feedforward and a small position error contribute
        let out = follower.update(&MotionState::new(0.0, -50.0, 0.0, 0.0), 0.01);
        assert_abs_diff_eq!(out, 0.100505, epsilon = 1e-9);

        // Falling far behind the setpoint saturates the output
        let out = follower.update(&MotionState::new(0.01, -80.0, 0.0, 0.0), 0.02);
        assert_eq!(out, 1.0);
        assert!(follower.pos_error() > 29.0);
        assert!(!follower.is_finished_profile());

        follower.reset_profile();
        assert!(follower.goal().is_none());
        assert!(follower.setpoint().is_none());
        assert!(!follower.on_target());
    }

    #[test]
    fn test_update_goal_mid_profile() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let mut follower = ProfileFollower::new(gains(0.0, 0.0, 0.0, 1.0, 0.0), 1e-6);
        follower.set_goal_and_constraints(MotionProfileGoal::new(100.0), constraints);

        let mid = follow(&mut follower, MotionState::new(0.0, 0.0, 0.0, 0.0), 0.01, 500, ideal_step);
        assert!(!MotionProfileGoal::new(100.0).at_goal_state(&mid));

        let goal = MotionProfileGoal::new(0.0);
        follower.set_goal(goal);
        let end = follow(&mut follower, mid, 0.01, 1500, ideal_step);
        assert!(goal.at_goal_state(&end), "{}", end);
    }

    #[test]
    fn test_reset_setpoint_restarts_from_state() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let goal = MotionProfileGoal::new(100.0);
        let mut follower = ProfileFollower::new(gains(0.0, 0.0, 0.0, 1.0, 0.0), 1e-6);
        follower.set_goal_and_constraints(goal, constraints);

        let mid = follow(&mut follower, MotionState::new(0.0, 0.0, 0.0, 0.0), 0.01, 500, ideal_step);
        follower.reset_setpoint();
        assert!(follower.setpoint().is_none());
        let end = follow(&mut follower, mid, 0.01, 1500, ideal_step);
        assert!(goal.at_goal_state(&end), "{}", end);
    }

    #[test]
    fn test_scaled_dynamics() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let goal = MotionProfileGoal::with_tolerances(100.0, 0.0, CompletionBehavior::Overshoot, 1.0, 1.0);

        for &scale in &[0.8, 1.2] {
            let mut follower = ProfileFollower::new(gains(0.5, 0.001, 0.5, 1.0, 0.1), 1e-6);
            follower.set_goal_and_constraints(goal, constraints);
            let end = follow(
                &mut follower,
                MotionState::new(0.0, 0.0, 0.0, 0.0),
                0.01,
                2000,
                |s, v, dt| ideal_step(s, v * scale, dt),
            );
            assert!(goal.at_goal_state(&end), "scale {}: {}", scale, end);
        }
    }

    #[test]
    fn test_moving_to_goal_without_stopping() {
        let constraints = MotionProfileConstraints::new(10.0, 10.0);
        let goal = MotionProfileGoal::with_tolerances(-100.0, 10.0, CompletionBehavior::ViolateMaxAccel, 1.0, 0.1);
        let mut follower = ProfileFollower::new(gains(0.0, 0.0, 0.0, 1.0, 0.0), 1e-6);
        follower.set_goal_and_constraints(goal, constraints);

        let end = follow(
            &mut follower,
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            0.01,
            2000,
            |s, v, dt| ideal_step(s, v * 1.2, dt),
        );
        assert!(goal.at_goal_pos(end.pos), "{}", end);
    }
}
