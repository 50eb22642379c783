//! Minimum time profile generation
//!
//! Profiles are built from at most four phases: stopping if moving away from
//! the goal, accelerating, cruising at the velocity limit and decelerating to
//! the goal velocity. Which phases appear depends on how far a pure ramp can
//! carry the system compared to the distance remaining.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{
    CompletionBehavior, MotionProfile, MotionProfileConstraints, MotionProfileGoal,
    MotionSegment, MotionState,
};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Generate the minimum time profile from `prev_state` to `goal` within
/// `constraints`.
///
/// The start velocity and acceleration are clamped to the constraints. If the
/// goal can't be met within the constraints the goal's
/// [`CompletionBehavior`] decides which constraint gives way.
pub fn generate_profile(
    constraints: &MotionProfileConstraints,
    goal: &MotionProfileGoal,
    prev_state: &MotionState,
) -> MotionProfile {
    let mut delta_pos = goal.pos() - prev_state.pos;

    // Only positive moves are solved directly
    if delta_pos < 0.0 || (delta_pos == 0.0 && prev_state.vel < 0.0) {
        return generate_flipped_profile(constraints, goal, prev_state);
    }

    let max_abs_acc = constraints.max_abs_acc();

    let mut start_state = MotionState::new(
        prev_state.t,
        prev_state.pos,
        prev_state.vel.signum() * prev_state.vel.abs().min(constraints.max_abs_vel()),
        prev_state.acc.signum() * prev_state.acc.abs().min(max_abs_acc),
    );
    let mut profile = MotionProfile::new();
    profile.reset(start_state);

    // Heading away from the goal, stop first
    if start_state.vel < 0.0 && delta_pos > 0.0 {
        let stopping_time = (start_state.vel / max_abs_acc).abs();
        profile.append_control(max_abs_acc, stopping_time);
        start_state = end_state_or(&profile, start_state);
        delta_pos = goal.pos() - start_state.pos;
    }

    // From here start_state.vel >= 0
    let min_abs_vel_at_goal_sqr = start_state.vel2() - 2.0 * max_abs_acc * delta_pos;
    let min_abs_vel_at_goal = min_abs_vel_at_goal_sqr.abs().sqrt();
    let max_abs_vel_at_goal = (start_state.vel2() + 2.0 * max_abs_acc * delta_pos).sqrt();
    let mut goal_vel = goal.max_abs_vel();
    let mut max_acc = max_abs_acc;

    if min_abs_vel_at_goal_sqr > 0.0
        && min_abs_vel_at_goal > (goal.max_abs_vel() + goal.vel_tolerance())
    {
        // Can't slow down enough before the goal
        match goal.completion_behavior() {
            CompletionBehavior::ViolateMaxAbsVel => {
                goal_vel = min_abs_vel_at_goal;
            }
            CompletionBehavior::ViolateMaxAccel => {
                if delta_pos.abs() < goal.pos_tolerance() {
                    // Already at the goal, so the velocity change has to be
                    // instantaneous
                    let end = end_state_or(&profile, start_state);
                    profile.append_segment(MotionSegment::new(
                        MotionState::new(end.t, end.pos, end.vel, std::f64::NEG_INFINITY),
                        MotionState::new(end.t, end.pos, goal_vel, std::f64::NEG_INFINITY),
                    ));
                    profile.consolidate();
                    return profile;
                }
                max_acc = (goal_vel * goal_vel - start_state.vel2()).abs() / (2.0 * delta_pos);
            }
            CompletionBehavior::Overshoot => {
                let stopping_time = (start_state.vel / max_abs_acc).abs();
                profile.append_control(-max_abs_acc, stopping_time);

                // Now past the goal, so come back the other way
                let stopped = end_state_or(&profile, start_state);
                profile.append_profile(&generate_flipped_profile(constraints, goal, &stopped));
                profile.consolidate();
                return profile;
            }
        }
    }

    goal_vel = goal_vel.min(max_abs_vel_at_goal);

    // Peak velocity where the acceleration ramp from the start meets the
    // deceleration ramp into the goal:
    //   v_max^2 = v_start^2 + 2 a d_accel
    //   v_goal^2 = v_max^2 - 2 a d_decel
    //   delta_pos = d_accel + d_decel
    let v_max = constraints
        .max_abs_vel()
        .min(((start_state.vel2() + goal_vel * goal_vel) / 2.0 + delta_pos * max_acc).sqrt());

    if v_max > start_state.vel {
        let accel_time = (v_max - start_state.vel) / max_acc;
        profile.append_control(max_acc, accel_time);
        start_state = end_state_or(&profile, start_state);
    }

    let distance_decel =
        ((start_state.vel2() - goal_vel * goal_vel) / (2.0 * max_abs_acc)).max(0.0);
    let distance_cruise = (goal.pos() - start_state.pos - distance_decel).max(0.0);

    if distance_cruise > 0.0 {
        let cruise_time = distance_cruise / start_state.vel;
        profile.append_control(0.0, cruise_time);
        start_state = end_state_or(&profile, start_state);
    }

    if distance_decel > 0.0 {
        let decel_time = (start_state.vel - goal_vel) / max_acc;
        profile.append_control(-max_acc, decel_time);
    }

    profile.consolidate();
    profile
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn generate_flipped_profile(
    constraints: &MotionProfileConstraints,
    goal: &MotionProfileGoal,
    prev_state: &MotionState,
) -> MotionProfile {
    let mut profile = generate_profile(constraints, &goal.flipped(), &prev_state.flipped());
    profile.flip();
    profile
}

/// The profile is never empty after `reset`, the fallback only keeps this
/// free of panics.
fn end_state_or(profile: &MotionProfile, fallback: MotionState) -> MotionState {
    profile.end_state().unwrap_or(fallback)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const EPS: f64 = 1e-6;

    fn validate_profile(
        constraints: &MotionProfileConstraints,
        goal: &MotionProfileGoal,
        start: &MotionState,
        profile: &MotionProfile,
    ) {
        assert!(profile.is_valid(), "{}", profile);

        let start_state = profile.start_state().unwrap();
        assert_abs_diff_eq!(start_state.t, start.t, epsilon = EPS);
        assert_abs_diff_eq!(start_state.pos, start.pos, epsilon = EPS);
        assert_abs_diff_eq!(
            start_state.vel,
            start.vel.signum() * start.vel.abs().min(constraints.max_abs_vel()),
            epsilon = EPS
        );

        for s in profile.segments() {
            assert!(s.start.vel.abs() <= constraints.max_abs_vel() + EPS);
            assert!(s.end.vel.abs() <= constraints.max_abs_vel() + EPS);
            if goal.completion_behavior() != CompletionBehavior::ViolateMaxAccel {
                assert!(s.start.acc.abs() <= constraints.max_abs_acc() + EPS);
                assert!(s.end.acc.abs() <= constraints.max_abs_acc() + EPS);
            }
        }

        if goal.completion_behavior() != CompletionBehavior::ViolateMaxAbsVel {
            assert!(goal.at_goal_state(&profile.end_state().unwrap()), "{}", profile);
        } else {
            assert!(goal.at_goal_pos(profile.end_pos()), "{}", profile);
        }
    }

    fn check_profile(
        constraints: MotionProfileConstraints,
        goal: MotionProfileGoal,
        start: MotionState,
        expected_duration: f64,
        expected_length: f64,
    ) {
        let positive = generate_profile(&constraints, &goal, &start);
        assert_abs_diff_eq!(positive.duration(), expected_duration, epsilon = EPS);
        assert_abs_diff_eq!(positive.length(), expected_length, epsilon = EPS);
        validate_profile(&constraints, &goal, &start, &positive);

        // The mirrored problem takes the same time and distance
        let negative = generate_profile(&constraints, &goal.flipped(), &start.flipped());
        assert_abs_diff_eq!(negative.duration(), expected_duration, epsilon = EPS);
        assert_abs_diff_eq!(negative.length(), expected_length, epsilon = EPS);
        validate_profile(&constraints, &goal.flipped(), &start.flipped(), &negative);
    }

    fn limits() -> MotionProfileConstraints {
        MotionProfileConstraints::new(10.0, 10.0)
    }

    #[test]
    fn test_already_finished() {
        check_profile(
            limits(),
            MotionProfileGoal::new(0.0),
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            0.0,
            0.0,
        );
        check_profile(
            limits(),
            MotionProfileGoal::with_vel(2.0, 5.0),
            MotionState::new(0.0, 2.0, 5.0, 7.0),
            0.0,
            0.0,
        );
        check_profile(
            limits(),
            MotionProfileGoal::with_behavior(2.0, 5.0, CompletionBehavior::ViolateMaxAbsVel),
            MotionState::new(0.0, 2.0, 9.0, 7.0),
            0.0,
            0.0,
        );
        check_profile(
            limits(),
            MotionProfileGoal::with_behavior(2.0, 5.0, CompletionBehavior::ViolateMaxAccel),
            MotionState::new(0.0, 2.0, 9.0, 7.0),
            0.0,
            0.0,
        );
    }

    #[test]
    fn test_stationary_to_stationary() {
        // Trapezoid
        check_profile(
            limits(),
            MotionProfileGoal::new(100.0),
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            11.0,
            100.0,
        );
        // Triangle
        check_profile(
            limits(),
            MotionProfileGoal::new(10.0),
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            2.0,
            10.0,
        );
    }

    #[test]
    fn test_moving_towards_to_stationary() {
        check_profile(
            limits(),
            MotionProfileGoal::new(100.0),
            MotionState::new(0.0, 0.0, 10.0, 0.0),
            10.5,
            100.0,
        );
        check_profile(
            limits(),
            MotionProfileGoal::new(10.0),
            MotionState::new(0.0, 0.0, 5.0, 0.0),
            1.625,
            10.0,
        );
        // Cruise then stop
        check_profile(
            limits(),
            MotionProfileGoal::new(10.0),
            MotionState::new(0.0, 0.0, 10.0, 0.0),
            1.5,
            10.0,
        );
        // Overshoot and come back
        check_profile(
            limits(),
            MotionProfileGoal::new(0.0),
            MotionState::new(0.0, 0.0, 10.0, 0.0),
            1.0 + 2.0_f64.sqrt(),
            10.0,
        );
        check_profile(
            limits(),
            MotionProfileGoal::with_behavior(1.0, 0.0, CompletionBehavior::ViolateMaxAbsVel),
            MotionState::new(0.0, 0.0, 10.0, 0.0),
            (10.0 - 80.0_f64.sqrt()) / 10.0,
            1.0,
        );
        check_profile(
            limits(),
            MotionProfileGoal::with_behavior(1.0, 0.0, CompletionBehavior::ViolateMaxAccel),
            MotionState::new(0.0, 0.0, 10.0, 0.0),
            0.2,
            1.0,
        );
    }

    #[test]
    fn test_moving_away_to_stationary() {
        check_profile(
            limits(),
            MotionProfileGoal::new(100.0),
            MotionState::new(0.0, 0.0, -10.0, 0.0),
            12.5,
            110.0,
        );
        check_profile(
            limits(),
            MotionProfileGoal::new(5.0),
            MotionState::new(0.0, 0.0, -10.0, 0.0),
            3.0,
            15.0,
        );
    }

    #[test]
    fn test_stationary_to_moving() {
        check_profile(
            limits(),
            MotionProfileGoal::with_vel(100.0, 10.0),
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            10.5,
            100.0,
        );
        check_profile(
            limits(),
            MotionProfileGoal::with_vel(100.0, 5.0),
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            10.625,
            100.0,
        );
        // Pure acceleration
        check_profile(
            limits(),
            MotionProfileGoal::with_vel(1.0, 10.0),
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            (1.0_f64 / 5.0).sqrt(),
            1.0,
        );
        check_profile(
            limits(),
            MotionProfileGoal::with_vel(8.75, 5.0),
            MotionState::new(0.0, 0.0, 0.0, 0.0),
            1.5,
            8.75,
        );
    }

    #[test]
    fn test_moving_towards_to_moving() {
        // Pure acceleration
        check_profile(
            limits(),
            MotionProfileGoal::with_vel(3.75, 10.0),
            MotionState::new(0.0, 0.0, 5.0, 0.0),
            0.5,
            3.75,
        );
        // Pure deceleration
        check_profile(
            limits(),
            MotionProfileGoal::with_vel(10.0, 5.0),
            MotionState::new(0.0, 0.0, 10.0, 0.0),
            1.125,
            10.0,
        );
    }

    #[test]
    fn test_goal_equals_start_is_empty_motion() {
        let start = MotionState::new(3.0, 42.0, 0.0, 0.0);
        let profile = generate_profile(&limits(), &MotionProfileGoal::new(42.0), &start);
        assert_eq!(profile.duration(), 0.0);
        assert_eq!(profile.length(), 0.0);
    }
}
