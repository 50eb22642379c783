//! # Path follower
//!
//! Combines the pure pursuit steering controller with a speed profile
//! follower. Pursuit decides the curvature to drive at, the profile follower
//! decides how fast to drive along it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::Serialize;

use super::{AdaptivePurePursuit, PathFollowerParams, SteeringCommand};
use crate::motion::{
    CompletionBehavior, MotionProfileConstraints, MotionProfileGoal, MotionState, ProfileFollower,
};
use crate::path::Path;
use crate::pose::{RigidTransform, Twist};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Curvatures above this are not adjusted for inertia.
const MAX_CURVATURE: f64 = 1e6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Snapshot of one path follower update, flattened for archiving.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PathFollowerDebug {
    pub t: f64,
    pub pose_x: f64,
    pub pose_y: f64,
    pub pose_theta: f64,
    pub linear_displacement: f64,
    pub linear_velocity: f64,
    pub profile_displacement: f64,
    pub profile_velocity: f64,
    pub velocity_command_dx: f64,
    pub velocity_command_dy: f64,
    pub velocity_command_dtheta: f64,
    pub steering_command_dx: f64,
    pub steering_command_dy: f64,
    pub steering_command_dtheta: f64,
    pub cross_track_error: f64,
    pub along_track_error: f64,
    pub lookahead_point_x: f64,
    pub lookahead_point_y: f64,
    pub lookahead_point_velocity: f64,
}

/// Follows a path, producing body frame velocity commands.
#[derive(Debug, Clone)]
pub struct PathFollower {
    steering_controller: AdaptivePurePursuit,
    last_steering_delta: Twist,
    velocity_controller: ProfileFollower,

    inertia_gain: f64,
    max_profile_vel: f64,
    max_profile_acc: f64,
    goal_pos_tolerance: f64,
    goal_vel_tolerance: f64,
    stop_steering_distance: f64,

    override_finished: bool,
    done_steering: bool,
    finish_logged: bool,

    cross_track_error: f64,
    along_track_error: f64,
    debug: PathFollowerDebug,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathFollower {
    /// Follow `path`, backwards if `reversed` is set.
    pub fn new(path: Path, reversed: bool, params: &PathFollowerParams) -> Self {
        let mut velocity_controller =
            ProfileFollower::new(params.profile_gains, params.regen_tolerance);
        velocity_controller.set_constraints(MotionProfileConstraints::new(
            params.profile_max_abs_vel,
            params.profile_max_abs_acc,
        ));
        velocity_controller.set_min_output(params.min_output);
        velocity_controller.set_max_output(params.max_output);

        Self {
            steering_controller: AdaptivePurePursuit::new(path, reversed, params.lookahead),
            last_steering_delta: Twist::identity(),
            velocity_controller,
            inertia_gain: params.inertia_gain,
            max_profile_vel: params.profile_max_abs_vel,
            max_profile_acc: params.profile_max_abs_acc,
            goal_pos_tolerance: params.goal_pos_tolerance,
            goal_vel_tolerance: params.goal_vel_tolerance,
            stop_steering_distance: params.stop_steering_distance,
            override_finished: false,
            done_steering: false,
            finish_logged: false,
            cross_track_error: 0.0,
            along_track_error: 0.0,
            debug: PathFollowerDebug::default(),
        }
    }

    /// Compute the velocity command at time `t`.
    ///
    /// `displacement` is the distance driven so far (signed by direction of
    /// travel) and `velocity` the current linear velocity.
    pub fn update(
        &mut self,
        t: f64,
        pose: &RigidTransform,
        displacement: f64,
        velocity: f64,
    ) -> Twist {
        if !self.steering_controller.is_finished() && !self.done_steering {
            let steering_command = self.steering_controller.update(pose);

            self.debug.lookahead_point_x = steering_command.lookahead_point.x();
            self.debug.lookahead_point_y = steering_command.lookahead_point.y();
            self.debug.lookahead_point_velocity = steering_command.end_velocity;
            self.debug.steering_command_dx = steering_command.delta.dx;
            self.debug.steering_command_dy = steering_command.delta.dy;
            self.debug.steering_command_dtheta = steering_command.delta.dtheta;

            self.cross_track_error = steering_command.cross_track_error;
            self.last_steering_delta = steering_command.delta;
            self.set_profile_goal(displacement, &steering_command);

            if steering_command.remaining_path_length < self.stop_steering_distance {
                self.done_steering = true;
            }
        } else if !self.steering_controller.is_finished() {
            // The curvature stays latched, but pursuit still has to see the
            // end of the path. When it does, the profile goal moves to the
            // end of the path.
            let steering_command = self.steering_controller.update(pose);
            self.cross_track_error = steering_command.cross_track_error;

            if self.steering_controller.is_finished() {
                self.set_profile_goal(displacement, &steering_command);
            }
        }

        let velocity_command = self
            .velocity_controller
            .update(&MotionState::new(t, displacement, velocity, 0.0), t);
        self.along_track_error = self.velocity_controller.pos_error();

        let setpoint = self.velocity_controller.setpoint().unwrap_or_default();

        // Rebuild the angular rate from the steering curvature, scaled up by
        // the inertia gain at speed
        let curvature = self.last_steering_delta.dtheta / self.last_steering_delta.dx;
        let mut dtheta = self.last_steering_delta.dtheta;
        if !curvature.is_nan() && curvature.abs() < MAX_CURVATURE {
            dtheta = self.last_steering_delta.dx
                * curvature
                * (1.0 + self.inertia_gain * setpoint.vel.abs());
        }

        let scale = velocity_command / self.last_steering_delta.dx;
        let command = if scale.is_finite() {
            Twist::new(self.last_steering_delta.dx * scale, 0.0, dtheta * scale)
        } else {
            Twist::identity()
        };

        self.debug.t = t;
        self.debug.pose_x = pose.translation().x();
        self.debug.pose_y = pose.translation().y();
        self.debug.pose_theta = pose.rotation().radians();
        self.debug.linear_displacement = displacement;
        self.debug.linear_velocity = velocity;
        self.debug.profile_displacement = setpoint.pos;
        self.debug.profile_velocity = setpoint.vel;
        self.debug.velocity_command_dx = command.dx;
        self.debug.velocity_command_dy = command.dy;
        self.debug.velocity_command_dtheta = command.dtheta;
        self.debug.cross_track_error = self.cross_track_error;
        self.debug.along_track_error = self.along_track_error;

        if self.is_finished() && !self.finish_logged {
            info!(
                "Path following finished at t = {:.2} s, cross track error {:.3}, along track error {:.3}",
                t, self.cross_track_error, self.along_track_error
            );
            self.finish_logged = true;
        }

        command
    }

    fn set_profile_goal(&mut self, displacement: f64, steering_command: &SteeringCommand) {
        self.velocity_controller.set_goal_and_constraints(
            MotionProfileGoal::with_tolerances(
                displacement + steering_command.delta.dx,
                steering_command.end_velocity.abs(),
                CompletionBehavior::ViolateMaxAccel,
                self.goal_pos_tolerance,
                self.goal_vel_tolerance,
            ),
            MotionProfileConstraints::new(
                self.max_profile_vel.min(steering_command.max_velocity),
                self.max_profile_acc,
            ),
        );
    }

    pub fn cross_track_error(&self) -> f64 {
        self.cross_track_error
    }

    pub fn along_track_error(&self) -> f64 {
        self.along_track_error
    }

    /// Snapshot of the latest update.
    pub fn debug(&self) -> &PathFollowerDebug {
        &self.debug
    }

    /// Whether both steering and speed profile have completed, or following
    /// has been forced to finish.
    pub fn is_finished(&self) -> bool {
        (self.steering_controller.is_finished()
            && self.velocity_controller.is_finished_profile()
            && self.velocity_controller.on_target())
            || self.override_finished
    }

    /// Stop following on the next update.
    pub fn force_finish(&mut self) {
        self.override_finished = true;
    }

    pub fn has_passed_marker(&self, marker: &str) -> bool {
        self.steering_controller.has_passed_marker(marker)
    }
}
