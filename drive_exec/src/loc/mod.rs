//! # Localisation
//!
//! [`RobotState`] keeps track of where the robot is on the field over time,
//! and of where the goals are.
//!
//! Frames of interest, from parent to child:
//!
//! 1. Field frame, with its origin wherever the robot was reset.
//! 2. Vehicle frame, at the centre of the wheelbase facing forwards.
//! 3. Camera frame, at the camera imager.
//! 4. Goal frames, one per tracked goal, at the centre of the goal.
//!
//! Field to vehicle is integrated from the wheel encoders and gyro and will
//! drift slowly. Vehicle to camera is a constant. Camera to goal is measured
//! by vision.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod estimator;
mod history;
mod kinematics;
mod params;
mod vision;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard};

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::goal_tracker::GoalTracker;
use crate::pose::{RigidTransform, Rotation, Translation, Twist};
use util::archive::ArchiveError;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use estimator::{DriveSensors, EstimatorOutput, EstimatorReport, RobotStateEstimator};
pub use history::History;
pub use kinematics::{DriveVelocity, Kinematics};
pub use params::RobotStateParams;
pub use vision::{TargetInfo, VisionError, VisionMailbox, VisionProcessor, VisionUpdate};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pose history and goal tracking for one match.
///
/// Shared between the control loop and the vision thread. The odometry and
/// the vision data are each behind their own lock, held only for a single
/// update.
#[derive(Debug)]
pub struct RobotState {
    params: RobotStateParams,

    vehicle_to_camera: RigidTransform,
    camera_pitch_correction: Rotation,
    camera_yaw_correction: Rotation,

    /// Height of the target above the camera
    differential_height: f64,

    odometry: Mutex<Odometry>,
    vision: Mutex<Vision>,
}

/// Where to aim to hit a goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AimingParameters {
    /// Distance from the robot to the goal, in inches
    pub range: f64,

    /// Direction of the goal in the vehicle's translation frame
    pub robot_to_goal: Rotation,

    /// Time the goal was last seen
    pub last_seen_timestamp: f64,

    pub stability: f64,

    /// Id of the goal track aimed at
    pub track_id: usize,
}

#[derive(Debug)]
struct Odometry {
    field_to_vehicle: History<RigidTransform>,
    velocity_measured: Twist,
    velocity_predicted: Twist,
    distance_driven: f64,
}

#[derive(Debug)]
struct Vision {
    goal_tracker: GoalTracker,
    cached_aiming_params: Option<AimingParameters>,
    last_track_id: Option<usize>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur in the localisation module.
#[derive(Debug, Error)]
pub enum LocError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Could not archive the estimator output: {0}")]
    ArchiveError(ArchiveError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobotState {
    /// Create a robot state at the origin at time zero.
    pub fn new(params: RobotStateParams) -> Self {
        Self {
            vehicle_to_camera: RigidTransform::from_translation(Translation::new(
                params.camera_x_offset,
                params.camera_y_offset,
            )),
            camera_pitch_correction: Rotation::from_degrees(-params.camera_pitch_deg),
            camera_yaw_correction: Rotation::from_degrees(-params.camera_yaw_deg),
            differential_height: params.target_height - params.camera_z_offset,
            odometry: Mutex::new(Odometry::new(&params, 0.0, RigidTransform::identity())),
            vision: Mutex::new(Vision::new(&params)),
            params,
        }
    }

    /// Create a robot state from a parameter file.
    pub fn from_params_file(param_file_path: &str) -> Result<Self, LocError> {
        let params: RobotStateParams =
            util::params::load(param_file_path).map_err(LocError::ParamLoadError)?;
        Ok(Self::new(params))
    }

    pub fn params(&self) -> &RobotStateParams {
        &self.params
    }

    /// Forget everything and place the robot at `initial_field_to_vehicle`.
    pub fn reset(&self, start_time: f64, initial_field_to_vehicle: RigidTransform) {
        *self.odometry() = Odometry::new(&self.params, start_time, initial_field_to_vehicle);
        *self.vision() = Vision::new(&self.params);

        info!(
            "Robot state reset to {} at t = {:.3} s",
            initial_field_to_vehicle, start_time
        );
    }

    pub fn reset_distance_driven(&self) {
        self.odometry().distance_driven = 0.0;
    }

    /// The pose at time `t`, interpolated between the stored poses.
    pub fn get_field_to_vehicle(&self, t: f64) -> RigidTransform {
        self.odometry()
            .field_to_vehicle
            .get_interpolated(t)
            .unwrap_or_default()
    }

    /// The most recent pose and its time.
    pub fn get_latest_field_to_vehicle(&self) -> (f64, RigidTransform) {
        self.odometry().latest()
    }

    /// Where the robot will be after `lookahead_time` seconds at the
    /// predicted velocity.
    pub fn get_predicted_field_to_vehicle(&self, lookahead_time: f64) -> RigidTransform {
        let odometry = self.odometry();
        let (_, latest) = odometry.latest();
        latest.transform_by(&RigidTransform::exp(
            &odometry.velocity_predicted.scaled(lookahead_time),
        ))
    }

    pub fn get_field_to_camera(&self, t: f64) -> RigidTransform {
        self.get_field_to_vehicle(t)
            .transform_by(&self.vehicle_to_camera)
    }

    /// Smoothed positions of the tracked goals.
    pub fn get_captured_field_to_goals(&self) -> Vec<RigidTransform> {
        self.vision()
            .goal_tracker
            .tracks()
            .iter()
            .map(|r| RigidTransform::from_translation(r.field_to_goal))
            .collect()
    }

    pub fn has_goal_tracks(&self) -> bool {
        self.vision().goal_tracker.has_tracks()
    }

    /// Record a measured pose.
    pub fn add_field_to_vehicle_observation(&self, t: f64, observation: RigidTransform) {
        self.odometry().field_to_vehicle.insert(t, observation);
        self.vision().cached_aiming_params = None;
    }

    /// Integrate a measured velocity onto the latest pose.
    pub fn add_observations(&self, t: f64, measured_velocity: Twist, predicted_velocity: Twist) {
        {
            let mut odometry = self.odometry();
            let (_, latest) = odometry.latest();
            let pose = Kinematics::integrate(&latest, &measured_velocity);

            odometry.field_to_vehicle.insert(t, pose);
            odometry.velocity_measured = measured_velocity;
            odometry.velocity_predicted = predicted_velocity;
        }

        self.vision().cached_aiming_params = None;
    }

    /// Add the targets seen by the camera at time `t`.
    ///
    /// Each target direction is corrected for the camera's yaw and pitch and
    /// intersected with the plane of the top of the target. Directions which
    /// point below the plane are dropped.
    pub fn add_vision_update(&self, t: f64, targets: &[TargetInfo]) {
        let field_to_camera = self.get_field_to_camera(t);

        let field_to_goals: Vec<Translation> = targets
            .iter()
            .filter_map(|target| self.target_to_field(&field_to_camera, target))
            .collect();

        let mut vision = self.vision();
        vision.goal_tracker.update(t, &field_to_goals);
        vision.cached_aiming_params = None;
    }

    /// Aiming parameters from the latest pose to the best ranked goal, or
    /// `None` if no goal is being tracked.
    ///
    /// The result is cached until the next vision update or pose
    /// observation.
    pub fn get_aiming_parameters(&self) -> Option<AimingParameters> {
        let (now, latest) = self.get_latest_field_to_vehicle();

        let mut vision = self.vision();
        if let Some(cached) = vision.cached_aiming_params {
            return Some(cached);
        }

        let best = vision
            .goal_tracker
            .ranked_tracks(now, vision.last_track_id)
            .into_iter()
            .next()?;

        let robot_to_goal = latest.translation().inverse().translate_by(&best.field_to_goal);
        let params = AimingParameters {
            range: robot_to_goal.norm(),
            robot_to_goal: robot_to_goal.direction(),
            last_seen_timestamp: best.latest_timestamp,
            stability: best.stability,
            track_id: best.id,
        };

        vision.cached_aiming_params = Some(params);
        vision.last_track_id = Some(best.id);

        Some(params)
    }

    /// The last aiming parameters computed, if still valid.
    pub fn get_cached_aiming_parameters(&self) -> Option<AimingParameters> {
        self.vision().cached_aiming_params
    }

    /// Drop all goal tracks.
    pub fn reset_vision(&self) {
        let mut vision = self.vision();
        vision.goal_tracker.reset();
        vision.cached_aiming_params = None;
    }

    /// Turn encoder deltas and the gyro heading into the distance moved
    /// since the latest pose, adding it to the distance driven.
    pub fn generate_odometry_from_sensors(
        &self,
        left_delta: f64,
        right_delta: f64,
        current_gyro_angle: &Rotation,
    ) -> Twist {
        let mut odometry = self.odometry();
        let (_, latest) = odometry.latest();

        let delta = Kinematics::forward_with_gyro(
            &latest.rotation(),
            left_delta,
            right_delta,
            current_gyro_angle,
        );
        odometry.distance_driven += delta.dx;

        delta
    }

    pub fn get_distance_driven(&self) -> f64 {
        self.odometry().distance_driven
    }

    pub fn get_predicted_velocity(&self) -> Twist {
        self.odometry().velocity_predicted
    }

    pub fn get_measured_velocity(&self) -> Twist {
        self.odometry().velocity_measured
    }

    fn target_to_field(
        &self,
        field_to_camera: &RigidTransform,
        target: &TargetInfo,
    ) -> Option<Translation> {
        let deadband = self.params.camera_deadband;
        let y = if target.y > -deadband && target.y < deadband {
            0.0
        } else {
            target.y
        };

        let yaw = &self.camera_yaw_correction;
        let x_yaw = target.x * yaw.cos() + y * yaw.sin();
        let y_yaw = y * yaw.cos() - target.x * yaw.sin();
        let z_yaw = target.z;

        let pitch = &self.camera_pitch_correction;
        let x_r = z_yaw * pitch.sin() + x_yaw * pitch.cos();
        let y_r = y_yaw;
        let z_r = z_yaw * pitch.cos() - x_yaw * pitch.sin();

        if z_r <= 0.0 {
            debug!("Rejected vision target {:?} pointing away from the target plane", target);
            return None;
        }

        let scaling = self.differential_height / z_r;
        let distance = x_r.hypot(y_r) * scaling + self.params.target_radius;
        let angle = Rotation::new(x_r, y_r);

        Some(
            field_to_camera
                .transform_by(&RigidTransform::from_translation(Translation::new(
                    distance * angle.cos(),
                    distance * angle.sin(),
                )))
                .translation(),
        )
    }

    fn odometry(&self) -> MutexGuard<Odometry> {
        self.odometry.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn vision(&self) -> MutexGuard<Vision> {
        self.vision.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RobotState {
    fn default() -> Self {
        Self::new(RobotStateParams::default())
    }
}

impl Odometry {
    fn new(params: &RobotStateParams, start_time: f64, initial: RigidTransform) -> Self {
        let mut field_to_vehicle = History::new(params.history_capacity);
        field_to_vehicle.insert(start_time, initial);

        Self {
            field_to_vehicle,
            velocity_measured: Twist::identity(),
            velocity_predicted: Twist::identity(),
            distance_driven: 0.0,
        }
    }

    fn latest(&self) -> (f64, RigidTransform) {
        self.field_to_vehicle
            .latest()
            .map(|(t, p)| (t, *p))
            .unwrap_or((0.0, RigidTransform::identity()))
    }
}

impl Vision {
    fn new(params: &RobotStateParams) -> Self {
        Self {
            goal_tracker: GoalTracker::new(params.goal_tracker),
            cached_aiming_params: None,
            last_track_id: None,
        }
    }
}
