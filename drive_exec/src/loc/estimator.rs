//! # Robot state estimator
//!
//! Cyclic module which turns the drivetrain's encoder distances and gyro
//! heading into pose observations in the [`RobotState`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::{LocError, RobotState};
use crate::pose::{RigidTransform, Rotation, Twist};
use util::{archive::Archiver, module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Estimator module state
pub struct RobotStateEstimator {
    robot_state: Arc<RobotState>,

    left_prev_distance: f64,
    right_prev_distance: f64,

    arch_output: Archiver,
}

/// Drivetrain sensor readings for one cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveSensors {
    /// Time of the readings in seconds
    pub t: f64,

    /// Total distance travelled by each side, in inches
    pub left_distance: f64,
    pub right_distance: f64,

    /// Speed of each side in inches/second
    pub left_velocity: f64,
    pub right_velocity: f64,

    /// Absolute heading from the gyro
    pub gyro_angle: Rotation,
}

/// Output of the estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatorOutput {
    pub pose: RigidTransform,
    pub measured_velocity: Twist,
    pub predicted_velocity: Twist,
}

/// Status report of the estimator, also archived each cycle.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EstimatorReport {
    pub t: f64,
    pub pose_x: f64,
    pub pose_y: f64,
    pub pose_theta: f64,
    pub measured_dx: f64,
    pub measured_dtheta: f64,
    pub predicted_dx: f64,
    pub predicted_dtheta: f64,
    pub distance_driven: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobotStateEstimator {
    pub fn new(robot_state: Arc<RobotState>) -> Self {
        Self {
            robot_state,
            left_prev_distance: 0.0,
            right_prev_distance: 0.0,
            arch_output: Archiver::default(),
        }
    }

    pub fn robot_state(&self) -> &Arc<RobotState> {
        &self.robot_state
    }
}

impl State for RobotStateEstimator {
    type InitData = DriveSensors;
    type InitError = LocError;

    type InputData = DriveSensors;
    type OutputData = EstimatorOutput;
    type StatusReport = EstimatorReport;
    type ProcError = LocError;

    /// Initialise the estimator.
    ///
    /// Expected init data is the sensor readings at start up, which the
    /// first cycle's deltas are taken from.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.left_prev_distance = init_data.left_distance;
        self.right_prev_distance = init_data.right_distance;

        self.arch_output =
            Archiver::from_path(session, "robot_state.csv").map_err(LocError::ArchiveError)?;

        Ok(())
    }

    /// Add one cycle of odometry to the robot state.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let kinematics = self.robot_state.params().kinematics;

        let measured_velocity = self.robot_state.generate_odometry_from_sensors(
            input_data.left_distance - self.left_prev_distance,
            input_data.right_distance - self.right_prev_distance,
            &input_data.gyro_angle,
        );
        let predicted_velocity =
            kinematics.forward(input_data.left_velocity, input_data.right_velocity);

        self.robot_state
            .add_observations(input_data.t, measured_velocity, predicted_velocity);

        self.left_prev_distance = input_data.left_distance;
        self.right_prev_distance = input_data.right_distance;

        let (_, pose) = self.robot_state.get_latest_field_to_vehicle();
        trace!("Estimated pose {} at t = {:.3} s", pose, input_data.t);

        let report = EstimatorReport {
            t: input_data.t,
            pose_x: pose.translation().x(),
            pose_y: pose.translation().y(),
            pose_theta: pose.rotation().radians(),
            measured_dx: measured_velocity.dx,
            measured_dtheta: measured_velocity.dtheta,
            predicted_dx: predicted_velocity.dx,
            predicted_dtheta: predicted_velocity.dtheta,
            distance_driven: self.robot_state.get_distance_driven(),
        };
        self.arch_output
            .serialise(report)
            .map_err(LocError::ArchiveError)?;

        Ok((
            EstimatorOutput {
                pose,
                measured_velocity,
                predicted_velocity,
            },
            report,
        ))
    }
}
