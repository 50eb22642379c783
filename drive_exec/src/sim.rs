//! # Simulation
//!
//! A perfect drivetrain and a camera looking at a single goal, standing in
//! for the hardware when running the executable on a development machine.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde_json::json;

use drive_lib::{
    loc::{DriveSensors, DriveVelocity, Kinematics, RobotStateParams},
    pose::{RigidTransform, Rotation, Translation},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drivetrain which executes wheel demands exactly.
pub struct SimDrivetrain {
    kinematics: Kinematics,
    pose: RigidTransform,
    sensors: DriveSensors,
}

/// Camera which sees one goal whenever it is in front of it.
pub struct SimCamera {
    goal: Translation,
    vehicle_to_camera: RigidTransform,
    pitch: Rotation,
    yaw: Rotation,
    differential_height: f64,
    target_radius: f64,
    latency_ms: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimDrivetrain {
    pub fn new(kinematics: Kinematics) -> Self {
        Self {
            kinematics,
            pose: RigidTransform::identity(),
            sensors: DriveSensors::default(),
        }
    }

    /// True pose of the robot.
    pub fn pose(&self) -> RigidTransform {
        self.pose
    }

    pub fn sensors(&self) -> DriveSensors {
        self.sensors
    }

    /// Drive at the given wheel velocities for `dt` seconds, returning the
    /// sensor readings at the end.
    pub fn step(&mut self, t: f64, dt: f64, wheels: &DriveVelocity) -> DriveSensors {
        let delta = self.kinematics.forward(wheels.left * dt, wheels.right * dt);
        self.pose = Kinematics::integrate(&self.pose, &delta);

        self.sensors = DriveSensors {
            t,
            left_distance: self.sensors.left_distance + wheels.left * dt,
            right_distance: self.sensors.right_distance + wheels.right * dt,
            left_velocity: wheels.left,
            right_velocity: wheels.right,
            gyro_angle: self.pose.rotation(),
        };

        self.sensors
    }
}

impl SimCamera {
    pub fn new(goal: Translation, params: &RobotStateParams, latency_ms: u64) -> Self {
        Self {
            goal,
            vehicle_to_camera: RigidTransform::from_translation(Translation::new(
                params.camera_x_offset,
                params.camera_y_offset,
            )),
            pitch: Rotation::from_degrees(params.camera_pitch_deg),
            yaw: Rotation::from_degrees(params.camera_yaw_deg),
            differential_height: params.target_height - params.camera_z_offset,
            target_radius: params.target_radius,
            latency_ms,
        }
    }

    /// The JSON report of one camera frame taken at `field_to_vehicle`.
    pub fn frame(&self, field_to_vehicle: &RigidTransform) -> String {
        let camera_to_goal = field_to_vehicle
            .transform_by(&self.vehicle_to_camera)
            .inverse()
            .transform_by(&RigidTransform::from_translation(self.goal))
            .translation();

        // Horizontal distance to the front face of the target
        let range = camera_to_goal.norm() - self.target_radius;
        let bearing = camera_to_goal.direction();

        let targets = if range > 0.0 {
            // Direction to the top of the target in a level camera frame
            let x_level = range * bearing.cos();
            let y_level = range * bearing.sin();
            let z_level = self.differential_height;

            // Tilt up by the camera's pitch, then yaw
            let x_pitch = x_level * self.pitch.cos() + z_level * self.pitch.sin();
            let z_pitch = z_level * self.pitch.cos() - x_level * self.pitch.sin();
            let x = x_pitch * self.yaw.cos() + y_level * self.yaw.sin();
            let y = y_level * self.yaw.cos() - x_pitch * self.yaw.sin();

            if x > 0.0 {
                vec![json!({ "y": y / x, "z": z_pitch / x })]
            } else {
                vec![]
            }
        } else {
            vec![]
        };

        json!({
            "capturedAgoMs": self.latency_ms,
            "targets": targets,
        })
        .to_string()
    }
}
