//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use super::{PathFollower, PathFollowerParams};
use crate::loc::{DriveVelocity, Kinematics};
use crate::path::{build_path_from_waypoints, Path, PathError, Waypoint};
use crate::pose::{RigidTransform, Twist};
use util::{
    archive::{ArchiveError, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory control module state
#[derive(Default)]
pub struct TrajCtrl {
    params: PathFollowerParams,
    kinematics: Kinematics,

    /// Executing mode
    mode: TrajCtrlMode,

    /// Follower of the current path, `None` while no path is loaded
    follower: Option<PathFollower>,

    output: OutputData,
    report: StatusReport,

    arch_follower: Archiver,
}

/// Data needed to initialise TrajCtrl.
#[derive(Debug, Clone, Copy)]
pub struct InitData {
    /// Path of the parameter file relative to the params directory
    pub params_file: &'static str,

    /// Drivetrain geometry used to compute wheel velocities
    pub kinematics: Kinematics,
}

/// Input data to TrajCtrl.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Time of the cycle in seconds
    pub t: f64,

    /// Current pose of the robot in the field frame
    pub pose: RigidTransform,

    /// Signed distance driven since the path started, in inches
    pub displacement: f64,

    /// Current linear velocity in inches/second
    pub velocity: f64,
}

/// Output of TrajCtrl.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputData {
    /// Body frame velocity demand
    pub twist: Twist,

    /// Wheel velocity demands achieving `twist`
    pub wheels: DriveVelocity,
}

/// The status report containing monitoring quantities.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Distance from the robot to the path
    pub cross_track_error: f64,

    /// Distance between the planned and the actual displacement
    pub along_track_error: f64,

    /// True on the cycle in which the path was completed or aborted
    pub path_finished: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Could not archive path follower data: {0}")]
    ArchiveError(ArchiveError),

    #[error("Could not build the path: {0}")]
    PathError(PathError),

    /// A path is already loaded. This error occurs when attempting to start a
    /// new path before the current one has finished.
    #[error("Attempted to load a path while one is already being followed")]
    PathAlreadyLoaded,

    /// The module is following a path but no path is loaded.
    #[error("No path has been set")]
    NoPath,
}

/// The possible modes of execution of TrajCtrl. Each mode is handled by a
/// `mode_xyz` function.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TrajCtrlMode {
    Off,
    FollowPath,
    Finished,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TrajCtrlMode {
    fn default() -> Self {
        TrajCtrlMode::Off
    }
}

impl State for TrajCtrl {
    type InitData = InitData;
    type InitError = TrajCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = TrajCtrlError;

    /// Initialise the TrajCtrl module.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data.params_file).map_err(TrajCtrlError::ParamLoadError)?;
        self.kinematics = init_data.kinematics;

        self.arch_follower = Archiver::from_path(session, "path_follower.csv")
            .map_err(TrajCtrlError::ArchiveError)?;

        Ok(())
    }

    /// Process trajectory control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Setup cycle data
        self.output = OutputData::default();
        self.report = StatusReport::default();

        // Mode execution. Each of the mode functions sets the mode to switch
        // to or returns an error
        match self.mode {
            TrajCtrlMode::Off => self.mode_off(),
            TrajCtrlMode::FollowPath => self.mode_follow_path(input_data),
            TrajCtrlMode::Finished => self.mode_finished(),
        }?;

        Ok((self.output, self.report))
    }
}

impl TrajCtrl {
    /// Create the module with the given parameters, without archiving.
    pub fn new(params: PathFollowerParams, kinematics: Kinematics) -> Self {
        Self {
            params,
            kinematics,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> TrajCtrlMode {
        self.mode
    }

    pub fn params(&self) -> &PathFollowerParams {
        &self.params
    }

    /// Begin following a path, backwards if `reversed` is set.
    ///
    /// Following starts on the next call to `proc`. Loading a new path
    /// before the current one has finished is an error, use `abort_path`
    /// first.
    pub fn begin_path(&mut self, path: Path, reversed: bool) -> Result<(), TrajCtrlError> {
        if self.mode == TrajCtrlMode::FollowPath {
            return Err(TrajCtrlError::PathAlreadyLoaded);
        }

        info!(
            "Following path of {} segments, length {:.3}{}",
            path.len(),
            path.length(),
            if reversed { ", reversed" } else { "" }
        );

        self.follower = Some(PathFollower::new(path, reversed, &self.params));
        self.mode = TrajCtrlMode::FollowPath;

        Ok(())
    }

    /// Build a path from waypoints and begin following it.
    pub fn begin_path_from_waypoints(
        &mut self,
        waypoints: &[Waypoint],
        reversed: bool,
    ) -> Result<(), TrajCtrlError> {
        let path =
            build_path_from_waypoints(waypoints, &self.params.path).map_err(TrajCtrlError::PathError)?;
        self.begin_path(path, reversed)
    }

    /// Abort the current path.
    ///
    /// The follower is forced to finish, so the next call to `proc` stops
    /// the robot.
    pub fn abort_path(&mut self) {
        if let Some(ref mut follower) = self.follower {
            warn!("Aborting path following");
            follower.force_finish();
        }
    }

    /// Whether the robot has passed the segment carrying `marker` on the
    /// current path.
    pub fn has_passed_marker(&self, marker: &str) -> bool {
        match self.follower {
            Some(ref f) => f.has_passed_marker(marker),
            None => false,
        }
    }

    /// The path follower, while a path is loaded.
    pub fn follower(&self) -> Option<&PathFollower> {
        self.follower.as_ref()
    }

    /// Mode off.
    ///
    /// The robot is commanded to stay still. To start following a path call
    /// `begin_path`.
    fn mode_off(&mut self) -> Result<(), TrajCtrlError> {
        Ok(())
    }

    /// Mode following path.
    fn mode_follow_path(&mut self, input_data: &InputData) -> Result<(), TrajCtrlError> {
        let follower = self.follower.as_mut().ok_or(TrajCtrlError::NoPath)?;

        if follower.is_finished() {
            self.mode = TrajCtrlMode::Finished;
            return self.mode_finished();
        }

        let twist = follower.update(
            input_data.t,
            &input_data.pose,
            input_data.displacement,
            input_data.velocity,
        );

        self.report.cross_track_error = follower.cross_track_error();
        self.report.along_track_error = follower.along_track_error();

        self.arch_follower
            .serialise(*follower.debug())
            .map_err(TrajCtrlError::ArchiveError)?;

        if follower.is_finished() {
            // Stop now rather than executing the last command
            self.mode = TrajCtrlMode::Finished;
            self.mode_finished()
        } else {
            self.output = OutputData {
                twist,
                wheels: self.kinematics.inverse(&twist),
            };
            Ok(())
        }
    }

    /// Mode finished.
    ///
    /// Stops the robot, drops the path and switches off.
    fn mode_finished(&mut self) -> Result<(), TrajCtrlError> {
        self.output = OutputData::default();
        self.report.path_finished = true;

        self.follower = None;
        self.mode = TrajCtrlMode::Off;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion::ProfileGains;
    use crate::path::Lookahead;

    fn traj_ctrl() -> TrajCtrl {
        TrajCtrl::new(
            PathFollowerParams {
                lookahead: Lookahead::new(16.0, 16.0, 0.0, 120.0),
                profile_gains: ProfileGains {
                    kp: 0.75,
                    ki: 0.03,
                    kv: 0.02,
                    kffv: 1.0,
                    kffa: 0.0,
                },
                ..PathFollowerParams::default()
            },
            Kinematics::default(),
        )
    }

    fn waypoints() -> Vec<Waypoint> {
        vec![
            Waypoint::new(0.0, 0.0, 0.0, 50.0),
            Waypoint::new(100.0, 0.0, 0.0, 50.0),
        ]
    }

    #[test]
    fn test_off_outputs_stop() {
        let mut tc = traj_ctrl();
        let (output, report) = tc.proc(&InputData::default()).unwrap();

        assert_eq!(tc.mode(), TrajCtrlMode::Off);
        assert_eq!(output.twist, Twist::identity());
        assert!(!report.path_finished);
    }

    #[test]
    fn test_follow_straight_path() {
        let mut tc = traj_ctrl();
        tc.begin_path_from_waypoints(&waypoints(), false).unwrap();
        assert_eq!(tc.mode(), TrajCtrlMode::FollowPath);

        // Can't load a second path while following
        assert!(matches!(
            tc.begin_path_from_waypoints(&waypoints(), false),
            Err(TrajCtrlError::PathAlreadyLoaded)
        ));

        let dt = 0.01;
        let mut input = InputData::default();
        let mut finished = false;

        while input.t < 15.0 {
            let (output, report) = tc.proc(&input).unwrap();

            // Driving straight means equal wheel speeds
            assert!((output.wheels.left - output.wheels.right).abs() < 1e-6);

            if report.path_finished {
                finished = true;
                break;
            }

            input.pose = input
                .pose
                .transform_by(&RigidTransform::exp(&output.twist.scaled(dt)));
            input.velocity = output.twist.dx;
            input.displacement += input.velocity * dt;
            input.t += dt;
        }

        assert!(finished);
        assert_eq!(tc.mode(), TrajCtrlMode::Off);
        assert!(tc.follower().is_none());
        assert!((input.pose.translation().x() - 100.0).abs() < 1.0);
    }

    #[test]
    fn test_abort() {
        let mut tc = traj_ctrl();
        tc.begin_path_from_waypoints(&waypoints(), false).unwrap();

        let (output, _) = tc.proc(&InputData::default()).unwrap();
        assert_eq!(tc.mode(), TrajCtrlMode::FollowPath);
        assert_eq!(output.wheels, tc.kinematics.inverse(&output.twist));

        tc.abort_path();
        let (output, report) = tc.proc(&InputData::default()).unwrap();
        assert!(report.path_finished);
        assert_eq!(output.twist, Twist::identity());
        assert_eq!(tc.mode(), TrajCtrlMode::Off);

        // A new path can now be loaded
        assert!(tc.begin_path_from_waypoints(&waypoints(), true).is_ok());
    }

    #[test]
    fn test_bad_waypoints() {
        let mut tc = traj_ctrl();
        assert!(matches!(
            tc.begin_path_from_waypoints(&waypoints()[..1], false),
            Err(TrajCtrlError::PathError(PathError::NotEnoughWaypoints(1)))
        ));
        assert_eq!(tc.mode(), TrajCtrlMode::Off);
    }
}
