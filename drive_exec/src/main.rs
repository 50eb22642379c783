//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The executable runs the drive library against a simulated drivetrain and
//! camera:
//!
//!     - Initialise the session, logger, parameters and modules
//!     - Start the vision thread, which posts camera frames to a mailbox
//!     - Main loop, one cycle per `cycle_period_s`:
//!         - Drivetrain sensing
//!         - Pose estimation
//!         - Vision processing
//!         - Trajectory control processing
//!         - Drivetrain actuation
//!
//! # Modules
//!
//! All cyclic modules (e.g. `traj_ctrl`) provide a public struct implementing
//! the `util::module::State` trait.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use drive_lib::{
    loc::{
        DriveVelocity, RobotState, RobotStateEstimator, VisionMailbox, VisionProcessor,
        VisionUpdate,
    },
    params::ExecParams,
    path::build_path_from_waypoints,
    pose::{RigidTransform, Translation},
    traj_ctrl::{self, TrajCtrl},
};
use sim::{SimCamera, SimDrivetrain};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
    time::seconds_to_std_duration,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("drive_exec.toml").wrap_err("Could not load exec params")?;
    let cycle_period = seconds_to_std_duration(exec_params.cycle_period_s);

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let robot_state = Arc::new(
        RobotState::from_params_file("robot_state.toml")
            .wrap_err("Failed to initialise RobotState")?,
    );
    let kinematics = robot_state.params().kinematics;

    let mut drivetrain = SimDrivetrain::new(kinematics);

    let mut estimator = RobotStateEstimator::new(robot_state.clone());
    estimator
        .init(drivetrain.sensors(), &session)
        .wrap_err("Failed to initialise RobotStateEstimator")?;
    info!("RobotStateEstimator init complete");

    let mut traj_ctrl = TrajCtrl::default();
    traj_ctrl
        .init(
            traj_ctrl::InitData {
                params_file: "path_follower.toml",
                kinematics,
            },
            &session,
        )
        .wrap_err("Failed to initialise TrajCtrl")?;
    info!("TrajCtrl init complete");

    let mailbox = Arc::new(VisionMailbox::new());
    let vision_processor = VisionProcessor::new(mailbox.clone(), robot_state.clone());

    info!("Module initialisation complete\n");

    // ---- LOAD PATH ----

    let path = build_path_from_waypoints(&exec_params.waypoints, &traj_ctrl.params().path)
        .wrap_err("Failed to build the path")?;
    session.save("path.json", path.clone());
    traj_ctrl
        .begin_path(path, exec_params.reversed)
        .wrap_err("Failed to begin following the path")?;

    // ---- START VISION ----

    // Simulated time and true pose, shared with the camera
    let sim_state = Arc::new(Mutex::new((0.0, RigidTransform::identity())));
    let stop = Arc::new(AtomicBool::new(false));

    let vision_thread = {
        let camera = SimCamera::new(
            Translation::new(exec_params.goal_position[0], exec_params.goal_position[1]),
            robot_state.params(),
            exec_params.vision_latency_ms,
        );
        let vision_period = seconds_to_std_duration(exec_params.vision_period_s);
        let mailbox = mailbox.clone();
        let sim_state = sim_state.clone();
        let stop = stop.clone();

        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let (now, pose) = *sim_state.lock().unwrap_or_else(|e| e.into_inner());

                match VisionUpdate::from_json(now, &camera.frame(&pose)) {
                    Ok(update) => {
                        mailbox.post(update);
                    }
                    Err(e) => warn!("Invalid vision update: {}", e),
                }

                thread::sleep(vision_period);
            }
        })
    };

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let mut t = 0.0;
    let mut num_cycles: u64 = 0;
    let mut input = traj_ctrl::InputData::default();
    let mut wheels = DriveVelocity::default();

    while t < exec_params.run_duration_s {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- SENSING ----

        let sensors = drivetrain.step(t, exec_params.cycle_period_s, &wheels);
        *sim_state.lock().unwrap_or_else(|e| e.into_inner()) = (t, drivetrain.pose());

        // ---- POSE ESTIMATION ----

        let (estimate, _) = estimator
            .proc(&sensors)
            .wrap_err("Error during RobotStateEstimator processing")?;

        if vision_processor.process() {
            if let Some(aim) = robot_state.get_aiming_parameters() {
                debug!(
                    "Aiming at goal {}: range {:.2}, bearing {:.2} deg, stability {:.2}",
                    aim.track_id,
                    aim.range,
                    aim.robot_to_goal.degrees(),
                    aim.stability
                );
            }
        }

        // ---- TRAJECTORY CONTROL ----

        input.t = t;
        input.pose = estimate.pose;
        input.velocity = estimate.measured_velocity.dx / exec_params.cycle_period_s;
        input.displacement = robot_state.get_distance_driven();

        let (output, report) = traj_ctrl
            .proc(&input)
            .wrap_err("Error during TrajCtrl processing")?;
        wheels = output.wheels;

        if report.path_finished {
            info!(
                "Path finished at t = {:.2} s, pose {}",
                t,
                robot_state.get_latest_field_to_vehicle().1
            );
        }

        // ---- CYCLE MANAGEMENT ----

        if num_cycles % 100 == 0 {
            info!(
                "t = {:.2} s, pose {}, cross track error {:.3}, along track error {:.3}",
                t, estimate.pose, report.cross_track_error, report.along_track_error
            );
        }

        t += exec_params.cycle_period_s;
        num_cycles += 1;

        // Get sleep duration
        let cycle_dur = Instant::now() - cycle_start_instant;
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - exec_params.cycle_period_s
            ),
        }
    }

    // ---- SHUTDOWN ----

    stop.store(true, Ordering::Relaxed);
    if vision_thread.join().is_err() {
        warn!("The vision thread panicked");
    }

    info!("End of execution after {} cycles", num_cycles);
    info!(
        "Distance driven {:.2}, final pose {}",
        robot_state.get_distance_driven(),
        robot_state.get_latest_field_to_vehicle().1
    );

    session.exit();

    // Give the logger time to flush
    thread::sleep(Duration::from_millis(10));

    Ok(())
}
