//! Main odometry executable entry point.
//!
//! # Architecture
//!
//! The executable drives a simulated robot along a path loaded from the paths directory:
//!
//!     - Initialise the session, logging and parameters
//!     - Build the simulated robot and its odometry wheels
//!     - Load the path and hand it to the follower
//!     - Main loop, run by the follower driver:
//!         - Pose acquisition from the simulation
//!         - Follower processing
//!         - Drive command execution
//!         - Odometry wheel updates
//!         - Archiving
//!
//! Usage: `odo_exec [--path <id>] [--timeout <seconds>]`, the `ODO_SW_ROOT` environment variable
//! must point at the directory containing `params/` and `paths/`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use odo_lib::{
    follower::{follow_path, CancelToken, FollowOutcome, FollowStatus, Follower},
    odo::{Encoder, OdometryWheel, TickCounter},
    params::OdoExecParams,
    path::{FilePathSource, PathSource},
    sim::SimRobot,
};
use util::{
    archive::{get_elapsed_seconds, Archiver},
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line arguments, overriding the values in `odo_exec.toml`.
#[derive(Debug, StructOpt)]
#[structopt(name = "odo_exec", about = "Follow a path with a simulated odometry robot")]
struct Args {
    /// Identifier of the path to follow
    #[structopt(short, long)]
    path: Option<String>,

    /// Time after which following is abandoned, in seconds
    #[structopt(short, long)]
    timeout: Option<f64>,
}

/// One row of the follower archive.
#[derive(Serialize)]
struct FollowerRecord {
    time_s: f64,
    cycle: u64,
    x: f64,
    y: f64,
    r: f64,
    status: FollowStatus,
    target_index: usize,
    dist_to_target: f64,
    rot_error_rad: f64,
    forward: f64,
    strafe: f64,
    rotation: f64,
}

/// One row of the odometry archive, per wheel per cycle.
#[derive(Serialize)]
struct OdometryRecord<'a> {
    time_s: f64,
    cycle: u64,
    wheel: &'a str,
    delta_ticks: i64,
    delta_position: f64,
    rotation_estimate_rad: Option<f64>,
}

/// A wheel read by the odometry, alongside its name.
struct NamedWheel {
    name: String,
    wheel: OdometryWheel<Encoder>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("odo_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger, the simulation traces every step so is limited to debug
    logger_init(
        LevelFilter::Trace,
        &[("odo_lib::sim", LevelFilter::Debug)],
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    info!("Odometry Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", args);

    // ---- LOAD PARAMETERS ----

    let mut exec_params: OdoExecParams =
        util::params::load("odo_exec.toml").wrap_err("Could not load exec params")?;

    if let Some(path) = args.path {
        exec_params.path_id = path;
    }
    if let Some(timeout) = args.timeout {
        exec_params.timeout_s = Some(timeout);
    }

    if !(exec_params.cycle_period_s.is_finite() && exec_params.cycle_period_s > 0.0) {
        return Err(eyre!(
            "The cycle period must be positive, found {}",
            exec_params.cycle_period_s
        ));
    }
    if let Some(t) = exec_params.timeout_s.filter(|t| !(t.is_finite() && *t >= 0.0)) {
        return Err(eyre!("The timeout must not be negative, found {}", t));
    }

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut follower = Follower::init("follower.toml").wrap_err("Failed to initialise Follower")?;
    info!("Follower init complete");

    let sim = SimRobot::new(exec_params.sim.clone(), exec_params.start_pose);

    let mut wheels = Vec::with_capacity(exec_params.wheels.len());
    for wheel_params in exec_params.wheels.iter() {
        let counter = TickCounter::new();

        sim.add_wheel(wheel_params, wheel_params.encoder(counter.clone()))
            .wrap_err_with(|| format!("Invalid parameters for wheel {}", wheel_params.name))?;

        let mut wheel = OdometryWheel::from_params(wheel_params, wheel_params.encoder(counter))
            .wrap_err_with(|| format!("Invalid parameters for wheel {}", wheel_params.name))?;

        // Prime the wheel so the first cycle's delta is relative to the start
        wheel.update_delta();

        info!(
            "Wheel {} at ({:.02}, {:.02}) facing {:.03} rad, {:.02} from the origin",
            wheel_params.name,
            wheel.offset().x,
            wheel.offset().y,
            wheel.offset().r,
            wheel.distance_to_center()
        );

        wheels.push(NamedWheel {
            name: wheel_params.name.clone(),
            wheel,
        });
    }
    info!("Simulation init complete, {} odometry wheels", wheels.len());

    info!("Module initialisation complete\n");

    // ---- LOAD PATH ----

    let path = FilePathSource::from_sw_root()
        .and_then(|source| source.get_path(&exec_params.path_id))
        .wrap_err_with(|| format!("Could not load the path {}", exec_params.path_id))?;

    follower
        .begin_path(path)
        .wrap_err("Could not begin following the path")?;

    // ---- INITIALISE ARCHIVES ----

    let mut follower_arch = Archiver::from_path(&session, "follower.csv")
        .wrap_err("Could not create the follower archive")?;
    let mut odometry_arch = Archiver::from_path(&session, "odometry.csv")
        .wrap_err("Could not create the odometry archive")?;

    // ---- MAIN LOOP ----

    let deadline = exec_params
        .timeout_s
        .map(|t| Instant::now() + Duration::from_secs_f64(t));

    info!("Begining main loop\n");

    let outcome = follow_path(
        &mut follower,
        &mut sim.clone(),
        &mut sim.clone(),
        &CancelToken::new(),
        deadline,
        Duration::from_secs_f64(exec_params.cycle_period_s),
        |cycle| {
            let time_s = get_elapsed_seconds();

            if cycle.report.target_advanced {
                info!(
                    "Now targeting point {} ({:.02} away)",
                    cycle.report.target_index, cycle.report.dist_to_target
                );
            }

            // ---- ODOMETRY ----

            for named in wheels.iter_mut() {
                named.wheel.update_delta();

                let delta = match named.wheel.delta_snapshot() {
                    Ok(d) => d,
                    Err(e) => {
                        warn!("Could not read wheel {}: {}", named.name, e);
                        continue;
                    }
                };
                let rotation_estimate_rad =
                    named.wheel.try_odo_delta_to_bot_angle(delta.position, 0.0, 0.0);

                trace!(
                    "Wheel {}: {} ticks, {:.03} rolled, rotation estimate {:?}",
                    named.name,
                    delta.ticks,
                    delta.position,
                    rotation_estimate_rad
                );

                if let Err(e) = odometry_arch.serialise(OdometryRecord {
                    time_s,
                    cycle: cycle.cycle,
                    wheel: &named.name,
                    delta_ticks: delta.ticks,
                    delta_position: delta.position,
                    rotation_estimate_rad,
                }) {
                    warn!("Could not archive odometry: {}", e);
                }
            }

            // ---- ARCHIVING ----

            let cmd = cycle.cmd.copied().unwrap_or_default();

            if let Err(e) = follower_arch.serialise(FollowerRecord {
                time_s,
                cycle: cycle.cycle,
                x: cycle.pose.x,
                y: cycle.pose.y,
                r: cycle.pose.r,
                status: cycle.report.status,
                target_index: cycle.report.target_index,
                dist_to_target: cycle.report.dist_to_target,
                rot_error_rad: cycle.report.rot_error_rad,
                forward: cmd.forward,
                strafe: cmd.strafe,
                rotation: cmd.rotation,
            }) {
                warn!("Could not archive follower status: {}", e);
            }
        },
    )
    .wrap_err("Error while following the path")?;

    // ---- SHUTDOWN ----

    let pose = sim.pose();
    match outcome {
        FollowOutcome::Completed => info!("Path complete"),
        o => warn!("Path not completed: {:?}", o),
    }
    info!("Final pose: ({:.02}, {:.02}, {:.03})", pose.x, pose.y, pose.r);

    info!("End of execution");

    Ok(())
}
