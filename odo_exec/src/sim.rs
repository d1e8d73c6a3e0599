//! # Simulated robot
//!
//! A kinematic model of a holonomic robot, used to run the follower without hardware. The model
//! integrates each drive command over a fixed time step and rolls the encoders of the simulated
//! odometry wheels by the distance their contact points would have travelled.
//!
//! The simulated robot is both the [`PoseSource`] and the [`Drivetrain`] of the follower. Clones
//! share the same state, so one clone can be handed out as each.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{Rotation2, Vector2};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Internal
use crate::{
    loc::{Pose, PoseSource},
    loco_ctrl::{DriveCmd, Drivetrain, LocoCtrlError},
    odo::{Encoder, OdometryWheel, WheelError, WheelParams},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated robot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Body speed produced by a unit translation command.
    pub trans_gain: f64,

    /// Body rate produced by a unit rotation command.
    ///
    /// Units: radians/second
    pub rot_gain: f64,

    /// Time step each drive command is integrated over.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

#[derive(Debug, Clone)]
pub struct SimRobot {
    state: Arc<Mutex<SimState>>,
}

#[derive(Debug)]
struct SimState {
    params: SimParams,

    /// True pose of the robot
    pose: Pose,

    /// The last command received
    cmd: DriveCmd,

    wheels: Vec<SimWheel>,
}

#[derive(Debug)]
struct SimWheel {
    model: OdometryWheel<Encoder>,

    /// Fraction of a tick rolled but not yet counted
    residual_ticks: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            trans_gain: 1.0,
            rot_gain: 1.0,
            dt_s: 0.1,
        }
    }
}

impl SimRobot {
    /// Create a new simulated robot at the given pose.
    pub fn new(params: SimParams, pose: Pose) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                params,
                pose,
                cmd: DriveCmd::stop(),
                wheels: Vec::new(),
            })),
        }
    }

    /// Add an odometry wheel whose encoder will be rolled as the robot moves.
    pub fn add_wheel(&self, params: &WheelParams, encoder: Encoder) -> Result<(), WheelError> {
        let model = OdometryWheel::from_params(params, encoder)?;

        self.lock().wheels.push(SimWheel {
            model,
            residual_ticks: 0.0,
        });

        Ok(())
    }

    /// The true pose of the robot.
    pub fn pose(&self) -> Pose {
        self.lock().pose
    }

    /// The last command the robot received.
    pub fn cmd(&self) -> DriveCmd {
        self.lock().cmd
    }

    fn lock(&self) -> MutexGuard<SimState> {
        // Steps never leave the state part-updated, so a poisoned lock is recovered
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SimState {
    /// Integrate the current command over one time step.
    fn step(&mut self) {
        let dt = self.params.dt_s;

        // Body frame motion over the step
        let trans_rb = Vector2::new(self.cmd.forward, self.cmd.strafe) * self.params.trans_gain * dt;
        let rot = self.cmd.rotation * self.params.rot_gain * dt;

        let trans_mag = trans_rb.norm();
        let trans_dir = trans_rb[1].atan2(trans_rb[0]);

        for wheel in self.wheels.iter_mut() {
            let rolled = wheel.model.dot_product(trans_mag, trans_dir)
                + wheel.model.robot_angle_to_odo_delta(rot, 0.0, 0.0);

            let ticks = wheel.model.position_to_ticks(rolled) + wheel.residual_ticks;
            let whole_ticks = ticks.round();

            wheel.residual_ticks = ticks - whole_ticks;
            wheel.model.encoder().roll(whole_ticks as i64);
        }

        // World frame
        let trans_lm = Rotation2::new(self.pose.r) * trans_rb;
        self.pose = Pose::new(
            self.pose.x + trans_lm[0],
            self.pose.y + trans_lm[1],
            self.pose.r + rot,
        );

        trace!("Sim pose: {:?}", self.pose);
    }
}

impl PoseSource for SimRobot {
    fn get_position(&mut self) -> Option<Pose> {
        Some(self.pose())
    }
}

impl Drivetrain for SimRobot {
    fn drive(&mut self, cmd: DriveCmd) -> Result<(), LocoCtrlError> {
        if !cmd.is_valid() {
            return Err(LocoCtrlError::InvalidDriveCmd(cmd));
        }

        let mut state = self.lock();
        state.cmd = cmd;
        state.step();

        Ok(())
    }
}
