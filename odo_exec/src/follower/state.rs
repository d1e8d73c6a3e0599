//! Follower module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Rotation2;
use serde::Serialize;
use std::f64::consts::TAU;
use std::time::Instant;

// Internal
use super::*;
use crate::{
    loc::Pose,
    loco_ctrl::{DriveCmd, LocoCtrlError},
    path::{Path, PathPoint},
};
use util::{maths::shortest_turn, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct Follower {
    params: Params,

    /// Executing mode
    mode: FollowerMode,

    /// The path being followed
    path: Option<Path>,

    /// Index of the current target point within the path
    target_index: usize,

    /// Smallest distance to the current target seen so far
    best_dist: f64,

    /// Smallest absolute heading error to the current target seen so far
    best_rot_err_rad: f64,

    /// Instant at which progress towards the target was last made
    last_progress: Option<Instant>,

    report: StatusReport,
}

/// The status report containing the cycle's outcome and monitoring quantities.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Outcome of the cycle
    pub status: FollowStatus,

    /// Index of the target point after target management
    pub target_index: usize,

    /// True if the target index advanced this cycle
    pub target_advanced: bool,

    /// Distance from the robot to the target point
    pub dist_to_target: f64,

    /// Signed rotation from the robot's heading to the target's heading
    pub rot_error_rad: f64,

    /// Magnitude of the translation part of the issued command
    pub trans_cmd_mag: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum FollowerError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(params::LoadError),

    /// A path is already loaded. This error occurs when attempting to start a new path before
    /// the current one has finished.
    #[error("Attempted to load a path while one is already loaded")]
    PathAlreadyLoaded,

    /// Attempted to follow a path when none is loaded.
    #[error("No path has been set")]
    NoPath,

    #[error("Could not send the command to the drivetrain: {0}")]
    DriveError(#[from] LocoCtrlError),
}

/// The possible modes of execution of the follower.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FollowerMode {
    Off,
    Following,
}

/// Outcome of a single follower cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum FollowStatus {
    /// A command towards the target was issued, the path is not finished.
    Continue,

    /// The final point of the path has been reached, or there is no path to follow.
    Done,

    /// No progress has been made for longer than the stuck timeout, the path has been abandoned.
    Stuck,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Follower {
    /// Create a new follower with the given parameters.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            mode: FollowerMode::Off,
            path: None,
            target_index: 0,
            best_dist: f64::INFINITY,
            best_rot_err_rad: f64::INFINITY,
            last_progress: None,
            report: StatusReport::idle(),
        }
    }

    /// Initialise the follower from a parameter file relative to the params directory.
    pub fn init(params_path: &str) -> Result<Self, FollowerError> {
        let params = params::load(params_path).map_err(FollowerError::ParamLoadError)?;

        Ok(Self::new(params))
    }

    pub fn mode(&self) -> FollowerMode {
        self.mode
    }

    /// Index of the current target point, or `None` if no path is loaded.
    pub fn target_index(&self) -> Option<usize> {
        match self.mode {
            FollowerMode::Following => Some(self.target_index),
            FollowerMode::Off => None,
        }
    }

    /// The report produced by the most recent call to `proc`.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// Begin following a path.
    ///
    /// Following starts from the first point on the next call to `proc`. Loading a new path
    /// before the current one has finished results in an error, to replace a path call
    /// `abort_path` first.
    pub fn begin_path(&mut self, path: Path) -> Result<(), FollowerError> {
        if self.path.is_some() {
            return Err(FollowerError::PathAlreadyLoaded);
        }

        info!(
            "Following path of {} points ({:.02} long)",
            path.get_num_points(),
            path.get_length()
        );

        self.path = Some(path);
        self.target_index = 0;
        self.reset_progress(None);
        self.mode = FollowerMode::Following;

        Ok(())
    }

    /// Abandon the current path.
    ///
    /// No further commands are issued, the caller is responsible for stopping the drivetrain.
    pub fn abort_path(&mut self) {
        if self.path.is_some() {
            info!("Path aborted at target point {}", self.target_index);
        }

        self.clear_path();
    }

    /// Process one cycle of path following.
    ///
    /// Processing involves:
    ///  1. Advancing the target point if the robot is close enough to a point ahead of it.
    ///  1. Checking for the end of the path, or for a lack of progress.
    ///  1. Calculating the drive command towards the target.
    ///
    /// `now` is the time of the cycle, used for the stuck timeout.
    pub fn proc(
        &mut self,
        pose: &Pose,
        now: Instant,
    ) -> Result<(Option<DriveCmd>, StatusReport), FollowerError> {
        let cmd = match self.mode {
            FollowerMode::Off => {
                self.report = StatusReport::idle();
                None
            }
            FollowerMode::Following => Some(self.mode_following(pose, now)?),
        };

        Ok((cmd, self.report))
    }

    /// Mode following path.
    fn mode_following(&mut self, pose: &Pose, now: Instant) -> Result<DriveCmd, FollowerError> {
        let path = self.path.as_ref().ok_or(FollowerError::NoPath)?;
        let last_index = path.last_index();

        // ---- TARGET MANAGEMENT ----

        let new_index = self.scan_for_target(path, pose);
        let target_advanced = new_index != self.target_index;
        let target = path.points()[new_index];

        if target_advanced {
            debug!(
                "Target advanced from point {} to {} ({:.02}, {:.02})",
                self.target_index, new_index, target.x, target.y
            );
            self.target_index = new_index;
            self.reset_progress(Some(now));
        }

        let dist_to_target = pose.dist_to(&target.position2());
        let rot_error_rad = shortest_turn(pose.r, target.dir, TAU);

        self.report = StatusReport {
            status: FollowStatus::Continue,
            target_index: self.target_index,
            target_advanced,
            dist_to_target,
            rot_error_rad,
            trans_cmd_mag: 0.0,
        };

        // ---- END OF PATH ----

        if self.target_index == last_index && dist_to_target < self.params.close_enough_dist {
            info!("Reached the final point of the path");
            return Ok(self.finish(FollowStatus::Done));
        }

        // ---- PROGRESS MONITORING ----

        if dist_to_target <= self.best_dist - self.params.progress_dist {
            self.best_dist = dist_to_target;
            self.last_progress = Some(now);
        }
        if rot_error_rad.abs() <= self.best_rot_err_rad - self.params.progress_rad {
            self.best_rot_err_rad = rot_error_rad.abs();
            self.last_progress = Some(now);
        }

        let since_progress_s = self.since_progress_s(now);

        if since_progress_s > self.params.stuck_timeout_s {
            warn!(
                "No progress towards point {} for {:.02} s ({:.02} away), abandoning path",
                self.target_index, since_progress_s, dist_to_target
            );
            return Ok(self.finish(FollowStatus::Stuck));
        }

        // ---- COMMAND GENERATION ----

        let cmd = Self::calc_drive_cmd(pose, &target, rot_error_rad);
        self.report.trans_cmd_mag = cmd.trans_magnitude();

        Ok(cmd)
    }

    /// Account for a cycle in which no pose was available.
    ///
    /// No command can be calculated, but the time still counts against the stuck timeout. Once it
    /// expires the path is abandoned and `Stuck` returned.
    pub fn note_no_pose(&mut self, now: Instant) -> FollowStatus {
        if self.mode == FollowerMode::Off {
            self.report = StatusReport::idle();
            return self.report.status;
        }

        let since_progress_s = self.since_progress_s(now);

        if since_progress_s > self.params.stuck_timeout_s {
            warn!(
                "No pose and no progress towards point {} for {:.02} s, abandoning path",
                self.target_index, since_progress_s
            );
            self.finish(FollowStatus::Stuck);
        }

        self.report.status
    }

    /// Seconds since progress was last made, starting the timer if it is not running.
    fn since_progress_s(&mut self, now: Instant) -> f64 {
        let last_progress = *self.last_progress.get_or_insert(now);

        now.saturating_duration_since(last_progress).as_secs_f64()
    }

    /// Find the target index for this cycle by scanning forward from the current target.
    fn scan_for_target(&self, path: &Path, pose: &Pose) -> usize {
        let position = pose.position2();
        let ahead = &path.points()[self.target_index..];
        let in_range = |p: &PathPoint| p.dist_to(&position) < self.params.close_enough_dist;

        match self.params.advance_rule {
            AdvanceRule::FirstInRange => ahead
                .iter()
                .position(in_range)
                .map(|j| self.target_index + j),
            AdvanceRule::PastReached => ahead.iter().position(in_range).map(|j| {
                let reached = ahead[j..].iter().take_while(|p| in_range(p)).count();

                (self.target_index + j + reached).min(path.last_index())
            }),
        }
        .unwrap_or(self.target_index)
    }

    /// Calculate the body frame command which drives the robot from the pose onto the target.
    fn calc_drive_cmd(pose: &Pose, target: &PathPoint, rot_error_rad: f64) -> DriveCmd {
        // World frame error scaled by the target's speed
        let trans_err = (target.position2() - pose.position2()) * target.speed;

        // Rotate into the body frame
        let trans_err_rb = Rotation2::new(-pose.r) * trans_err;

        DriveCmd::new(trans_err_rb[0], trans_err_rb[1], rot_error_rad)
    }

    /// End the path with the given status, returning the stop command.
    fn finish(&mut self, status: FollowStatus) -> DriveCmd {
        self.report.status = status;
        self.clear_path();

        DriveCmd::stop()
    }

    fn clear_path(&mut self) {
        self.path = None;
        self.target_index = 0;
        self.reset_progress(None);
        self.mode = FollowerMode::Off;
    }

    fn reset_progress(&mut self, now: Option<Instant>) {
        self.best_dist = f64::INFINITY;
        self.best_rot_err_rad = f64::INFINITY;
        self.last_progress = now;
    }
}

impl StatusReport {
    /// Report for a cycle in which no path was being followed.
    fn idle() -> Self {
        Self {
            status: FollowStatus::Done,
            target_index: 0,
            target_advanced: false,
            dist_to_target: 0.0,
            rot_error_rad: 0.0,
            trans_cmd_mag: 0.0,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::PathPoint;
    use std::f64::consts::{FRAC_PI_2, PI};
    use std::time::Duration;

    fn square_path() -> Path {
        Path::new(vec![
            PathPoint::new(0.0, 0.0, 0.0, 1.0),
            PathPoint::new(100.0, 0.0, 0.0, 1.0),
            PathPoint::new(100.0, 100.0, FRAC_PI_2, 1.0),
        ])
        .unwrap()
    }

    fn follower(advance_rule: AdvanceRule) -> Follower {
        let mut follower = Follower::new(Params {
            advance_rule,
            ..Params::default()
        });
        follower.begin_path(square_path()).unwrap();
        follower
    }

    #[test]
    fn test_no_path() {
        let mut follower = Follower::new(Params::default());

        let (cmd, report) = follower.proc(&Pose::default(), Instant::now()).unwrap();
        assert_eq!(cmd, None);
        assert_eq!(report.status, FollowStatus::Done);
        assert_eq!(follower.target_index(), None);
    }

    #[test]
    fn test_path_already_loaded() {
        let mut follower = follower(AdvanceRule::FirstInRange);

        assert!(matches!(
            follower.begin_path(square_path()),
            Err(FollowerError::PathAlreadyLoaded)
        ));

        follower.abort_path();
        assert_eq!(follower.mode(), FollowerMode::Off);
        assert!(follower.begin_path(square_path()).is_ok());
    }

    #[test]
    fn test_index_advance_forward_only() {
        let mut follower = follower(AdvanceRule::FirstInRange);
        let now = Instant::now();

        // Already within range of the first point, nothing to do
        let (cmd, report) = follower.proc(&Pose::new(0.0, 0.0, 0.0), now).unwrap();
        assert_eq!(cmd, Some(DriveCmd::new(0.0, 0.0, 0.0)));
        assert_eq!(report.target_index, 0);
        assert_eq!(report.status, FollowStatus::Continue);

        // Part way there, nothing in range so the target is kept
        let (_, report) = follower.proc(&Pose::new(50.0, 0.0, 0.0), now).unwrap();
        assert_eq!(report.target_index, 0);
        assert!(!report.target_advanced);

        // Within range of the second point
        let (cmd, report) = follower.proc(&Pose::new(95.0, 0.0, 0.0), now).unwrap();
        assert_eq!(report.target_index, 1);
        assert!(report.target_advanced);
        let cmd = cmd.unwrap();
        assert!((cmd.forward - 5.0).abs() < 1e-9);
        assert!(cmd.strafe.abs() < 1e-9);

        // Back next to the first point, the target never moves backwards
        let (cmd, report) = follower.proc(&Pose::new(1.0, 0.0, 0.0), now).unwrap();
        assert_eq!(report.target_index, 1);
        assert!((cmd.unwrap().forward - 99.0).abs() < 1e-9);
        assert_eq!(follower.target_index(), Some(1));
    }

    #[test]
    fn test_first_in_range_keeps_earliest() {
        let mut follower = Follower::new(Params::default());
        follower
            .begin_path(
                Path::new(vec![
                    PathPoint::new(0.0, 0.0, 0.0, 1.0),
                    PathPoint::new(4.0, 0.0, 0.0, 1.0),
                    PathPoint::new(8.0, 0.0, 0.0, 1.0),
                ])
                .unwrap(),
            )
            .unwrap();

        // All three points are in range, the first is kept
        let (_, report) = follower.proc(&Pose::new(4.0, 0.0, 0.0), Instant::now()).unwrap();
        assert_eq!(report.target_index, 0);
    }

    #[test]
    fn test_past_reached() {
        let mut follower = follower(AdvanceRule::PastReached);
        let now = Instant::now();

        // The first point is reached so the second is targeted
        let (cmd, report) = follower.proc(&Pose::new(0.0, 0.0, 0.0), now).unwrap();
        assert_eq!(report.target_index, 1);
        assert!((cmd.unwrap().forward - 100.0).abs() < 1e-9);

        let (_, report) = follower.proc(&Pose::new(92.0, 0.0, 0.0), now).unwrap();
        assert_eq!(report.target_index, 2);

        let (cmd, report) = follower.proc(&Pose::new(100.0, 95.0, FRAC_PI_2), now).unwrap();
        assert_eq!(report.status, FollowStatus::Done);
        assert_eq!(cmd, Some(DriveCmd::stop()));
    }

    #[test]
    fn test_done_at_final_point() {
        let mut follower = follower(AdvanceRule::FirstInRange);
        let now = Instant::now();

        follower.proc(&Pose::new(95.0, 0.0, 0.0), now).unwrap();

        // Jumping straight into range of the final point finishes the path
        let (cmd, report) = follower.proc(&Pose::new(100.0, 92.0, 0.0), now).unwrap();
        assert_eq!(report.target_index, 2);
        assert_eq!(report.status, FollowStatus::Done);
        assert_eq!(cmd, Some(DriveCmd::stop()));
        assert_eq!(follower.mode(), FollowerMode::Off);

        // Nothing more is commanded
        let (cmd, report) = follower.proc(&Pose::new(100.0, 92.0, 0.0), now).unwrap();
        assert_eq!(cmd, None);
        assert_eq!(report.status, FollowStatus::Done);
    }

    #[test]
    fn test_body_frame_command() {
        let mut follower = Follower::new(Params::default());
        follower
            .begin_path(Path::new(vec![PathPoint::new(10.0, 20.0, PI, 0.5)]).unwrap())
            .unwrap();

        // Facing +Y, the target is 20 ahead and 10 to the right
        let (cmd, report) = follower
            .proc(&Pose::new(0.0, 0.0, FRAC_PI_2), Instant::now())
            .unwrap();
        let cmd = cmd.unwrap();

        assert!((cmd.forward - 10.0).abs() < 1e-9);
        assert!((cmd.strafe + 5.0).abs() < 1e-9);
        assert!((cmd.rotation - FRAC_PI_2).abs() < 1e-9);
        assert!((report.trans_cmd_mag - 0.5 * 500f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_takes_shortest_turn() {
        let mut follower = Follower::new(Params::default());
        follower
            .begin_path(Path::new(vec![PathPoint::new(50.0, 0.0, -3.0, 1.0)]).unwrap())
            .unwrap();

        let (cmd, _) = follower.proc(&Pose::new(0.0, 0.0, 3.0), Instant::now()).unwrap();
        let rotation = cmd.unwrap().rotation;

        assert!((rotation - (2.0 * PI - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_trans_cmd_bounded() {
        let path = Path::new(vec![
            PathPoint::new(30.0, -40.0, 1.0, 0.7),
            PathPoint::new(-50.0, 10.0, -2.0, 1.0),
        ])
        .unwrap();

        for i in 0..50 {
            let mut follower = Follower::new(Params::default());
            follower.begin_path(path.clone()).unwrap();

            let t = i as f64;
            let pose = Pose::new(t * 3.7 - 90.0, (t * 1.3).sin() * 60.0, t * 0.9);
            let (cmd, report) = follower.proc(&pose, Instant::now()).unwrap();

            let target = path.get(report.target_index).unwrap();
            let bound = target.dist_to(&pose.position2()) * target.speed;
            assert!(cmd.unwrap().trans_magnitude() <= bound + 1e-9);
        }
    }

    #[test]
    fn test_stuck() {
        let mut follower = follower(AdvanceRule::FirstInRange);
        let t0 = Instant::now();
        let pose = Pose::new(0.0, 0.0, 0.0);

        // Sitting on the first point, which never lets the target advance
        let (_, report) = follower.proc(&pose, t0).unwrap();
        assert_eq!(report.status, FollowStatus::Continue);

        let (_, report) = follower.proc(&pose, t0 + Duration::from_secs(4)).unwrap();
        assert_eq!(report.status, FollowStatus::Continue);

        let (cmd, report) = follower.proc(&pose, t0 + Duration::from_secs(6)).unwrap();
        assert_eq!(report.status, FollowStatus::Stuck);
        assert_eq!(cmd, Some(DriveCmd::stop()));
        assert_eq!(follower.mode(), FollowerMode::Off);
    }

    #[test]
    fn test_stuck_without_pose() {
        let mut follower = follower(AdvanceRule::FirstInRange);
        let t0 = Instant::now();

        follower.proc(&Pose::new(20.0, 20.0, 0.0), t0).unwrap();

        assert_eq!(
            follower.note_no_pose(t0 + Duration::from_secs(3)),
            FollowStatus::Continue
        );
        assert_eq!(follower.mode(), FollowerMode::Following);

        assert_eq!(
            follower.note_no_pose(t0 + Duration::from_secs(6)),
            FollowStatus::Stuck
        );
        assert_eq!(follower.report().status, FollowStatus::Stuck);
        assert_eq!(follower.mode(), FollowerMode::Off);

        // Nothing left to follow
        assert_eq!(follower.note_no_pose(t0 + Duration::from_secs(7)), FollowStatus::Done);
    }

    #[test]
    fn test_progress_resets_stuck_timer() {
        let mut follower = follower(AdvanceRule::FirstInRange);
        let t0 = Instant::now();

        // Creeping towards the second point, closing exactly `progress_dist` every 4 seconds
        follower.proc(&Pose::new(95.0, 0.0, 0.0), t0).unwrap();
        for i in 1..10 {
            let pose = Pose::new(95.0 + i as f64 * 0.5, 0.0, 0.0);
            let now = t0 + Duration::from_secs(4 * i);
            let (_, report) = follower.proc(&pose, now).unwrap();

            assert_eq!(report.status, FollowStatus::Continue, "cycle {}", i);
        }
    }
}
