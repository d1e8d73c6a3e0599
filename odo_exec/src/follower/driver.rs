//! Blocking driver running the follower at a fixed cycle period

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use super::*;
use crate::{
    loc::{Pose, PoseSource},
    loco_ctrl::{DriveCmd, Drivetrain},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Token used to stop [`follow_path`] from another thread.
///
/// Clones refer to the same token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

/// Data describing one completed cycle of [`follow_path`].
#[derive(Debug, Copy, Clone)]
pub struct CycleInfo<'a> {
    /// Number of the cycle, starting at zero
    pub cycle: u64,

    /// The pose the cycle was processed with
    pub pose: &'a Pose,

    /// The command sent to the drivetrain, if any
    pub cmd: Option<&'a DriveCmd>,

    pub report: &'a StatusReport,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How a call to [`follow_path`] ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FollowOutcome {
    /// The final point of the path was reached.
    Completed,

    /// The follower made no progress for longer than its stuck timeout.
    Stuck,

    /// The cancel token was triggered.
    Cancelled,

    /// The deadline passed before the path was completed.
    TimedOut,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation, taking effect at the start of the next cycle.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Run the follower on its loaded path until it finishes, is cancelled, or the deadline passes.
///
/// Each cycle the pose is read from `pose_source`, the follower is processed and any command is
/// sent to `drivetrain`, after which `on_cycle` is called and the thread sleeps for the rest of
/// `cycle_period`.
///
/// Cycles without a pose are skipped. The first of them stops the drivetrain, and the time
/// without a pose counts towards the follower's stuck timeout.
///
/// On cancellation or timeout the path is aborted and a stop command sent to the drivetrain.
pub fn follow_path<P, D, F>(
    follower: &mut Follower,
    pose_source: &mut P,
    drivetrain: &mut D,
    cancel: &CancelToken,
    deadline: Option<Instant>,
    cycle_period: Duration,
    mut on_cycle: F,
) -> Result<FollowOutcome, FollowerError>
where
    P: PoseSource,
    D: Drivetrain,
    F: FnMut(CycleInfo),
{
    if follower.mode() == FollowerMode::Off {
        return Err(FollowerError::NoPath);
    }

    let mut cycle = 0u64;
    let mut has_pose = false;

    loop {
        let cycle_start_instant = Instant::now();

        // ---- EXTERNAL STOPS ----

        let stop = if cancel.is_cancelled() {
            Some(FollowOutcome::Cancelled)
        } else if deadline.map_or(false, |d| cycle_start_instant >= d) {
            Some(FollowOutcome::TimedOut)
        } else {
            None
        };

        if let Some(outcome) = stop {
            info!("Path following stopped: {:?}", outcome);
            follower.abort_path();
            drivetrain.drive(DriveCmd::stop())?;
            return Ok(outcome);
        }

        // ---- PROCESSING ----

        match pose_source.get_position() {
            Some(pose) => {
                has_pose = true;

                let (cmd, report) = match follower.proc(&pose, cycle_start_instant) {
                    Ok(o) => o,
                    Err(e) => {
                        follower.abort_path();
                        drivetrain.drive(DriveCmd::stop())?;
                        return Err(e);
                    }
                };

                if let Some(cmd) = cmd {
                    if let Err(e) = drivetrain.drive(cmd) {
                        follower.abort_path();
                        drivetrain.drive(DriveCmd::stop()).ok();
                        return Err(e.into());
                    }
                }

                on_cycle(CycleInfo {
                    cycle,
                    pose: &pose,
                    cmd: cmd.as_ref(),
                    report: &report,
                });

                match report.status {
                    FollowStatus::Continue => (),
                    FollowStatus::Done => return Ok(FollowOutcome::Completed),
                    FollowStatus::Stuck => return Ok(FollowOutcome::Stuck),
                }
            }
            None => {
                warn!("No pose available, skipping cycle {}", cycle);

                if has_pose {
                    has_pose = false;
                    if let Err(e) = drivetrain.drive(DriveCmd::stop()) {
                        follower.abort_path();
                        return Err(e.into());
                    }
                }

                if follower.note_no_pose(cycle_start_instant) == FollowStatus::Stuck {
                    return Ok(FollowOutcome::Stuck);
                }
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }

        cycle += 1;
    }
}
