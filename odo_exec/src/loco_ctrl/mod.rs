//! Locomotion control module
//!
//! Defines the commands the follower issues and the drivetrain interface which executes them.
//! Converting a command into individual actuator demands (for example mecanum wheel mixing) is
//! the responsibility of the drivetrain implementation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A motion command in the robot body frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Default)]
pub struct DriveCmd {
    /// Translation demand along the robot's heading
    pub forward: f64,

    /// Translation demand to the left of the robot's heading
    pub strafe: f64,

    /// Rotation demand, positive is counter-clockwise
    pub rotation: f64,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The drivetrain interface.
pub trait Drivetrain {
    /// Execute the given command until the next one is issued.
    fn drive(&mut self, cmd: DriveCmd) -> Result<(), LocoCtrlError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LocoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("Recieved an invalid drive command: {0:?}")]
    InvalidDriveCmd(DriveCmd),

    #[error("The drivetrain is not available: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCmd {
    pub fn new(forward: f64, strafe: f64, rotation: f64) -> Self {
        Self {
            forward,
            strafe,
            rotation,
        }
    }

    /// A command which brings the robot to a stop.
    pub fn stop() -> Self {
        Self::default()
    }

    /// Magnitude of the translation part of the command.
    pub fn trans_magnitude(&self) -> f64 {
        self.forward.hypot(self.strafe)
    }

    /// Determine if the command is valid (all demands are finite).
    pub fn is_valid(&self) -> bool {
        self.forward.is_finite() && self.strafe.is_finite() && self.rotation.is_finite()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_drive_cmd() {
        let cmd = DriveCmd::new(3.0, -4.0, 0.5);
        assert_eq!(cmd.trans_magnitude(), 5.0);
        assert!(cmd.is_valid());

        assert_eq!(DriveCmd::stop(), DriveCmd::new(0.0, 0.0, 0.0));
        assert!(!DriveCmd::new(f64::INFINITY, 0.0, 0.0).is_valid());
    }
}
