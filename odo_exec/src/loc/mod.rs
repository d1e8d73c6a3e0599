//! # Localisation module
//!
//! This module defines the pose of the robot and the interface through which the odometry
//! aggregator provides it. The aggregator itself, which combines the deltas of several
//! [`crate::odo::OdometryWheel`]s into one pose per cycle, is external.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The planar pose of the robot in the world frame.
///
/// Also used for the mounting offset of an odometry wheel, in which case it is expressed in the
/// robot body frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Pose {
    /// Position along the world X axis
    pub x: f64,

    /// Position along the world Y axis
    pub y: f64,

    /// Heading in trigonometric radians (counter-clockwise from the positive X axis)
    pub r: f64,
}

/// Holds the pose the aggregator produced for the current cycle.
///
/// The aggregator calls [`LocMgr::set_pose`] once per cycle, every other task reads the same
/// snapshot through [`PoseSource::get_position`].
#[derive(Debug, Clone, Default)]
pub struct LocMgr {
    pose: Option<Pose>,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// The odometry aggregator interface.
pub trait PoseSource {
    /// Get the current pose estimate, or `None` if no estimate is available yet.
    fn get_position(&mut self) -> Option<Pose>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Self { x, y, r }
    }

    /// Return the 2D position vector of the pose.
    pub fn position2(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance between this pose's position and the given point.
    pub fn dist_to(&self, point: &Vector2<f64>) -> f64 {
        (point - self.position2()).norm()
    }
}

impl LocMgr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = Some(pose);
    }

    /// Forget the current pose, for example after the robot has been repositioned by hand.
    pub fn clear_pose(&mut self) {
        self.pose = None;
    }
}

impl PoseSource for LocMgr {
    fn get_position(&mut self) -> Option<Pose> {
        self.pose
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pose_geometry() {
        let pose = Pose::new(3.0, 4.0, std::f64::consts::FRAC_PI_2);

        assert_eq!(pose.position2(), Vector2::new(3.0, 4.0));
        assert_eq!(pose.dist_to(&Vector2::zeros()), 5.0);
    }

    #[test]
    fn test_loc_mgr_snapshot() {
        let mut loc = LocMgr::new();
        assert_eq!(loc.get_position(), None);

        loc.set_pose(Pose::new(1.0, 2.0, 0.5));
        assert_eq!(loc.get_position(), Some(Pose::new(1.0, 2.0, 0.5)));

        // Reading does not consume the snapshot
        assert_eq!(loc.get_position(), Some(Pose::new(1.0, 2.0, 0.5)));

        loc.clear_pose();
        assert_eq!(loc.get_position(), None);
    }
}
