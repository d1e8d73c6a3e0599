//! # Odometry library.
//!
//! This library provides the odometry wheel geometry used to estimate the robot's pose, and the
//! path follower which drives the robot along a pre-computed path using that estimate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Follower module - keeps the robot on the loaded path
pub mod follower;

/// Localisation module - the pose of the robot and the aggregator interface that provides it
pub mod loc;

/// Locomotion control module - the drivetrain interface and the commands passed into it
pub mod loco_ctrl;

/// Odometry module - per-wheel tick tracking and geometry
pub mod odo;

/// Parameters for the odometry executable
pub mod params;

/// Path module - waypoint paths and the sources they are loaded from
pub mod path;

/// Simulation module - a kinematic robot used to run the follower without hardware
pub mod sim;
