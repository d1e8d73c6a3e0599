//! # Follower module
//!
//! The follower is responsible for driving the robot along a pre-computed path. The path is an
//! ordered list of waypoints, each giving a target position, a target heading, and a speed
//! scale. The follower keeps an index into the path, the target point, which only ever moves
//! forward.
//!
//! Every cycle the follower is given the robot's pose and:
//!
//! 1. Scans forward from the target for points within `close_enough_dist` of the robot and
//!    advances the target according to the [`AdvanceRule`].
//! 1. Finishes the path once the final point is the target and is within range.
//! 1. Abandons the path if neither the distance nor the heading error to the target has improved
//!    for `stuck_timeout_s`.
//! 1. Otherwise outputs a body frame command: the world frame error to the target scaled by the
//!    target's speed and rotated into the body frame, together with the shortest rotation onto
//!    the target heading.
//!
//! The [`Follower`] itself is a step function with no timing of its own. [`follow_path`] runs it
//! at a fixed cycle period against a pose source and a drivetrain, with support for cancellation
//! and a deadline.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod driver;
pub mod params;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use driver::*;
pub use params::*;
pub use state::*;
