//! Follower parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the path follower
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Distance under which a path point is considered reached.
    pub close_enough_dist: f64,

    /// How the target point is advanced once points are reached.
    pub advance_rule: AdvanceRule,

    /// Time without progress after which the follower gives up on the path.
    ///
    /// Units: seconds
    pub stuck_timeout_s: f64,

    /// Reduction in distance to the target which counts as progress.
    pub progress_dist: f64,

    /// Reduction in heading error to the target which counts as progress.
    ///
    /// Units: radians
    pub progress_rad: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Rule used to pick the target point from the points within `close_enough_dist` of the robot.
///
/// Both rules only ever scan forward from the current target, so the target index never
/// decreases.
#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdvanceRule {
    /// Target the first point at or after the current target which is within range. If none are
    /// in range the target is unchanged.
    ///
    /// The robot is driven onto the target, so once it is reached it remains the first point in
    /// range and the target only advances if the robot is pushed within range of a later point.
    /// Suited to densely sampled paths whose points are closer together than
    /// `close_enough_dist`.
    FirstInRange,

    /// Find the first point at or after the current target which is within range, take it and
    /// the run of in-range points directly following it as reached, and target the point after
    /// the run. Suited to sparse waypoint paths, including closed ones whose final point lies on
    /// the first.
    PastReached,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            close_enough_dist: 10.0,
            advance_rule: AdvanceRule::FirstInRange,
            stuck_timeout_s: 5.0,
            progress_dist: 0.5,
            progress_rad: 0.05,
        }
    }
}
