//! # Odometry Executable Parameters
//!
//! This module provides parameters for the odometry executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{loc::Pose, odo::WheelParams, sim::SimParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OdoExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Identifier of the path to follow, the name of a file in the paths directory
    pub path_id: String,

    /// Time after which following is abandoned. No limit if not given.
    ///
    /// Units: seconds
    pub timeout_s: Option<f64>,

    /// Pose the simulated robot starts at
    #[serde(default)]
    pub start_pose: Pose,

    #[serde(default)]
    pub sim: SimParams,

    /// The odometry wheels fitted to the robot
    #[serde(default)]
    pub wheels: Vec<WheelParams>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::odo::WheelKind;

    #[test]
    fn test_deserialise() {
        let params: OdoExecParams = toml::from_str(
            r#"
            cycle_period_s = 0.05
            path_id = "square.csv"

            [sim]
            dt_s = 0.05

            [[wheels]]
            name = "left"
            offset = { x = 0.0, y = 7.0, r = 0.0 }

            [[wheels]]
            name = "rear"
            radius = 2.0
            offset = { x = -6.0, y = 0.0, r = 1.5707963267948966 }
            "#,
        )
        .unwrap();

        assert_eq!(params.path_id, "square.csv");
        assert_eq!(params.timeout_s, None);
        assert_eq!(params.start_pose, Pose::default());
        assert_eq!(params.sim.dt_s, 0.05);
        assert_eq!(params.sim.trans_gain, 1.0);
        assert_eq!(params.wheels.len(), 2);
        assert_eq!(params.wheels[1].radius, 2.0);
        assert_eq!(params.wheels[1].kind, WheelKind::DeadWheel);
    }
}
