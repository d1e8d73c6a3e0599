//! Parameters structure for an odometry wheel

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{Direction, Encoder, TickCounter};
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default encoder resolution.
pub const DEFAULT_TICKS_PER_REV: u32 = 1024;

/// Default wheel radius.
pub const DEFAULT_RADIUS: f64 = 3.0;

/// Angular band either side of `pi/2 + k*pi` in which a wheel is considered perpendicular to a
/// direction, and so unable to measure motion along it.
///
/// Units: radians
pub const PERPENDICULAR_TOLERANCE_RAD: f64 = 0.01;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters describing one physical odometry wheel.
#[derive(Debug, Clone, Deserialize)]
pub struct WheelParams {
    /// Name of the wheel, used in logs
    pub name: String,

    /// Number of encoder ticks in one revolution of the wheel
    #[serde(default = "default_ticks_per_rev")]
    pub ticks_per_rev: u32,

    /// Radius of the wheel.
    ///
    /// Units: same distance unit as the pose and path.
    #[serde(default = "default_radius")]
    pub radius: f64,

    /// Mounting position relative to the robot's reference origin, and the facing angle of the
    /// wheel. For a wheel aligned with a body axis choose the angle pointing along the positive
    /// direction of that axis.
    pub offset: Pose,

    /// See [`PERPENDICULAR_TOLERANCE_RAD`]
    #[serde(default = "default_perp_tolerance_rad")]
    pub perp_tolerance_rad: f64,

    /// The kind of encoder the wheel is read from
    #[serde(default)]
    pub kind: WheelKind,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum WheelKind {
    DeadWheel,
    DrivenWheel { direction: Direction },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for WheelKind {
    fn default() -> Self {
        WheelKind::DeadWheel
    }
}

impl WheelParams {
    /// Build the encoder described by these parameters, reading from the given counter.
    pub fn encoder(&self, counter: TickCounter) -> Encoder {
        match self.kind {
            WheelKind::DeadWheel => Encoder::DeadWheel(counter),
            WheelKind::DrivenWheel { direction } => Encoder::DrivenWheel { counter, direction },
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_ticks_per_rev() -> u32 {
    DEFAULT_TICKS_PER_REV
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS
}

fn default_perp_tolerance_rad() -> f64 {
    PERPENDICULAR_TOLERANCE_RAD
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Deserialize)]
    struct Wheels {
        wheels: Vec<WheelParams>,
    }

    #[test]
    fn test_deserialise_wheels() {
        let wheels: Wheels = toml::from_str(
            r#"
            [[wheels]]
            name = "left"
            offset = { x = 0.0, y = 5.0, r = 0.0 }

            [[wheels]]
            name = "rear"
            ticks_per_rev = 2048
            radius = 1.5
            offset = { x = -4.0, y = 0.0, r = 1.5707963267948966 }
            kind = { DrivenWheel = { direction = "Reverse" } }
            "#,
        )
        .unwrap();

        let left = &wheels.wheels[0];
        assert_eq!(left.ticks_per_rev, DEFAULT_TICKS_PER_REV);
        assert_eq!(left.radius, DEFAULT_RADIUS);
        assert_eq!(left.perp_tolerance_rad, PERPENDICULAR_TOLERANCE_RAD);
        assert_eq!(left.kind, WheelKind::DeadWheel);

        let rear = &wheels.wheels[1];
        assert_eq!(rear.ticks_per_rev, 2048);
        assert_eq!(rear.offset, Pose::new(-4.0, 0.0, std::f64::consts::FRAC_PI_2));
        assert_eq!(
            rear.kind,
            WheelKind::DrivenWheel {
                direction: Direction::Reverse
            }
        );

        match rear.encoder(TickCounter::new()) {
            Encoder::DrivenWheel { direction, .. } => assert_eq!(direction, Direction::Reverse),
            e => panic!("Unexpected encoder {:?}", e),
        }
    }
}
