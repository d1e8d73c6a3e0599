//! # Odometry module
//!
//! An [`OdometryWheel`] models one encoder-equipped wheel fixed to the robot body at a known
//! offset and facing angle. Each cycle the odometry aggregator calls
//! [`OdometryWheel::update_delta`] on every wheel, then uses the geometric conversions provided
//! here to turn the per-wheel distances into robot-frame translation and rotation.
//!
//! ## Conventions
//!
//! All angles are in radians and follow the trigonometric convention (counter-clockwise
//! positive, zero along the positive X axis). The wheel offset is expressed in the robot body
//! frame, relative to the robot's reference origin, which need not be its centre of rotation.
//! Conversions involving rotation therefore take the centre of rotation `(x_center, y_center)`
//! explicitly, in the same frame.
//!
//! ## Projection guard
//!
//! Converting a wheel's measured distance into motion along another direction divides by the
//! cosine of the angle between them. When the wheel is within
//! [`PERPENDICULAR_TOLERANCE_RAD`] of perpendicular to that direction the cosine is snapped to
//! zero and the wheel is treated as giving no information along it. The `try_` variants return
//! `None` in that case, the plain variants return `0.0`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod encoder;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::{FRAC_PI_2, TAU};

use util::maths::guarded_cos;

pub use encoder::*;
pub use params::*;

use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single odometry wheel.
#[derive(Debug, Clone)]
pub struct OdometryWheel<E: TickSource> {
    encoder: E,

    /// Ticks in one revolution of the wheel
    ticks_per_rev: u32,

    /// Wheel radius
    radius: f64,

    /// Mounting position and facing angle in the robot body frame
    offset: Pose,

    /// See [`PERPENDICULAR_TOLERANCE_RAD`]
    perp_tolerance_rad: f64,

    /// Raw tick count at the previous `update_delta`
    prev_ticks: i64,

    /// Change in ticks between the two most recent `update_delta` calls. `None` until the first
    /// call.
    delta_ticks: Option<i64>,
}

/// Read-only copy of a wheel's delta for one cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WheelDelta {
    /// Change in ticks
    pub ticks: i64,

    /// Distance rolled by the wheel's contact point along its facing
    pub position: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WheelError {
    #[error("The wheel's delta was queried before the first call to update_delta")]
    NoDelta,

    #[error("Invalid wheel parameters: {0}")]
    InvalidParams(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<E: TickSource> OdometryWheel<E> {
    /// Create a new wheel.
    ///
    /// `ticks_per_rev` and `radius` must both be greater than zero.
    pub fn new(encoder: E, ticks_per_rev: u32, radius: f64, offset: Pose) -> Result<Self, WheelError> {
        if ticks_per_rev == 0 {
            return Err(WheelError::InvalidParams(
                "ticks_per_rev must be greater than zero".into(),
            ));
        }
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(WheelError::InvalidParams(format!(
                "radius must be greater than zero, found {}",
                radius
            )));
        }
        if !offset.x.is_finite() || !offset.y.is_finite() || !offset.r.is_finite() {
            return Err(WheelError::InvalidParams(format!(
                "offset must be finite, found {:?}",
                offset
            )));
        }

        Ok(Self {
            encoder,
            ticks_per_rev,
            radius,
            offset,
            perp_tolerance_rad: PERPENDICULAR_TOLERANCE_RAD,
            prev_ticks: 0,
            delta_ticks: None,
        })
    }

    /// Create a new wheel from its parameters.
    pub fn from_params(params: &WheelParams, encoder: E) -> Result<Self, WheelError> {
        Self::new(encoder, params.ticks_per_rev, params.radius, params.offset)?
            .with_perp_tolerance(params.perp_tolerance_rad)
    }

    /// Set the perpendicular tolerance, which must lie in `[0, pi/2)`.
    pub fn with_perp_tolerance(mut self, tolerance_rad: f64) -> Result<Self, WheelError> {
        if !(0.0..FRAC_PI_2).contains(&tolerance_rad) {
            return Err(WheelError::InvalidParams(format!(
                "perp_tolerance_rad must be in [0, pi/2), found {}",
                tolerance_rad
            )));
        }

        self.perp_tolerance_rad = tolerance_rad;
        Ok(self)
    }

    pub fn offset(&self) -> &Pose {
        &self.offset
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    // ---- DELTA TRACKING ----

    /// Read the encoder and calculate the change in ticks since the previous call.
    ///
    /// Must be called exactly once per cycle, before any of the delta queries for that cycle.
    /// The accumulator starts at zero, so the first call returns the raw count itself unless
    /// [`OdometryWheel::reset`] was called beforehand.
    pub fn update_delta(&mut self) -> i64 {
        let raw = self.encoder.get_raw();
        let delta = raw.wrapping_sub(self.prev_ticks);

        self.prev_ticks = raw;
        self.delta_ticks = Some(delta);

        delta
    }

    /// Take the current raw count as the reference for the next delta, discarding any tracked
    /// delta.
    pub fn reset(&mut self) {
        self.prev_ticks = self.encoder.get_raw();
        self.delta_ticks = None;
    }

    /// The difference in ticks between the two most recent calls to `update_delta`.
    pub fn get_delta_ticks(&self) -> Result<i64, WheelError> {
        self.delta_ticks.ok_or(WheelError::NoDelta)
    }

    /// The distance the wheel's contact point rolled through, along its facing, between the two
    /// most recent calls to `update_delta`.
    pub fn get_delta_position(&self) -> Result<f64, WheelError> {
        Ok(self.ticks_to_position(self.get_delta_ticks()?))
    }

    /// Snapshot of this cycle's delta.
    pub fn delta_snapshot(&self) -> Result<WheelDelta, WheelError> {
        let ticks = self.get_delta_ticks()?;

        Ok(WheelDelta {
            ticks,
            position: self.ticks_to_position(ticks),
        })
    }

    /// Convert a number of ticks into a rolled distance.
    pub fn ticks_to_position(&self, ticks: i64) -> f64 {
        ticks as f64 / self.ticks_per_rev as f64 * TAU * self.radius
    }

    /// Convert a rolled distance into a (fractional) number of ticks.
    pub fn position_to_ticks(&self, position: f64) -> f64 {
        position / (TAU * self.radius) * self.ticks_per_rev as f64
    }

    // ---- GEOMETRY ----

    /// How far the robot moved along `target_angle` given that this wheel rolled
    /// `delta_position` along its own facing.
    ///
    /// Returns `None` if the wheel is perpendicular to `target_angle` (within the tolerance).
    pub fn try_distance_traveled_towards_angle(
        &self,
        delta_position: f64,
        target_angle: f64,
    ) -> Option<f64> {
        let cos = guarded_cos(target_angle - self.offset.r, self.perp_tolerance_rad);

        if cos == 0.0 {
            None
        } else {
            Some(delta_position / cos)
        }
    }

    /// As [`OdometryWheel::try_distance_traveled_towards_angle`], but returns `0.0` when the
    /// wheel is perpendicular to `target_angle`.
    pub fn distance_traveled_towards_angle(&self, delta_position: f64, target_angle: f64) -> f64 {
        self.try_distance_traveled_towards_angle(delta_position, target_angle)
            .unwrap_or(0.0)
    }

    /// The distance this wheel would measure if the robot translated by `bot_trans_mag` along
    /// `bot_trans_dir`.
    pub fn dot_product(&self, bot_trans_mag: f64, bot_trans_dir: f64) -> f64 {
        bot_trans_mag * (bot_trans_dir - self.offset.r).cos()
    }

    /// Direction of travel of this wheel's mounting point when the robot rotates
    /// counter-clockwise about the given centre.
    pub fn cc_tangent_dir(&self, x_center: f64, y_center: f64) -> f64 {
        let dir_from_center = (self.offset.y - y_center).atan2(self.offset.x - x_center);

        dir_from_center + FRAC_PI_2
    }

    /// Distance between this wheel and the given centre of rotation.
    pub fn radius_from_center(&self, x_center: f64, y_center: f64) -> f64 {
        (self.offset.x - x_center).hypot(self.offset.y - y_center)
    }

    /// Robot rotation about the centre which sweeps this wheel through `arclength`.
    ///
    /// A wheel lying on the centre sweeps no arc, in which case `0.0` is returned.
    pub fn arclength_to_angle(&self, arclength: f64, x_center: f64, y_center: f64) -> f64 {
        let radius = self.radius_from_center(x_center, y_center);

        if radius == 0.0 {
            0.0
        } else {
            arclength / radius
        }
    }

    /// Arclength this wheel sweeps when the robot rotates by `angle` about the centre.
    pub fn angle_to_arclength(&self, angle: f64, x_center: f64, y_center: f64) -> f64 {
        angle * self.radius_from_center(x_center, y_center)
    }

    /// Robot rotation about the given centre implied by this wheel rolling `delta_position`.
    ///
    /// Returns `None` if the wheel is perpendicular to its tangent about the centre or lies on
    /// the centre, as in both cases it measures nothing of the rotation.
    pub fn try_odo_delta_to_bot_angle(
        &self,
        delta_position: f64,
        x_center: f64,
        y_center: f64,
    ) -> Option<f64> {
        if self.radius_from_center(x_center, y_center) == 0.0 {
            return None;
        }

        let arclength = self.try_distance_traveled_towards_angle(
            delta_position,
            self.cc_tangent_dir(x_center, y_center),
        )?;

        Some(self.arclength_to_angle(arclength, x_center, y_center))
    }

    /// As [`OdometryWheel::try_odo_delta_to_bot_angle`] but returns `0.0` when the wheel gives
    /// no information about the rotation.
    pub fn odo_delta_to_bot_angle(&self, delta_position: f64, x_center: f64, y_center: f64) -> f64 {
        self.try_odo_delta_to_bot_angle(delta_position, x_center, y_center)
            .unwrap_or(0.0)
    }

    /// The distance this wheel would measure if the robot rotated by `angle` about the given
    /// centre. Inverse of [`OdometryWheel::odo_delta_to_bot_angle`].
    pub fn robot_angle_to_odo_delta(&self, angle: f64, x_center: f64, y_center: f64) -> f64 {
        let arclength = self.angle_to_arclength(angle, x_center, y_center);

        self.dot_product(arclength, self.cc_tangent_dir(x_center, y_center))
    }

    /// Distance from the robot's reference origin to the wheel.
    pub fn distance_to_center(&self) -> f64 {
        self.offset.x.hypot(self.offset.y)
    }
}
