//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Get the shortest signed rotation needed to go from `current` to `target`,
/// where angles wrap every `full_turn`.
///
/// Positive results are in the direction of increasing angle, so with
/// trigonometric radians and `full_turn = 2pi` a positive result is a turn to
/// the left. When both directions are equally short the positive one is
/// returned.
pub fn shortest_turn<T>(current: T, target: T, full_turn: T) -> T
where
    T: Float
{
    let c = rem_euclid(current - target, full_turn);
    let d = rem_euclid(target - current, full_turn);

    if c < d {
        -c
    }
    else {
        d
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Returns true if `angle` lies within `tolerance` of `pi/2 + k*pi` for any
/// integer `k`, approaching from either side.
pub fn is_near_perpendicular<T>(angle: T, tolerance: T) -> bool
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let half_pi_t: T = T::from(std::f64::consts::FRAC_PI_2).unwrap();

    // Distance past the previous perpendicular, in [0, pi)
    let r = rem_euclid(angle - half_pi_t, pi_t);

    r < tolerance || pi_t - r < tolerance
}

/// Cosine which snaps to exactly zero when the angle is within `tolerance` of
/// `pi/2 + k*pi`.
pub fn guarded_cos<T>(angle: T, tolerance: T) -> T
where
    T: Float
{
    if is_near_perpendicular(angle, tolerance) {
        T::zero()
    }
    else {
        angle.cos()
    }
}
