//! Encoder tick sources

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Capability of reading the raw tick count of an incremental encoder.
///
/// The count is monotonic and never wraps. Wrap-around and resets of the physical counter must
/// be handled by the hardware layer before the count reaches this interface.
pub trait TickSource {
    /// Read the current raw tick count.
    fn get_raw(&mut self) -> i64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A tick counter shared between the hardware layer, which writes it, and an odometry wheel,
/// which reads it.
///
/// Clones refer to the same counter.
#[derive(Debug, Clone, Default)]
pub struct TickCounter(Arc<AtomicI64>);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The encoders an odometry wheel can be read from.
#[derive(Debug, Clone)]
pub enum Encoder {
    /// An unpowered tracking wheel which only rolls with the robot.
    DeadWheel(TickCounter),

    /// The integrated encoder of a driven wheel's motor.
    DrivenWheel {
        counter: TickCounter,

        /// Motors mounted reversed count backwards relative to the wheel's facing.
        direction: Direction,
    },
}

/// Counting direction of an encoder relative to the wheel's facing angle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum Direction {
    Forward,
    Reverse,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the counter to an absolute value.
    pub fn set(&self, ticks: i64) {
        self.0.store(ticks, Ordering::Release);
    }

    /// Add ticks to the counter.
    pub fn add(&self, ticks: i64) {
        self.0.fetch_add(ticks, Ordering::AcqRel);
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Acquire)
    }
}

impl TickSource for TickCounter {
    fn get_raw(&mut self) -> i64 {
        self.get()
    }
}

impl Encoder {
    /// The counter this encoder reads from.
    pub fn counter(&self) -> &TickCounter {
        match self {
            Encoder::DeadWheel(c) => c,
            Encoder::DrivenWheel { counter, .. } => counter,
        }
    }

    /// Advance the underlying counter as the wheel rolls `ticks` along its facing.
    ///
    /// Used by hardware simulations, so that reading back through [`TickSource::get_raw`] gives
    /// the rolled ticks whatever the counting direction.
    pub fn roll(&self, ticks: i64) {
        match self {
            Encoder::DeadWheel(c) => c.add(ticks),
            Encoder::DrivenWheel { counter, direction } => match direction {
                Direction::Forward => counter.add(ticks),
                Direction::Reverse => counter.add(ticks.wrapping_neg()),
            },
        }
    }
}

impl TickSource for Encoder {
    fn get_raw(&mut self) -> i64 {
        match self {
            Encoder::DeadWheel(c) => c.get(),
            Encoder::DrivenWheel { counter, direction } => match direction {
                Direction::Forward => counter.get(),
                Direction::Reverse => counter.get().wrapping_neg(),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shared_counter() {
        let counter = TickCounter::new();
        let mut reader = counter.clone();

        counter.add(10);
        counter.add(-3);
        assert_eq!(reader.get_raw(), 7);

        counter.set(100);
        assert_eq!(reader.get_raw(), 100);
    }

    #[test]
    fn test_encoder_direction() {
        let counter = TickCounter::new();
        counter.set(42);

        let mut dead = Encoder::DeadWheel(counter.clone());
        let mut fwd = Encoder::DrivenWheel {
            counter: counter.clone(),
            direction: Direction::Forward,
        };
        let mut rev = Encoder::DrivenWheel {
            counter: counter.clone(),
            direction: Direction::Reverse,
        };

        assert_eq!(dead.get_raw(), 42);
        assert_eq!(fwd.get_raw(), 42);
        assert_eq!(rev.get_raw(), -42);
        assert_eq!(rev.counter().get(), 42);
    }

    #[test]
    fn test_roll() {
        let mut rev = Encoder::DrivenWheel {
            counter: TickCounter::new(),
            direction: Direction::Reverse,
        };

        rev.roll(15);
        assert_eq!(rev.counter().get(), -15);
        assert_eq!(rev.get_raw(), 15);
    }

    #[test]
    fn test_reverse_at_count_limit() {
        let counter = TickCounter::new();
        counter.set(i64::MIN);

        let mut rev = Encoder::DrivenWheel {
            counter,
            direction: Direction::Reverse,
        };

        assert_eq!(rev.get_raw(), i64::MIN);
        rev.roll(i64::MIN);
        assert_eq!(rev.counter().get(), 0);
    }
}
