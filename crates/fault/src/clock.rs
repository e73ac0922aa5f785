//! The clock module holds the [Clock] type.

use crate::ChessClock;

/// A packed chess clock: the duration in the upper 64 bits and the timestamp in the lower 64 bits.
pub type Clock = u128;

impl ChessClock for Clock {
    fn duration(&self) -> u64 {
        (self >> 64) as u64
    }

    fn timestamp(&self) -> u64 {
        (self & u64::MAX as u128) as u64
    }
}
