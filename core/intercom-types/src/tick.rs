//! Monotonic tick counter.
//!
//! One tick is one supervisor loop period. All deadlines and schedules in the
//! core are expressed in ticks, so they can be checked without blocking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A point on the supervisor's tick timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(u64);

impl Tick {
    /// The boot tick.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The following tick.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// This tick shifted forward by `ticks`.
    #[must_use]
    pub const fn after(&self, ticks: u64) -> Self {
        Self(self.0.saturating_add(ticks))
    }

    /// Ticks elapsed since `earlier`, zero if `earlier` is in the future.
    #[must_use]
    pub const fn since(&self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Number of completed `interval`-sized periods at this tick.
    /// An interval of zero never completes a period.
    #[must_use]
    pub const fn periods(&self, interval: u64) -> u64 {
        if interval == 0 { 0 } else { self.0 / interval }
    }

    /// Wall time represented by this tick count at the given loop period.
    #[must_use]
    pub fn as_duration(&self, period: Duration) -> Duration {
        period.saturating_mul(u32::try_from(self.0).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Converts a duration into whole ticks, rounding up so a deadline is never
/// shorter than requested.
#[must_use]
pub fn ticks_for(duration: Duration, period: Duration) -> u64 {
    let period_ms = period.as_millis().max(1);
    let ticks = duration.as_millis().div_ceil(period_ms);
    u64::try_from(ticks).unwrap_or(u64::MAX)
}
