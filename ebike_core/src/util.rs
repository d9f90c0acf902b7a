//! Common time helpers for ebike_core.

use std::time::Duration;

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;
/// Number of milliseconds in one minute.
pub const MILLIS_PER_MIN: u64 = 60 * MILLIS_PER_SEC;

/// Tick rate in Hz for a given period; at least 1.
#[inline]
pub fn tick_hz(tick_ms: u64) -> u64 {
    (MILLIS_PER_SEC / tick_ms.max(1)).max(1)
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
#[inline]
pub fn millis_u64(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
