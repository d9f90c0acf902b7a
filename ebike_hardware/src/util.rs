use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `is_ready` until it returns true or `timeout` expires, sleeping `poll_interval`
/// between checks.
pub fn wait_until_ready_with_timeout(
    mut is_ready: impl FnMut() -> Result<bool>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !is_ready()? {
        if Instant::now() >= deadline {
            return Err(HwError::ConversionTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

/// Interval between PAS edges for a crank cadence; `None` when not pedaling.
pub fn edge_interval(rpm: u32, magnets: u32) -> Option<Duration> {
    let edges_per_min = u64::from(rpm).checked_mul(u64::from(magnets))?;
    if edges_per_min == 0 {
        return None;
    }
    Some(Duration::from_micros(60_000_000 / edges_per_min))
}
