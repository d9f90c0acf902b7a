//! DAC bus address resolution.

use std::ops::RangeInclusive;

use ebike_traits::Dac;

/// Addresses probed when none is configured.
pub const SCAN_RANGE: RangeInclusive<u8> = 0x60..=0x67;
/// Used when nothing acknowledges during the scan.
pub const FALLBACK_ADDRESS: u8 = 0x60;

/// Configured address, or the first responder in [`SCAN_RANGE`] when `configured == 0`.
pub fn resolve_address<D: Dac + ?Sized>(dac: &mut D, configured: u8) -> u8 {
    if configured != 0 {
        return configured;
    }
    match SCAN_RANGE.into_iter().find(|&a| dac.probe(a)) {
        Some(found) => {
            tracing::info!(address = found, "dac found");
            found
        }
        None => {
            tracing::warn!(
                address = FALLBACK_ADDRESS,
                "no dac answered the scan, using fallback address"
            );
            FALLBACK_ADDRESS
        }
    }
}
