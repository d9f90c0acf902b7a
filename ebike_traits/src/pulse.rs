//! Pedal-edge counter shared between the interrupt context and the control tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Monotonic, wrapping edge counter.
///
/// The interrupt side only calls [`PulseCounter::record_edge`]; the tick side reads
/// with [`PulseCounter::count`] and diffs against its previous reading, or drains with
/// [`PulseCounter::take`]. Both reads are single atomic operations, so a read can never
/// observe a half-updated value. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct PulseCounter {
    edges: Arc<AtomicU32>,
}

impl PulseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called from the interrupt handler for every PAS edge.
    #[inline]
    pub fn record_edge(&self) {
        self.edges.fetch_add(1, Ordering::AcqRel);
    }

    /// Add several edges at once (simulation helpers).
    #[inline]
    pub fn record_edges(&self, n: u32) {
        self.edges.fetch_add(n, Ordering::AcqRel);
    }

    /// Total edges seen so far (wraps at `u32::MAX`).
    #[inline]
    pub fn count(&self) -> u32 {
        self.edges.load(Ordering::Acquire)
    }

    /// Atomically read and clear.
    #[inline]
    pub fn take(&self) -> u32 {
        self.edges.swap(0, Ordering::AcqRel)
    }
}

/// Edges between two monotonic readings, tolerant of counter wrap-around.
#[inline]
pub fn edges_since(previous: u32, current: u32) -> u32 {
    current.wrapping_sub(previous)
}
