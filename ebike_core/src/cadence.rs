//! PAS edge debouncing: turns a stream of pedal-sensor edges into "pedaling" and a
//! cadence estimate.
//!
//! Edges are counted in runs. An edge that arrives within the idle timeout of the previous
//! one extends the current run; a later edge starts a new run. Pedaling is asserted once a
//! run reaches `activation_edges`, and dropped when no edge has been seen for longer than
//! the idle timeout. A single stray edge therefore never asserts pedaling.

use crate::config::PedalCfg;
use crate::util::MILLIS_PER_MIN;

/// Snapshot of the detector's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CadenceState {
    pub pulse_count: u32,
    pub last_edge_ms: u64,
    pub is_pedaling: bool,
}

#[derive(Debug, Clone)]
pub struct CadenceDetector {
    activation_edges: u32,
    idle_timeout_ms: u64,
    magnets: u32,
    state: CadenceState,
    // Mean gap of the edges seen at the last edge tick
    last_period_ms: Option<u64>,
}

impl CadenceDetector {
    pub fn new(cfg: &PedalCfg) -> Self {
        Self {
            activation_edges: u32::from(cfg.activation_edges.max(1)),
            idle_timeout_ms: cfg.idle_timeout_ms().max(1),
            magnets: u32::from(cfg.magnets.max(1)),
            state: CadenceState::default(),
            last_period_ms: None,
        }
    }

    /// Feed the edges observed since the previous tick.
    ///
    /// Returns the pedaling flag after the update.
    pub fn update(&mut self, edges: u32, now_ms: u64) -> bool {
        if edges == 0 {
            if self.state.pulse_count > 0
                && now_ms.saturating_sub(self.state.last_edge_ms) > self.idle_timeout_ms
            {
                if self.state.is_pedaling {
                    tracing::debug!(
                        idle_ms = now_ms.saturating_sub(self.state.last_edge_ms),
                        "pedaling stopped"
                    );
                }
                self.reset();
            }
            return self.state.is_pedaling;
        }

        let gap = now_ms.saturating_sub(self.state.last_edge_ms);
        if self.state.pulse_count == 0 || gap > self.idle_timeout_ms {
            // New run; the gap before it says nothing about cadence.
            if self.state.is_pedaling && edges < self.activation_edges {
                tracing::debug!(gap_ms = gap, "pedaling stopped");
                self.state.is_pedaling = false;
            }
            self.state.pulse_count = edges;
            self.last_period_ms = None;
        } else {
            self.state.pulse_count = self.state.pulse_count.saturating_add(edges);
            self.last_period_ms = Some((gap / u64::from(edges)).max(1));
        }
        self.state.last_edge_ms = now_ms;

        if !self.state.is_pedaling && self.state.pulse_count >= self.activation_edges {
            self.state.is_pedaling = true;
            tracing::debug!(edges = self.state.pulse_count, "pedaling detected");
        }
        self.state.is_pedaling
    }

    pub fn is_pedaling(&self) -> bool {
        self.state.is_pedaling
    }

    pub fn state(&self) -> CadenceState {
        self.state
    }

    /// Crank revolutions per minute, while pedaling.
    pub fn cadence_rpm(&self) -> Option<u32> {
        if !self.state.is_pedaling {
            return None;
        }
        let period = self.last_period_ms?;
        let per_rev = period.saturating_mul(u64::from(self.magnets)).max(1);
        u32::try_from(MILLIS_PER_MIN / per_rev).ok()
    }

    pub fn idle_timeout_ms(&self) -> u64 {
        self.idle_timeout_ms
    }

    pub fn reset(&mut self) {
        self.state = CadenceState::default();
        self.last_period_ms = None;
    }
}
