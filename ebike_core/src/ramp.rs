//! Progressive and auto-progressive ramps toward the arbitrated target.
//!
//! Rising targets are approached over `accel_delay_ms * Δ / out_max` with the easing
//! curve `1 - (1 - p)^k`; falling targets are applied at once. After pedaling has been
//! idle long enough (or the brake is pressed while idle) the next rising ramp is
//! auto-progressive: it uses its own smoothing.
//!
//! A rising target that moves while a ramp is under way keeps the ramp's origin and only
//! stretches or shortens its duration, so progress is never lost to a retarget.

use crate::config::RampCfg;
use crate::range::clamp;

/// Easing applied to ramp progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    Linear,
    /// `1 - (1 - p)^k`, `k > 1`.
    NonLinear(f32),
}

impl Curve {
    /// `k <= 1` (or NaN) is linear.
    pub fn from_smoothing(k: f32) -> Self {
        if k > 1.0 { Self::NonLinear(k) } else { Self::Linear }
    }

    /// Eased fraction in `[0, 1]` for progress `p`.
    #[inline]
    pub fn ease(self, p: f32) -> f32 {
        let p = clamp(p, 0.0, 1.0);
        match self {
            Self::Linear => p,
            Self::NonLinear(k) => clamp(1.0 - (1.0 - p).powf(k), 0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampKind {
    Progressive,
    AutoProgressive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampState {
    pub current: u16,
    pub target: u16,
    pub start_value: u16,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub curve: Curve,
    pub kind: RampKind,
}

#[derive(Debug, Clone)]
pub struct RampGenerator {
    cfg: RampCfg,
    out_max: u16,
    state: RampState,
    idle_since: Option<u64>,
    auto_armed: bool,
}

impl RampGenerator {
    pub fn new(cfg: RampCfg, out_max: u16) -> Self {
        let curve = Curve::from_smoothing(cfg.smoothing);
        Self {
            cfg,
            out_max: out_max.max(1),
            state: RampState {
                current: 0,
                target: 0,
                start_value: 0,
                start_ms: 0,
                duration_ms: 0,
                curve,
                kind: RampKind::Progressive,
            },
            idle_since: None,
            auto_armed: false,
        }
    }

    pub fn state(&self) -> RampState {
        self.state
    }

    pub fn current(&self) -> u16 {
        self.state.current
    }

    /// True when the next rising ramp will be auto-progressive.
    pub fn auto_armed(&self) -> bool {
        self.auto_armed
    }

    /// Kind of the ramp in progress, if the output has not reached its target yet.
    pub fn active_kind(&self) -> Option<RampKind> {
        (self.state.current != self.state.target).then_some(self.state.kind)
    }

    /// Track pedaling idleness; arms auto-progressive after the configured delay or
    /// immediately when the brake is pressed while idle.
    pub fn note_pedaling(&mut self, pedaling: bool, brake: bool, now_ms: u64) {
        if pedaling {
            self.idle_since = None;
            return;
        }
        let since = *self.idle_since.get_or_insert(now_ms);
        if self.auto_armed {
            return;
        }
        if brake || now_ms.saturating_sub(since) >= self.cfg.auto_progressive_delay_ms {
            self.auto_armed = true;
            tracing::debug!(brake, "auto-progressive armed");
        }
    }

    /// Advance toward `target` and return the new output.
    pub fn update(&mut self, target: u16, now_ms: u64) -> u16 {
        let target = target.min(self.out_max);
        let current = self.state.current;

        if target <= current {
            self.settle(target);
            return target;
        }
        if self.state.duration_ms == 0 {
            self.start(target, now_ms);
        } else if target != self.state.target {
            self.state.target = target;
            self.state.duration_ms = self.duration_for(target - self.state.start_value);
        }

        let s = &mut self.state;
        let elapsed = now_ms.saturating_sub(s.start_ms);
        s.current = if s.duration_ms == 0 || elapsed >= s.duration_ms {
            s.target
        } else {
            let p = elapsed as f32 / s.duration_ms as f32;
            let span = f32::from(s.target - s.start_value);
            let v = f32::from(s.start_value) + span * s.curve.ease(p);
            // `as` saturates; a shortened ramp may compute below the output already reached.
            clamp(v.round() as u16, current, s.target)
        };
        if s.current == s.target {
            s.duration_ms = 0;
        }
        s.current
    }

    /// Drop to zero at once.
    pub fn cut(&mut self) {
        self.settle(0);
    }

    /// Jump to `value` at once.
    pub fn hold(&mut self, value: u16) {
        self.settle(value.min(self.out_max));
    }

    fn settle(&mut self, value: u16) {
        self.state.current = value;
        self.state.target = value;
        self.state.start_value = value;
        self.state.duration_ms = 0;
    }

    /// Full-scale travel takes `accel_delay_ms`.
    fn duration_for(&self, delta: u16) -> u64 {
        self.cfg.accel_delay_ms.saturating_mul(u64::from(delta)) / u64::from(self.out_max)
    }

    fn start(&mut self, target: u16, now_ms: u64) {
        let start_value = self.state.current;
        let (kind, curve) = if self.auto_armed {
            self.auto_armed = false;
            (
                RampKind::AutoProgressive,
                Curve::from_smoothing(self.cfg.auto_smoothing),
            )
        } else {
            (
                RampKind::Progressive,
                Curve::from_smoothing(self.cfg.smoothing),
            )
        };
        let duration_ms = self.duration_for(target - start_value);
        self.state = RampState {
            current: start_value,
            target,
            start_value,
            start_ms: now_ms,
            duration_ms,
            curve,
            kind,
        };
        tracing::trace!(?kind, start_value, target, duration_ms, "ramp start");
    }
}
