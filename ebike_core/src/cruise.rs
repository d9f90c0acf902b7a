//! Cruise latch: a throttle level held steady for long enough becomes the output until
//! the rider brakes or (optionally) flicks the throttle while coasting.
//!
//! All counters are ticks; a stalled tick source stalls the machine. Only the
//! throttle-flick release measures milliseconds.

use crate::config::CruiseCfg;
use crate::range::within_tolerance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseCause {
    Brake,
    Throttle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CruiseState {
    #[default]
    Idle,
    Fixing {
        progress: u16,
        reference: u16,
    },
    Fixed {
        value: u16,
    },
    Releasing {
        progress: u16,
        value: u16,
        cause: ReleaseCause,
    },
}

/// Transitions worth announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CruiseEvent {
    Fixed(u16),
    Released(ReleaseCause),
}

/// Inputs of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CruiseInput {
    pub pedaling: bool,
    pub brake: bool,
    pub level: u16,
    pub engaged: bool,
    pub now_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CruiseController {
    cfg: CruiseCfg,
    state: CruiseState,
    // Steady throttle reading that may replace the fixed value: (reference, ticks)
    refix: Option<(u16, u16)>,
    // When the throttle went above the fixed value while coasting
    raised_at: Option<u64>,
}

impl CruiseController {
    pub fn new(cfg: CruiseCfg) -> Self {
        Self {
            cfg,
            state: CruiseState::Idle,
            refix: None,
            raised_at: None,
        }
    }

    pub fn state(&self) -> CruiseState {
        self.state
    }

    /// The latched value, including while a release is pending.
    pub fn cruise_value(&self) -> Option<u16> {
        match self.state {
            CruiseState::Fixed { value } | CruiseState::Releasing { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = CruiseState::Idle;
        self.refix = None;
        self.raised_at = None;
    }

    /// Cruise value when it has authority over the raw throttle.
    pub fn authoritative_target(&self, level: u16) -> Option<u16> {
        match self.state {
            CruiseState::Fixed { value } if !self.above(level, value) => Some(value),
            _ => None,
        }
    }

    pub fn update(&mut self, input: CruiseInput) -> Option<CruiseEvent> {
        if !self.cfg.enabled {
            return None;
        }
        let eligible = input.pedaling && !input.brake && input.engaged;

        match self.state {
            CruiseState::Idle => {
                if eligible {
                    self.state = CruiseState::Fixing {
                        progress: 0,
                        reference: input.level,
                    };
                    return self.advance_fixing(1, input.level);
                }
                None
            }
            CruiseState::Fixing {
                progress,
                reference,
            } => {
                if eligible && within_tolerance(input.level, reference, self.cfg.tolerance) {
                    return self.advance_fixing(progress.saturating_add(1), input.level);
                }
                self.state = CruiseState::Idle;
                None
            }
            CruiseState::Fixed { value } => self.update_fixed(value, eligible, input),
            CruiseState::Releasing {
                progress,
                value,
                cause: ReleaseCause::Brake,
            } => {
                if !input.brake {
                    tracing::debug!(value, "brake released early, cruise kept");
                    self.state = CruiseState::Fixed { value };
                    return None;
                }
                let progress = progress.saturating_add(1);
                if progress >= self.cfg.brake_release_pulses {
                    return Some(self.release(ReleaseCause::Brake));
                }
                self.state = CruiseState::Releasing {
                    progress,
                    value,
                    cause: ReleaseCause::Brake,
                };
                None
            }
            CruiseState::Releasing {
                cause: ReleaseCause::Throttle,
                ..
            } => Some(self.release(ReleaseCause::Throttle)),
        }
    }

    fn advance_fixing(&mut self, progress: u16, level: u16) -> Option<CruiseEvent> {
        if progress >= self.cfg.fix_pulses {
            return Some(self.fix(level));
        }
        if let CruiseState::Fixing { reference, .. } = self.state {
            self.state = CruiseState::Fixing {
                progress,
                reference,
            };
        }
        None
    }

    fn update_fixed(&mut self, value: u16, eligible: bool, input: CruiseInput) -> Option<CruiseEvent> {
        if input.brake && self.cfg.release_with_brake {
            self.refix = None;
            self.raised_at = None;
            if self.cfg.brake_release_pulses <= 1 {
                return Some(self.release(ReleaseCause::Brake));
            }
            self.state = CruiseState::Releasing {
                progress: 1,
                value,
                cause: ReleaseCause::Brake,
            };
            return None;
        }

        if self.cfg.release_with_throttle && !input.pedaling {
            if self.above(input.level, value) {
                self.raised_at.get_or_insert(input.now_ms);
            } else if !input.engaged
                && let Some(at) = self.raised_at.take()
                && input.now_ms.saturating_sub(at) <= self.cfg.throttle_release_ms
            {
                self.refix = None;
                self.state = CruiseState::Releasing {
                    progress: 1,
                    value,
                    cause: ReleaseCause::Throttle,
                };
                return None;
            }
        } else {
            self.raised_at = None;
        }

        if !eligible || within_tolerance(input.level, value, self.cfg.tolerance) {
            self.refix = None;
            return None;
        }

        let needed = if self.above(input.level, value) || self.cfg.fix_below_pulses == 0 {
            self.cfg.fix_pulses
        } else {
            self.cfg.fix_below_pulses
        };
        let ticks = match self.refix {
            Some((reference, ticks)) if within_tolerance(input.level, reference, self.cfg.tolerance) => {
                ticks.saturating_add(1)
            }
            _ => 1,
        };
        if ticks >= needed {
            return Some(self.fix(input.level));
        }
        let reference = match self.refix {
            Some((reference, _)) if ticks > 1 => reference,
            _ => input.level,
        };
        self.refix = Some((reference, ticks));
        None
    }

    #[inline]
    fn above(&self, level: u16, value: u16) -> bool {
        level > value && !within_tolerance(level, value, self.cfg.tolerance)
    }

    fn fix(&mut self, value: u16) -> CruiseEvent {
        self.state = CruiseState::Fixed { value };
        self.refix = None;
        self.raised_at = None;
        tracing::info!(value, "cruise fixed");
        CruiseEvent::Fixed(value)
    }

    fn release(&mut self, cause: ReleaseCause) -> CruiseEvent {
        self.reset();
        tracing::info!(?cause, "cruise released");
        CruiseEvent::Released(cause)
    }
}
