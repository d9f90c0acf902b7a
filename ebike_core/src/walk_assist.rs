//! Walk assist: pushing the bike with brake held and throttle pressed.

use crate::config::WalkAssistCfg;
use crate::ramp::Curve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkState {
    #[default]
    Idle,
    Waiting {
        since_ms: u64,
    },
    Active {
        since_ms: u64,
    },
    Cooldown {
        until_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkInput {
    pub pedaling: bool,
    pub brake: bool,
    pub engaged: bool,
    pub now_ms: u64,
}

#[derive(Debug, Clone)]
pub struct WalkAssistController {
    cfg: WalkAssistCfg,
    curve: Curve,
    ceiling: u16,
    state: WalkState,
}

impl WalkAssistController {
    /// `smoothing` is the progressive easing exponent; `out_max` the DAC full scale.
    pub fn new(cfg: WalkAssistCfg, smoothing: f32, out_max: u16) -> Self {
        let ceiling = if cfg.allow_full_output {
            out_max
        } else {
            cfg.max_output.min(out_max)
        };
        Self {
            cfg,
            curve: Curve::from_smoothing(smoothing),
            ceiling,
            state: WalkState::Idle,
        }
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, WalkState::Active { .. })
    }

    /// Advance one tick. Returns the output while active.
    pub fn update(&mut self, input: WalkInput) -> Option<u16> {
        let now = input.now_ms;
        let armed = self.cfg.enabled && !input.pedaling && input.brake && input.engaged;

        if let WalkState::Cooldown { until_ms } = self.state {
            if now < until_ms {
                return None;
            }
            self.state = WalkState::Idle;
        }

        match self.state {
            WalkState::Idle => {
                if armed {
                    self.state = WalkState::Waiting { since_ms: now };
                    return self.try_activate(now, now);
                }
                None
            }
            WalkState::Waiting { since_ms } => {
                if !armed {
                    self.state = WalkState::Idle;
                    return None;
                }
                self.try_activate(since_ms, now)
            }
            WalkState::Active { since_ms } => {
                if !armed {
                    self.state = WalkState::Cooldown {
                        until_ms: now.saturating_add(self.cfg.rearm_delay_ms),
                    };
                    tracing::debug!("walk assist off");
                    return None;
                }
                Some(self.output(now.saturating_sub(since_ms)))
            }
            WalkState::Cooldown { .. } => None,
        }
    }

    fn try_activate(&mut self, since_ms: u64, now: u64) -> Option<u16> {
        if now.saturating_sub(since_ms) < self.cfg.delay_ms {
            return None;
        }
        self.state = WalkState::Active { since_ms: now };
        tracing::info!("walk assist on");
        Some(self.output(0))
    }

    fn output(&self, elapsed_ms: u64) -> u16 {
        let value = if self.cfg.progressive {
            let start = f32::from(self.cfg.start_value);
            let sustain = f32::from(self.cfg.sustain_value);
            let p = if self.cfg.progressive_ms == 0 {
                1.0
            } else {
                elapsed_ms as f32 / self.cfg.progressive_ms as f32
            };
            (start + (sustain - start) * self.curve.ease(p)).round() as u16
        } else {
            self.cfg.sustain_value
        };
        value.min(self.ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walking(now_ms: u64) -> WalkInput {
        WalkInput {
            pedaling: false,
            brake: true,
            engaged: true,
            now_ms,
        }
    }

    fn controller(progressive: bool) -> WalkAssistController {
        WalkAssistController::new(
            WalkAssistCfg {
                progressive,
                ..WalkAssistCfg::default()
            },
            1.0,
            4095,
        )
    }

    #[test]
    fn activates_after_delay() {
        let mut w = controller(true);
        assert_eq!(w.update(walking(0)), None);
        assert_eq!(w.update(walking(560)), None);
        assert_eq!(w.update(walking(600)), Some(2800));
        assert!(w.is_active());
    }

    #[test]
    fn progressive_eases_to_sustain() {
        let mut w = controller(true);
        w.update(walking(0));
        w.update(walking(600));
        assert_eq!(w.update(walking(1350)), Some(2300));
        assert_eq!(w.update(walking(2100)), Some(1800));
        assert_eq!(w.update(walking(5000)), Some(1800));
    }

    #[test]
    fn non_progressive_emits_sustain() {
        let mut w = controller(false);
        w.update(walking(0));
        assert_eq!(w.update(walking(600)), Some(1800));
    }

    #[test]
    fn brake_release_stops_within_one_tick_and_cools_down() {
        let mut w = controller(true);
        w.update(walking(0));
        w.update(walking(600));
        let released = WalkInput {
            brake: false,
            ..walking(740)
        };
        assert_eq!(w.update(released), None);
        assert_eq!(w.state(), WalkState::Cooldown { until_ms: 1240 });
        assert_eq!(w.update(walking(1000)), None);
        assert_eq!(w.state(), WalkState::Cooldown { until_ms: 1240 });
        assert_eq!(w.update(walking(1240)), None);
        assert_eq!(w.state(), WalkState::Waiting { since_ms: 1240 });
    }

    #[test]
    fn interrupted_wait_starts_over() {
        let mut w = controller(true);
        w.update(walking(0));
        w.update(WalkInput {
            pedaling: true,
            ..walking(300)
        });
        assert_eq!(w.state(), WalkState::Idle);
        w.update(walking(400));
        assert_eq!(w.update(walking(900)), None);
        assert!(w.update(walking(1000)).is_some());
    }

    #[test]
    fn output_respects_ceiling() {
        let mut w = WalkAssistController::new(
            WalkAssistCfg {
                start_value: 3500,
                max_output: 3000,
                ..WalkAssistCfg::default()
            },
            1.0,
            4095,
        );
        w.update(walking(0));
        assert_eq!(w.update(walking(600)), Some(3000));

        let mut full = WalkAssistController::new(
            WalkAssistCfg {
                start_value: 3500,
                allow_full_output: true,
                ..WalkAssistCfg::default()
            },
            1.0,
            4095,
        );
        full.update(walking(0));
        assert_eq!(full.update(walking(600)), Some(3500));
    }

    #[test]
    fn disabled_never_arms() {
        let mut w = WalkAssistController::new(
            WalkAssistCfg {
                enabled: false,
                ..WalkAssistCfg::default()
            },
            1.0,
            4095,
        );
        for t in 0..20 {
            assert_eq!(w.update(walking(t * 140)), None);
        }
    }
}
