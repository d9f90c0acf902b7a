//! Runtime configuration for the assist engine.
//!
//! These structs are what the components consume. They are built once at boot (usually
//! from the TOML-deserialized `ebike_config::Config`, see `conversions`) and never
//! mutated afterwards; each component receives its own section by value.

/// Output stage and loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCfg {
    /// DAC bus address; 0 means scan at boot.
    pub dac_address: u8,
    /// DAC full-scale code (OUT_MAX).
    pub out_max: u16,
    /// Play buzzer cues at boot and on mode transitions.
    pub buzzer: bool,
    /// Emit one diagnostic line per tick.
    pub console: bool,
    /// Cut output while not pedaling (walk assist excepted).
    pub require_pedaling: bool,
    /// Control tick period in milliseconds.
    pub tick_ms: u64,
}

impl Default for OutputCfg {
    fn default() -> Self {
        Self {
            dac_address: 0,
            out_max: 4095,
            buzzer: true,
            console: false,
            require_pedaling: true,
            tick_ms: 140,
        }
    }
}

/// Throttle calibration defaults and boot recalibration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleCfg {
    pub adc_max: u16,
    pub min_raw: u16,
    pub max_raw: u16,
    pub recalibrate_min: bool,
    pub recalibrate_max: bool,
    pub rest_samples: u16,
    pub rest_margin: u16,
    pub max_plausible_rest: u16,
    pub travel_samples: u16,
    pub min_travel_delta: u16,
    pub sample_interval_ms: u64,
    /// Output level at or below which the throttle counts as released.
    pub deadband: u16,
}

impl Default for ThrottleCfg {
    fn default() -> Self {
        Self {
            adc_max: 1023,
            min_raw: 190,
            max_raw: 850,
            recalibrate_min: true,
            recalibrate_max: true,
            rest_samples: 30,
            rest_margin: 8,
            max_plausible_rest: 400,
            travel_samples: 20,
            min_travel_delta: 200,
            sample_interval_ms: 10,
            deadband: 80,
        }
    }
}

/// PAS edge debouncing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PedalCfg {
    pub activation_edges: u8,
    pub pas_tolerance: u8,
    pub base_gap_ms: u64,
    pub magnets: u8,
}

impl PedalCfg {
    /// Longest accepted gap between consecutive edges.
    #[inline]
    pub fn idle_timeout_ms(&self) -> u64 {
        self.base_gap_ms
            .saturating_mul(u64::from(self.pas_tolerance) + 1)
    }
}

impl Default for PedalCfg {
    fn default() -> Self {
        Self {
            activation_edges: 3,
            pas_tolerance: 3,
            base_gap_ms: 150,
            magnets: 12,
        }
    }
}

/// Cruise latch settings. Pulse counts are ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CruiseCfg {
    pub enabled: bool,
    pub fix_pulses: u16,
    /// 0 falls back to `fix_pulses`.
    pub fix_below_pulses: u16,
    pub tolerance: u16,
    pub release_with_brake: bool,
    pub brake_release_pulses: u16,
    pub release_with_throttle: bool,
    pub throttle_release_ms: u64,
}

impl Default for CruiseCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            fix_pulses: 20,
            fix_below_pulses: 5,
            tolerance: 40,
            release_with_brake: true,
            brake_release_pulses: 36,
            release_with_throttle: true,
            throttle_release_ms: 150,
        }
    }
}

/// Brake-interlocked walk assist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkAssistCfg {
    pub enabled: bool,
    pub delay_ms: u64,
    pub progressive: bool,
    pub start_value: u16,
    pub sustain_value: u16,
    pub progressive_ms: u64,
    pub rearm_delay_ms: u64,
    pub max_output: u16,
    pub allow_full_output: bool,
}

impl Default for WalkAssistCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 600,
            progressive: true,
            start_value: 2800,
            sustain_value: 1800,
            progressive_ms: 1500,
            rearm_delay_ms: 500,
            max_output: 3000,
            allow_full_output: false,
        }
    }
}

/// Progressive / auto-progressive ramps.
#[derive(Debug, Clone, PartialEq)]
pub struct RampCfg {
    /// Time for a full-scale ramp.
    pub accel_delay_ms: u64,
    /// Idle pedaling time after which the next start is auto-progressive.
    pub auto_progressive_delay_ms: u64,
    /// Easing exponent, 1 ..= 10.
    pub smoothing: f32,
    /// Easing exponent for auto-progressive starts, 1 ..= 10.
    pub auto_smoothing: f32,
}

impl Default for RampCfg {
    fn default() -> Self {
        Self {
            accel_delay_ms: 5_000,
            auto_progressive_delay_ms: 10_000,
            smoothing: 5.0,
            auto_smoothing: 5.0,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssistConfig {
    pub output: OutputCfg,
    pub throttle: ThrottleCfg,
    pub pedal: PedalCfg,
    pub cruise: CruiseCfg,
    pub walk_assist: WalkAssistCfg,
    pub ramp: RampCfg,
}
