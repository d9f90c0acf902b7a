//! `From` implementations bridging `ebike_config` types to `ebike_core` types.
//!
//! Callers are expected to sanitize the TOML config first; these conversions only change
//! units (seconds to milliseconds, resolution bits to full scale).

use crate::config::{AssistConfig, CruiseCfg, OutputCfg, PedalCfg, RampCfg, ThrottleCfg, WalkAssistCfg};
use crate::error::AssistError;
use crate::util::MILLIS_PER_SEC;

// ── OutputCfg ────────────────────────────────────────────────────────────────

impl From<&ebike_config::Config> for OutputCfg {
    fn from(c: &ebike_config::Config) -> Self {
        Self {
            dac_address: c.dac.address,
            out_max: c.output_max(),
            buzzer: c.buzzer.enabled,
            console: c.console.enabled,
            require_pedaling: c.assist.require_pedaling,
            tick_ms: c.assist.tick_ms,
        }
    }
}

// ── ThrottleCfg ──────────────────────────────────────────────────────────────

impl From<&ebike_config::ThrottleCfg> for ThrottleCfg {
    fn from(c: &ebike_config::ThrottleCfg) -> Self {
        Self {
            adc_max: c.adc_max,
            min_raw: c.min_raw,
            max_raw: c.max_raw,
            recalibrate_min: c.recalibrate_min,
            recalibrate_max: c.recalibrate_max,
            rest_samples: c.rest_samples,
            rest_margin: c.rest_margin,
            max_plausible_rest: c.max_plausible_rest,
            travel_samples: c.travel_samples,
            min_travel_delta: c.min_travel_delta,
            sample_interval_ms: c.sample_interval_ms,
            deadband: c.deadband,
        }
    }
}

// ── PedalCfg ─────────────────────────────────────────────────────────────────

impl From<&ebike_config::PedalCfg> for PedalCfg {
    fn from(c: &ebike_config::PedalCfg) -> Self {
        Self {
            activation_edges: c.activation_edges,
            pas_tolerance: c.pas_tolerance,
            base_gap_ms: c.base_gap_ms,
            magnets: c.magnets,
        }
    }
}

// ── CruiseCfg ────────────────────────────────────────────────────────────────

impl From<&ebike_config::CruiseCfg> for CruiseCfg {
    fn from(c: &ebike_config::CruiseCfg) -> Self {
        Self {
            enabled: c.enabled,
            fix_pulses: c.fix_pulses,
            fix_below_pulses: c.fix_below_pulses,
            tolerance: c.tolerance,
            release_with_brake: c.release_with_brake,
            brake_release_pulses: c.brake_release_pulses,
            release_with_throttle: c.release_with_throttle,
            throttle_release_ms: c.throttle_release_ms,
        }
    }
}

// ── WalkAssistCfg ────────────────────────────────────────────────────────────

impl From<&ebike_config::WalkAssistCfg> for WalkAssistCfg {
    fn from(c: &ebike_config::WalkAssistCfg) -> Self {
        Self {
            enabled: c.enabled,
            delay_ms: c.delay_ms,
            progressive: c.progressive,
            start_value: c.start_value,
            sustain_value: c.sustain_value,
            progressive_ms: c.progressive_ms,
            rearm_delay_ms: c.rearm_delay_ms,
            max_output: c.max_output,
            allow_full_output: c.allow_full_output,
        }
    }
}

// ── RampCfg ──────────────────────────────────────────────────────────────────

impl From<&ebike_config::RampCfg> for RampCfg {
    fn from(c: &ebike_config::RampCfg) -> Self {
        Self {
            accel_delay_ms: u64::from(c.accel_delay_s) * MILLIS_PER_SEC,
            auto_progressive_delay_ms: u64::from(c.auto_progressive_delay_s) * MILLIS_PER_SEC,
            smoothing: c.smoothing,
            auto_smoothing: c.auto_smoothing,
        }
    }
}

// ── AssistConfig ─────────────────────────────────────────────────────────────

impl From<&ebike_config::Config> for AssistConfig {
    fn from(c: &ebike_config::Config) -> Self {
        Self {
            output: c.into(),
            throttle: (&c.throttle).into(),
            pedal: (&c.pedal).into(),
            cruise: (&c.cruise).into(),
            walk_assist: (&c.walk_assist).into(),
            ramp: (&c.ramp).into(),
        }
    }
}

impl AssistConfig {
    /// Parse a TOML document, clamp invalid values (logging each adjustment) and convert.
    pub fn from_toml_str(s: &str) -> crate::error::Result<Self> {
        let raw: ebike_config::Config = toml::from_str(s)
            .map_err(|e| eyre::Report::new(AssistError::Config(e.to_string())))?;
        let (cfg, adjustments) = raw.sanitized();
        for a in &adjustments {
            tracing::warn!(adjustment = %a, "config value adjusted");
        }
        Ok((&cfg).into())
    }
}
