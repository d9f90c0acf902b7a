//! Throttle calibration: raw ADC units to output codes.

use crate::config::ThrottleCfg;
use crate::error::CalibrationError;
use crate::range::clamp;

/// Rest and full-travel points of the throttle, in ADC units. Always `min_raw < max_raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleCalibration {
    min_raw: u16,
    max_raw: u16,
}

impl ThrottleCalibration {
    pub fn new(min_raw: u16, max_raw: u16) -> Result<Self, CalibrationError> {
        if min_raw >= max_raw {
            return Err(CalibrationError::DegenerateRange { min_raw, max_raw });
        }
        Ok(Self { min_raw, max_raw })
    }

    pub fn min_raw(&self) -> u16 {
        self.min_raw
    }

    pub fn max_raw(&self) -> u16 {
        self.max_raw
    }
}

#[derive(Debug, Clone)]
pub struct ThrottleChannel {
    cfg: ThrottleCfg,
    out_max: u16,
    calibration: ThrottleCalibration,
}

impl ThrottleChannel {
    /// A configured range that is degenerate falls back to the full ADC span.
    pub fn new(cfg: ThrottleCfg, out_max: u16) -> Self {
        let calibration = ThrottleCalibration::new(cfg.min_raw, cfg.max_raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "configured throttle range rejected, using full ADC span");
            ThrottleCalibration {
                min_raw: 0,
                max_raw: cfg.adc_max.max(1),
            }
        });
        Self {
            cfg,
            out_max,
            calibration,
        }
    }

    pub fn calibration(&self) -> ThrottleCalibration {
        self.calibration
    }

    pub fn cfg(&self) -> &ThrottleCfg {
        &self.cfg
    }

    /// Map a raw reading onto `[0, out_max]`.
    pub fn level(&self, raw: u16) -> u16 {
        let ThrottleCalibration { min_raw, max_raw } = self.calibration;
        let raw = clamp(raw, min_raw, max_raw);
        let span = u32::from(max_raw - min_raw);
        let scaled = u32::from(raw - min_raw) * u32::from(self.out_max) / span;
        let scaled = clamp(scaled, 0, u32::from(self.out_max));
        u16::try_from(scaled).unwrap_or(self.out_max)
    }

    /// Throttle counts as pressed above the deadband.
    #[inline]
    pub fn is_engaged(&self, level: u16) -> bool {
        level > self.cfg.deadband
    }

    /// Raw value reported when the throttle cannot be read.
    #[inline]
    pub fn rest_raw(&self) -> u16 {
        self.calibration.min_raw
    }

    /// Recalibrate the rest point from readings taken with the throttle released.
    ///
    /// On error the previous calibration is kept.
    pub fn calibrate_rest(&mut self, readings: &[u16]) -> Result<u16, CalibrationError> {
        if readings.is_empty() {
            return Err(CalibrationError::NoSamples);
        }
        let sum: u64 = readings.iter().map(|&r| u64::from(r)).sum();
        let avg = sum / readings.len() as u64;
        let candidate = u16::try_from(avg)
            .unwrap_or(u16::MAX)
            .saturating_add(self.cfg.rest_margin);
        if candidate > self.cfg.max_plausible_rest {
            return Err(CalibrationError::ImplausibleRest {
                candidate,
                limit: self.cfg.max_plausible_rest,
            });
        }
        self.calibration = ThrottleCalibration::new(candidate, self.calibration.max_raw)?;
        tracing::info!(min_raw = candidate, "throttle rest recalibrated");
        Ok(candidate)
    }

    /// Recalibrate full travel from readings taken while the rider twists the throttle.
    ///
    /// Capture starts at the first reading beyond `min_raw + min_travel_delta`; the peak
    /// from there on becomes `max_raw`. On error the previous calibration is kept.
    pub fn calibrate_travel(&mut self, readings: &[u16]) -> Result<u16, CalibrationError> {
        if readings.is_empty() {
            return Err(CalibrationError::NoSamples);
        }
        let threshold = self
            .calibration
            .min_raw
            .saturating_add(self.cfg.min_travel_delta);
        let Some(start) = readings.iter().position(|&r| r > threshold) else {
            let peak = readings.iter().copied().max().unwrap_or(0);
            return Err(CalibrationError::NoTravel { threshold, peak });
        };
        let peak = readings[start..]
            .iter()
            .copied()
            .max()
            .unwrap_or(threshold)
            .min(self.cfg.adc_max);
        self.calibration = ThrottleCalibration::new(self.calibration.min_raw, peak)?;
        tracing::info!(max_raw = peak, "throttle travel recalibrated");
        Ok(peak)
    }
}
