//! Type-state builder for `AssistController` and generic `build_assist` constructor.
//!
//! The builder enforces at compile time that sensors and a DAC are provided before
//! `build()` is available. `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use ebike_traits::clock::{Clock, MonotonicClock};
use ebike_traits::{AssistSensors, Buzzer, Dac, NoBuzzer};

use crate::config::AssistConfig;
use crate::core::{AssistCore, BootReport, FaultCounters};
use crate::cruise::CruiseState;
use crate::error::{BuildError, Result};
use crate::logger::{Console, TracingConsole};
use crate::runner::{self, RunStats};
use crate::status::{SensorSample, TickReport};
use crate::throttle::ThrottleCalibration;
use crate::walk_assist::WalkState;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Assist engine over boxed sensors and DAC.
pub struct AssistController {
    pub(crate) inner: AssistCore<Box<dyn AssistSensors>, Box<dyn Dac>>,
}

impl std::fmt::Debug for AssistController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistController")
            .field("output", &self.inner.output())
            .field("dac_address", &self.inner.dac_address())
            .field("cruise", &self.inner.cruise_state())
            .field("walk", &self.inner.walk_state())
            .finish_non_exhaustive()
    }
}

impl AssistController {
    /// Start building a controller.
    pub fn builder() -> AssistBuilder<Missing, Missing> {
        AssistBuilder::default()
    }

    pub fn boot(&mut self) -> BootReport {
        self.inner.boot()
    }

    pub fn tick(&mut self) -> TickReport {
        self.inner.tick()
    }

    pub fn tick_with(&mut self, sample: SensorSample) -> TickReport {
        self.inner.tick_with(sample)
    }

    pub fn sample(&mut self) -> SensorSample {
        self.inner.sample()
    }

    /// Paced loop; see [`runner::run`].
    pub fn run<F: FnMut(&TickReport)>(
        &mut self,
        shutdown: &AtomicBool,
        max_ticks: Option<u64>,
        on_tick: F,
    ) -> RunStats {
        runner::run(&mut self.inner, shutdown, max_ticks, on_tick)
    }

    pub fn now_ms(&self) -> u64 {
        self.inner.now_ms()
    }

    pub fn output(&self) -> u16 {
        self.inner.output()
    }

    pub fn config(&self) -> &AssistConfig {
        self.inner.config()
    }

    pub fn dac_address(&self) -> u8 {
        self.inner.dac_address()
    }

    pub fn cruise_state(&self) -> CruiseState {
        self.inner.cruise_state()
    }

    pub fn walk_state(&self) -> WalkState {
        self.inner.walk_state()
    }

    pub fn is_pedaling(&self) -> bool {
        self.inner.is_pedaling()
    }

    pub fn throttle_calibration(&self) -> ThrottleCalibration {
        self.inner.throttle_calibration()
    }

    pub fn faults(&self) -> FaultCounters {
        self.inner.faults()
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `AssistController`. The configuration is validated on `build()`.
pub struct AssistBuilder<S, D> {
    sensors: Option<Box<dyn AssistSensors>>,
    dac: Option<Box<dyn Dac>>,
    config: Option<AssistConfig>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    buzzer: Option<Box<dyn Buzzer>>,
    console: Option<Box<dyn Console>>,
    _s: PhantomData<S>,
    _d: PhantomData<D>,
}

impl Default for AssistBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            sensors: None,
            dac: None,
            config: None,
            clock: None,
            buzzer: None,
            console: None,
            _s: PhantomData,
            _d: PhantomData,
        }
    }
}

/// Validate configuration and construct an `AssistCore`.
///
/// Shared by `AssistBuilder::try_build()` and `build_assist()`.
fn validate_and_build<S: AssistSensors, D: Dac>(
    sensors: S,
    dac: D,
    cfg: AssistConfig,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    buzzer: Option<Box<dyn Buzzer>>,
    console: Option<Box<dyn Console>>,
) -> Result<AssistCore<S, D>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if cfg.output.out_max == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "out_max must be > 0",
        )));
    }
    if cfg.output.tick_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick_ms must be >= 1",
        )));
    }
    if cfg.throttle.min_raw >= cfg.throttle.max_raw {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "throttle min_raw must be below max_raw",
        )));
    }
    if cfg.pedal.activation_edges == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "activation_edges must be >= 1",
        )));
    }
    if cfg.cruise.fix_pulses == 0 || cfg.cruise.brake_release_pulses == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "cruise pulse counts must be >= 1",
        )));
    }
    if !cfg.ramp.smoothing.is_finite() || !cfg.ramp.auto_smoothing.is_finite() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "ramp smoothing must be finite",
        )));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let console = match console {
        Some(c) => Some(c),
        None if cfg.output.console => Some(Box::new(TracingConsole) as Box<dyn Console>),
        None => None,
    };
    let buzzer = buzzer.unwrap_or_else(|| Box::new(NoBuzzer));

    Ok(AssistCore::new(sensors, dac, cfg, clock, buzzer, console))
}

impl<S, D> AssistBuilder<S, D> {
    /// Fallible build available in any type-state; returns a detailed error for missing pieces.
    pub fn try_build(self) -> Result<AssistController> {
        let sensors = self
            .sensors
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensors))?;
        let dac = self
            .dac
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDac))?;

        let inner = validate_and_build(
            sensors,
            dac,
            self.config.unwrap_or_default(),
            self.clock,
            self.buzzer,
            self.console,
        )?;
        Ok(AssistController { inner })
    }
}

/// Chainable setters that do not affect type-state.
impl<S, D> AssistBuilder<S, D> {
    pub fn with_config(mut self, config: AssistConfig) -> Self {
        self.config = Some(config);
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn with_buzzer(mut self, buzzer: impl Buzzer + 'static) -> Self {
        self.buzzer = Some(Box::new(buzzer));
        self
    }
    /// Attach a console. Without one, a `TracingConsole` is used when
    /// `output.console` is enabled.
    pub fn with_console(mut self, console: impl Console + 'static) -> Self {
        self.console = Some(Box::new(console));
        self
    }
}

// Setters that advance type-state
impl<D> AssistBuilder<Missing, D> {
    pub fn with_sensors(self, sensors: impl AssistSensors + 'static) -> AssistBuilder<Set, D> {
        AssistBuilder {
            sensors: Some(Box::new(sensors)),
            dac: self.dac,
            config: self.config,
            clock: self.clock,
            buzzer: self.buzzer,
            console: self.console,
            _s: PhantomData,
            _d: PhantomData,
        }
    }
}

impl<S> AssistBuilder<S, Missing> {
    pub fn with_dac(self, dac: impl Dac + 'static) -> AssistBuilder<S, Set> {
        AssistBuilder {
            sensors: self.sensors,
            dac: Some(Box::new(dac)),
            config: self.config,
            clock: self.clock,
            buzzer: self.buzzer,
            console: self.console,
            _s: PhantomData,
            _d: PhantomData,
        }
    }
}

impl AssistBuilder<Set, Set> {
    /// Validate and build. Only available once sensors and DAC are set.
    pub fn build(self) -> Result<AssistController> {
        self.try_build()
    }
}

/// Build a statically-dispatched `AssistCore` from concrete sensors and DAC.
pub fn build_assist<S, D>(
    sensors: S,
    dac: D,
    config: AssistConfig,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    buzzer: Option<Box<dyn Buzzer>>,
    console: Option<Box<dyn Console>>,
) -> Result<AssistCore<S, D>>
where
    S: AssistSensors,
    D: Dac,
{
    validate_and_build(sensors, dac, config, clock, buzzer, console)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{RecordingDac, ScriptedSensors};

    #[test]
    fn try_build_reports_missing_pieces() {
        let err = AssistController::builder().try_build().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingSensors)
        ));
        let err = AssistController::builder()
            .with_sensors(ScriptedSensors::new())
            .try_build()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingDac)
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = AssistConfig::default();
        cfg.output.tick_ms = 0;
        let err = AssistController::builder()
            .with_sensors(ScriptedSensors::new())
            .with_dac(RecordingDac::new())
            .with_config(cfg)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("tick_ms"));
    }

    #[test]
    fn builds_with_defaults() {
        let c = AssistController::builder()
            .with_dac(RecordingDac::new())
            .with_sensors(ScriptedSensors::new())
            .build()
            .unwrap();
        assert_eq!(c.output(), 0);
        assert_eq!(c.cruise_state(), CruiseState::Idle);
    }
}
