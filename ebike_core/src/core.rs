//! The per-tick decision loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ebike_traits::clock::Clock;
use ebike_traits::pulse::edges_since;
use ebike_traits::{AssistSensors, Buzzer, Cue, Dac};

use crate::cadence::CadenceDetector;
use crate::config::AssistConfig;
use crate::cruise::{CruiseController, CruiseEvent, CruiseInput, CruiseState};
use crate::error::CalibrationError;
use crate::hw_error::map_hw_error;
use crate::logger::Console;
use crate::ramp::RampGenerator;
use crate::range::clamp;
use crate::status::{SensorSample, Source, TickReport};
use crate::throttle::{ThrottleCalibration, ThrottleChannel};
use crate::walk_assist::{WalkAssistController, WalkInput, WalkState};

/// What the boot sequence settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootReport {
    pub dac_address: u8,
    pub calibration: ThrottleCalibration,
    /// `None` when rest recalibration is disabled.
    pub rest: Option<Result<u16, CalibrationError>>,
    /// `None` when travel recalibration is disabled.
    pub travel: Option<Result<u16, CalibrationError>>,
    pub dac_ok: bool,
}

/// Recovered faults since build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultCounters {
    pub throttle_reads: u64,
    pub brake_reads: u64,
    pub dac_writes: u64,
}

/// Decision engine over concrete sensors and DAC.
pub struct AssistCore<S, D> {
    pub(crate) sensors: S,
    pub(crate) dac: D,
    pub(crate) buzzer: Box<dyn Buzzer>,
    pub(crate) console: Option<Box<dyn Console>>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) cfg: AssistConfig,
    pub(crate) cadence: CadenceDetector,
    pub(crate) throttle: ThrottleChannel,
    pub(crate) cruise: CruiseController,
    pub(crate) walk: WalkAssistController,
    pub(crate) ramp: RampGenerator,
    pub(crate) last_edge_count: u32,
    pub(crate) last_output: u16,
    pub(crate) dac_address: u8,
    pub(crate) faults: FaultCounters,
    throttle_healthy: bool,
    brake_healthy: bool,
    dac_healthy: bool,
}

impl<S: AssistSensors, D: Dac> AssistCore<S, D> {
    pub(crate) fn new(
        sensors: S,
        dac: D,
        cfg: AssistConfig,
        clock: Arc<dyn Clock + Send + Sync>,
        buzzer: Box<dyn Buzzer>,
        console: Option<Box<dyn Console>>,
    ) -> Self {
        let out_max = cfg.output.out_max;
        let epoch = clock.now();
        let last_edge_count = sensors.pedal_edge_count();
        Self {
            cadence: CadenceDetector::new(&cfg.pedal),
            throttle: ThrottleChannel::new(cfg.throttle.clone(), out_max),
            cruise: CruiseController::new(cfg.cruise.clone()),
            walk: WalkAssistController::new(cfg.walk_assist.clone(), cfg.ramp.smoothing, out_max),
            ramp: RampGenerator::new(cfg.ramp.clone(), out_max),
            dac_address: cfg.output.dac_address,
            sensors,
            dac,
            buzzer,
            console,
            clock,
            epoch,
            cfg,
            last_edge_count,
            last_output: 0,
            faults: FaultCounters::default(),
            throttle_healthy: true,
            brake_healthy: true,
            dac_healthy: true,
        }
    }

    /// Resolve the DAC address, recalibrate the throttle, play the boot cue and park the
    /// output at zero. Failures are logged and recovered; boot always completes.
    pub fn boot(&mut self) -> BootReport {
        self.dac_address = crate::dac::resolve_address(&mut self.dac, self.cfg.output.dac_address);
        self.dac.set_address(self.dac_address);

        let rest = self.cfg.throttle.recalibrate_min.then(|| {
            let readings = self.collect_throttle(self.cfg.throttle.rest_samples);
            self.throttle.calibrate_rest(&readings)
        });
        if let Some(Err(e)) = rest {
            tracing::warn!(error = %e, "throttle rest recalibration rejected");
        }
        let travel = self.cfg.throttle.recalibrate_max.then(|| {
            let readings = self.collect_throttle(self.cfg.throttle.travel_samples);
            self.throttle.calibrate_travel(&readings)
        });
        if let Some(Err(e)) = travel {
            tracing::warn!(error = %e, "throttle travel recalibration rejected");
        }

        self.play(Cue::Boot);
        let dac_ok = self.write(0);
        self.last_edge_count = self.sensors.pedal_edge_count();
        self.epoch = self.clock.now();

        let calibration = self.throttle.calibration();
        tracing::info!(
            dac_address = self.dac_address,
            min_raw = calibration.min_raw(),
            max_raw = calibration.max_raw(),
            dac_ok,
            "boot complete"
        );
        BootReport {
            dac_address: self.dac_address,
            calibration,
            rest,
            travel,
            dac_ok,
        }
    }

    /// Milliseconds since boot on the injected clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Read the sensors once. Read errors degrade to throttle at rest and brake pressed.
    pub fn sample(&mut self) -> SensorSample {
        let timestamp_ms = self.now_ms();
        let count = self.sensors.pedal_edge_count();
        let pedal_edges = edges_since(self.last_edge_count, count);
        self.last_edge_count = count;

        let throttle_raw = match self.sensors.read_throttle_raw() {
            Ok(raw) => {
                if !self.throttle_healthy {
                    tracing::info!("throttle readings recovered");
                    self.throttle_healthy = true;
                }
                raw
            }
            Err(e) => {
                self.faults.throttle_reads += 1;
                if self.throttle_healthy {
                    tracing::warn!(error = %map_hw_error(e.as_ref()), "throttle read failed, treating as released");
                    self.throttle_healthy = false;
                }
                self.throttle.rest_raw()
            }
        };
        let brake_active = match self.sensors.is_brake_active() {
            Ok(b) => {
                if !self.brake_healthy {
                    tracing::info!("brake readings recovered");
                    self.brake_healthy = true;
                }
                b
            }
            Err(e) => {
                self.faults.brake_reads += 1;
                if self.brake_healthy {
                    tracing::warn!(error = %map_hw_error(e.as_ref()), "brake read failed, treating as pressed");
                    self.brake_healthy = false;
                }
                true
            }
        };

        SensorSample {
            pedal_edges,
            throttle_raw,
            brake_active,
            timestamp_ms,
        }
    }

    /// Sample the sensors and run one tick.
    pub fn tick(&mut self) -> TickReport {
        let sample = self.sample();
        self.tick_with(sample)
    }

    /// Run one tick on an externally produced sample.
    pub fn tick_with(&mut self, sample: SensorSample) -> TickReport {
        let now = sample.timestamp_ms;
        let brake = sample.brake_active;
        let pedaling = self.cadence.update(sample.pedal_edges, now);
        let level = self.throttle.level(sample.throttle_raw);
        let engaged = self.throttle.is_engaged(level);

        self.ramp.note_pedaling(pedaling, brake, now);

        let was_walking = self.walk.is_active();
        let walk_value = self.walk.update(WalkInput {
            pedaling,
            brake,
            engaged,
            now_ms: now,
        });
        if !was_walking && self.walk.is_active() {
            self.play(Cue::WalkAssist);
        }

        match self.cruise.update(CruiseInput {
            pedaling,
            brake,
            level,
            engaged,
            now_ms: now,
        }) {
            Some(CruiseEvent::Fixed(_)) => self.play(Cue::CruiseFixed),
            Some(CruiseEvent::Released(_)) => self.play(Cue::CruiseReleased),
            None => {}
        }

        let (value, source) = if let Some(v) = walk_value {
            self.ramp.hold(v);
            (self.ramp.current(), Source::WalkAssist)
        } else if brake {
            self.ramp.cut();
            (0, Source::Brake)
        } else if !pedaling && self.cfg.output.require_pedaling {
            self.ramp.cut();
            (0, Source::Idle)
        } else if let Some(v) = self.cruise.authoritative_target(level) {
            (self.ramp.update(v, now), Source::Cruise)
        } else {
            let target = if engaged { level } else { 0 };
            (self.ramp.update(target, now), Source::Throttle)
        };

        let commanded = clamp(value, 0, self.cfg.output.out_max);
        let dac_ok = self.write(commanded);

        let report = TickReport {
            timestamp_ms: now,
            commanded,
            output: self.last_output,
            source,
            throttle_level: level,
            pedaling,
            cadence_rpm: self.cadence.cadence_rpm(),
            brake,
            cruise: self.cruise.state(),
            ramp: self.ramp.active_kind(),
            dac_ok,
        };
        tracing::trace!(
            t = now,
            output = report.output,
            source = %source,
            level,
            pedaling,
            brake,
            "tick"
        );
        if let Some(console) = &self.console {
            console.line(&report.to_string());
        }
        report
    }

    pub fn config(&self) -> &AssistConfig {
        &self.cfg
    }

    /// Last value successfully written to the DAC.
    pub fn output(&self) -> u16 {
        self.last_output
    }

    pub fn dac_address(&self) -> u8 {
        self.dac_address
    }

    pub fn cruise_state(&self) -> CruiseState {
        self.cruise.state()
    }

    pub fn walk_state(&self) -> WalkState {
        self.walk.state()
    }

    pub fn is_pedaling(&self) -> bool {
        self.cadence.is_pedaling()
    }

    pub fn throttle_calibration(&self) -> ThrottleCalibration {
        self.throttle.calibration()
    }

    pub fn faults(&self) -> FaultCounters {
        self.faults
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        Arc::clone(&self.clock)
    }

    fn collect_throttle(&mut self, samples: u16) -> Vec<u16> {
        let interval = Duration::from_millis(self.cfg.throttle.sample_interval_ms);
        let mut readings = Vec::with_capacity(usize::from(samples));
        for i in 0..samples {
            match self.sensors.read_throttle_raw() {
                Ok(raw) => readings.push(raw),
                Err(e) => {
                    self.faults.throttle_reads += 1;
                    tracing::debug!(error = %map_hw_error(e.as_ref()), "calibration sample lost");
                }
            }
            if i + 1 < samples {
                self.clock.sleep(interval);
            }
        }
        readings
    }

    fn write(&mut self, value: u16) -> bool {
        match self.dac.write_output(value) {
            Ok(()) => {
                self.last_output = value;
                if !self.dac_healthy {
                    tracing::info!("dac writes recovered");
                    self.dac_healthy = true;
                }
                true
            }
            Err(e) => {
                self.faults.dac_writes += 1;
                let err = map_hw_error(e.as_ref());
                if self.dac_healthy {
                    tracing::warn!(error = %err, held = self.last_output, "dac write failed, holding last output");
                    self.dac_healthy = false;
                }
                if let Some(console) = &self.console {
                    console.line(&format!("dac error: {err}"));
                }
                false
            }
        }
    }

    fn play(&mut self, cue: Cue) {
        if !self.cfg.output.buzzer {
            return;
        }
        if let Err(e) = self.buzzer.play(cue) {
            tracing::warn!(?cue, error = %map_hw_error(e.as_ref()), "buzzer failed");
        }
    }
}
