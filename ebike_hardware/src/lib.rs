//! Hardware backends for the assist engine: a simulated rig for development and tests,
//! pure MCP4725 / ADS1115 codecs, and the Raspberry Pi wiring behind `hardware`.

pub mod ads1115;
pub mod buzzer;
pub mod error;
pub mod mcp4725;
#[cfg(feature = "hardware")]
pub mod rpi;
pub mod util;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use ebike_traits::{AssistSensors, Buzzer, Cue, Dac, PulseCounter};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared inputs of the simulated rig. Clones drive the same sensors.
#[derive(Debug, Clone, Default)]
pub struct SimInputs {
    throttle: Arc<AtomicU16>,
    brake: Arc<AtomicBool>,
    pulses: PulseCounter,
}

impl SimInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_throttle(&self, raw: u16) {
        self.throttle.store(raw, Ordering::Release);
    }

    pub fn set_brake(&self, pressed: bool) {
        self.brake.store(pressed, Ordering::Release);
    }

    pub fn pulses(&self) -> &PulseCounter {
        &self.pulses
    }
}

/// Simulated sensors reading from [`SimInputs`].
#[derive(Debug, Clone)]
pub struct SimulatedSensors {
    inputs: SimInputs,
}

impl SimulatedSensors {
    pub fn new(inputs: SimInputs) -> Self {
        Self { inputs }
    }
}

impl AssistSensors for SimulatedSensors {
    fn read_throttle_raw(&mut self) -> Result<u16, BoxError> {
        Ok(self.inputs.throttle.load(Ordering::Acquire))
    }

    fn is_brake_active(&mut self) -> Result<bool, BoxError> {
        Ok(self.inputs.brake.load(Ordering::Acquire))
    }

    fn pedal_edge_count(&self) -> u32 {
        self.inputs.pulses.count()
    }
}

/// Background thread emitting PAS edges at a fixed cadence, standing in for the
/// interrupt handler. Stops on drop.
pub struct PasGenerator {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PasGenerator {
    /// `None` when `rpm` or `magnets` is zero (nothing to emit).
    pub fn spawn(pulses: PulseCounter, rpm: u32, magnets: u32) -> error::Result<Option<Self>> {
        let Some(interval) = util::edge_interval(rpm, magnets) else {
            return Ok(None);
        };
        let stop = Arc::new(AtomicBool::new(false));
        let stop_bg = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("pas-sim".into())
            .spawn(move || {
                while !stop_bg.load(Ordering::Acquire) {
                    thread::sleep(interval);
                    pulses.record_edge();
                }
            })?;
        tracing::debug!(rpm, magnets, interval_us = interval.as_micros() as u64, "pas generator started");
        Ok(Some(Self {
            stop,
            handle: Some(handle),
        }))
    }
}

impl Drop for PasGenerator {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Simulated DAC answering at one address and keeping the last written code.
#[derive(Debug, Clone)]
pub struct SimulatedDac {
    address: u8,
    selected: Arc<AtomicU16>,
    last: Arc<AtomicU16>,
    writes: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl SimulatedDac {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            selected: Arc::new(AtomicU16::new(0)),
            last: Arc::new(AtomicU16::new(0)),
            writes: Arc::new(AtomicU64::new(0)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn last(&self) -> u16 {
        self.last.load(Ordering::Acquire)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Acquire)
    }

    /// Address chosen by the engine, 0 before boot.
    pub fn selected_address(&self) -> u8 {
        u8::try_from(self.selected.load(Ordering::Acquire)).unwrap_or(0)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

impl Default for SimulatedDac {
    fn default() -> Self {
        Self::new(mcp4725::DEFAULT_ADDRESS)
    }
}

impl Dac for SimulatedDac {
    fn probe(&mut self, address: u8) -> bool {
        address == self.address
    }

    fn set_address(&mut self, address: u8) {
        self.selected.store(u16::from(address), Ordering::Release);
    }

    fn write_output(&mut self, value: u16) -> Result<(), BoxError> {
        if self.failing.load(Ordering::Acquire) || self.selected_address() != self.address {
            return Err(Box::new(HwError::Nack(self.selected_address())));
        }
        let frame = mcp4725::fast_write_frame(value);
        let code = (u16::from(frame[0]) << 8) | u16::from(frame[1]);
        self.last.store(code, Ordering::Release);
        self.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

/// Logs cues instead of beeping.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedBuzzer;

impl Buzzer for SimulatedBuzzer {
    fn play(&mut self, cue: Cue) -> Result<(), BoxError> {
        tracing::info!(?cue, ms = buzzer::pattern_ms(cue), "beep");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_sensors_follow_inputs() {
        let inputs = SimInputs::new();
        let mut s = SimulatedSensors::new(inputs.clone());
        inputs.set_throttle(512);
        inputs.set_brake(true);
        inputs.pulses().record_edges(3);
        assert_eq!(s.read_throttle_raw().unwrap(), 512);
        assert!(s.is_brake_active().unwrap());
        assert_eq!(s.pedal_edge_count(), 3);
    }

    #[test]
    fn simulated_dac_needs_the_right_address() {
        let mut dac = SimulatedDac::new(0x61);
        assert!(!dac.probe(0x60));
        assert!(dac.probe(0x61));
        dac.set_address(0x60);
        assert!(dac.write_output(100).is_err());
        dac.set_address(0x61);
        dac.write_output(5000).unwrap();
        assert_eq!(dac.last(), mcp4725::MAX_CODE);
        assert_eq!(dac.writes(), 1);
    }
}
