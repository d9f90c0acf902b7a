//! Test and helper doubles for ebike_core.
//!
//! Every double is a cheap handle: clones share state, so a test can keep one clone
//! while the controller owns the other.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use ebike_traits::{AssistSensors, Buzzer, Cue, Dac, PulseCounter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Sensors driven by the test: set the throttle and brake, record pedal edges.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensors {
    throttle: Arc<AtomicU16>,
    brake: Arc<AtomicBool>,
    throttle_fails: Arc<AtomicBool>,
    brake_fails: Arc<AtomicBool>,
    queued: Arc<Mutex<VecDeque<u16>>>,
    pulses: PulseCounter,
}

impl ScriptedSensors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_throttle(&self, raw: u16) {
        self.throttle.store(raw, Ordering::Release);
    }

    pub fn set_brake(&self, pressed: bool) {
        self.brake.store(pressed, Ordering::Release);
    }

    pub fn pedal(&self, edges: u32) {
        self.pulses.record_edges(edges);
    }

    /// Readings returned before falling back to [`ScriptedSensors::set_throttle`]'s value.
    pub fn queue_throttle(&self, readings: impl IntoIterator<Item = u16>) {
        lock(&self.queued).extend(readings);
    }

    pub fn fail_throttle(&self, fail: bool) {
        self.throttle_fails.store(fail, Ordering::Release);
    }

    pub fn fail_brake(&self, fail: bool) {
        self.brake_fails.store(fail, Ordering::Release);
    }

    pub fn pulses(&self) -> &PulseCounter {
        &self.pulses
    }
}

impl AssistSensors for ScriptedSensors {
    fn read_throttle_raw(&mut self) -> Result<u16, BoxError> {
        if self.throttle_fails.load(Ordering::Acquire) {
            return Err(Box::new(std::io::Error::other("scripted throttle failure")));
        }
        if let Some(raw) = lock(&self.queued).pop_front() {
            return Ok(raw);
        }
        Ok(self.throttle.load(Ordering::Acquire))
    }

    fn is_brake_active(&mut self) -> Result<bool, BoxError> {
        if self.brake_fails.load(Ordering::Acquire) {
            return Err(Box::new(std::io::Error::other("scripted brake failure")));
        }
        Ok(self.brake.load(Ordering::Acquire))
    }

    fn pedal_edge_count(&self) -> u32 {
        self.pulses.count()
    }
}

#[derive(Debug, Default)]
struct DacLog {
    responders: Vec<u8>,
    probed: Vec<u8>,
    address: Option<u8>,
    writes: Vec<u16>,
    failing: bool,
}

/// DAC that records every call and can be told to fail writes.
#[derive(Debug, Clone, Default)]
pub struct RecordingDac {
    log: Arc<Mutex<DacLog>>,
}

impl RecordingDac {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acknowledge probes at `address`.
    pub fn responding_at(self, address: u8) -> Self {
        lock(&self.log).responders.push(address);
        self
    }

    pub fn fail_writes(&self, fail: bool) {
        lock(&self.log).failing = fail;
    }

    pub fn probed(&self) -> Vec<u8> {
        lock(&self.log).probed.clone()
    }

    pub fn address(&self) -> Option<u8> {
        lock(&self.log).address
    }

    /// Successful writes, oldest first.
    pub fn writes(&self) -> Vec<u16> {
        lock(&self.log).writes.clone()
    }

    pub fn last(&self) -> Option<u16> {
        lock(&self.log).writes.last().copied()
    }
}

impl Dac for RecordingDac {
    fn probe(&mut self, address: u8) -> bool {
        let mut log = lock(&self.log);
        log.probed.push(address);
        log.responders.contains(&address)
    }

    fn set_address(&mut self, address: u8) {
        lock(&self.log).address = Some(address);
    }

    fn write_output(&mut self, value: u16) -> Result<(), BoxError> {
        let mut log = lock(&self.log);
        if log.failing {
            return Err(Box::new(std::io::Error::other("bus error: nack")));
        }
        log.writes.push(value);
        Ok(())
    }
}

/// Buzzer that records the cues it was asked to play.
#[derive(Debug, Clone, Default)]
pub struct RecordingBuzzer {
    cues: Arc<Mutex<Vec<Cue>>>,
}

impl RecordingBuzzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        lock(&self.cues).clone()
    }
}

impl Buzzer for RecordingBuzzer {
    fn play(&mut self, cue: Cue) -> Result<(), BoxError> {
        lock(&self.cues).push(cue);
        Ok(())
    }
}
