pub mod clock;
pub mod pulse;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use pulse::PulseCounter;

/// Inputs sampled once per control tick.
pub trait AssistSensors {
    /// Raw throttle reading in ADC units.
    fn read_throttle_raw(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
    fn is_brake_active(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
    /// Monotonic PAS edge count, fed from interrupt context. Wraps at `u32::MAX`.
    fn pedal_edge_count(&self) -> u32;
}

/// Bus-addressed DAC feeding the motor controller's throttle input.
pub trait Dac {
    /// Returns true when a device acknowledges at `address`.
    fn probe(&mut self, address: u8) -> bool;
    fn set_address(&mut self, address: u8);
    /// Write one output code in `[0, full_scale]`.
    fn write_output(&mut self, value: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Audible feedback cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Boot,
    CruiseFixed,
    CruiseReleased,
    WalkAssist,
}

pub trait Buzzer {
    fn play(&mut self, cue: Cue) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A buzzer that stays silent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBuzzer;

impl Buzzer for NoBuzzer {
    fn play(&mut self, _cue: Cue) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

impl<T: AssistSensors + ?Sized> AssistSensors for Box<T> {
    fn read_throttle_raw(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_throttle_raw()
    }
    fn is_brake_active(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).is_brake_active()
    }
    fn pedal_edge_count(&self) -> u32 {
        (**self).pedal_edge_count()
    }
}

impl<T: Dac + ?Sized> Dac for Box<T> {
    fn probe(&mut self, address: u8) -> bool {
        (**self).probe(address)
    }
    fn set_address(&mut self, address: u8) {
        (**self).set_address(address);
    }
    fn write_output(&mut self, value: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_output(value)
    }
}

impl<T: Buzzer + ?Sized> Buzzer for Box<T> {
    fn play(&mut self, cue: Cue) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).play(cue)
    }
}
