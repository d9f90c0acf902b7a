//! Raspberry Pi sensor wiring: PAS on a GPIO interrupt, brake switch on a GPIO input and
//! the throttle on an ADS1115.

use ebike_traits::{AssistSensors, PulseCounter};
use rppal::gpio::{Gpio, InputPin, Level, Trigger};

use crate::ads1115::{self, Ads1115};
use crate::error::{HwError, Result};

/// Pin and bus assignment.
#[derive(Debug, Clone)]
pub struct RpiPins {
    pub pas: u8,
    pub brake: u8,
    /// Brake switch pulls the line low when pressed.
    pub brake_active_low: bool,
    pub i2c_bus: u8,
    pub adc_address: u8,
    pub adc_channel: u8,
    pub adc_max: u16,
}

impl Default for RpiPins {
    fn default() -> Self {
        Self {
            pas: 17,
            brake: 27,
            brake_active_low: true,
            i2c_bus: 1,
            adc_address: ads1115::DEFAULT_ADDRESS,
            adc_channel: 0,
            adc_max: 1023,
        }
    }
}

pub struct RpiSensors {
    adc: Ads1115,
    brake: InputPin,
    brake_active_low: bool,
    pulses: PulseCounter,
    // Kept alive for its interrupt thread.
    _pas: InputPin,
}

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

impl RpiSensors {
    pub fn new(pins: &RpiPins) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let brake = gpio.get(pins.brake).map_err(gpio_err)?.into_input_pullup();
        let mut pas = gpio.get(pins.pas).map_err(gpio_err)?.into_input_pullup();

        let pulses = PulseCounter::new();
        let isr_pulses = pulses.clone();
        pas.set_async_interrupt(Trigger::RisingEdge, move |_level: Level| {
            isr_pulses.record_edge();
        })
        .map_err(gpio_err)?;

        let adc = Ads1115::new(pins.i2c_bus, pins.adc_address, pins.adc_channel, pins.adc_max)?;
        tracing::info!(pas = pins.pas, brake = pins.brake, "rpi sensors ready");
        Ok(Self {
            adc,
            brake,
            brake_active_low: pins.brake_active_low,
            pulses,
            _pas: pas,
        })
    }

    pub fn pulses(&self) -> &PulseCounter {
        &self.pulses
    }
}

impl AssistSensors for RpiSensors {
    fn read_throttle_raw(&mut self) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        self.adc.read().map_err(|e| Box::new(e) as _)
    }

    fn is_brake_active(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let high = self.brake.is_high();
        Ok(high != self.brake_active_low)
    }

    fn pedal_edge_count(&self) -> u32 {
        self.pulses.count()
    }
}
