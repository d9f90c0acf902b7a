//! ADS1115 16-bit ADC in single-shot mode, used for the throttle.

pub const DEFAULT_ADDRESS: u8 = 0x48;
pub const REG_CONVERSION: u8 = 0x00;
pub const REG_CONFIG: u8 = 0x01;

/// Config word starting one conversion of `channel` against ground: PGA ±4.096 V,
/// 860 SPS, comparator off.
pub fn single_shot_config(channel: u8) -> u16 {
    let mux = 0b100 | u16::from(channel & 0b11);
    (1 << 15) | (mux << 12) | (0b001 << 9) | (1 << 8) | (0b111 << 5) | 0b11
}

/// The OS bit reads back as 1 once the conversion finished.
#[inline]
pub fn conversion_done(config: u16) -> bool {
    config & 0x8000 != 0
}

/// Map a conversion result onto `[0, adc_max]`; negative readings clamp to 0.
pub fn scale_to_adc(raw: i16, adc_max: u16) -> u16 {
    let v = i32::from(raw.max(0)) * i32::from(adc_max) / i32::from(i16::MAX);
    u16::try_from(v).unwrap_or(adc_max)
}

#[cfg(feature = "hardware")]
pub use device::Ads1115;

#[cfg(feature = "hardware")]
mod device {
    use std::time::Duration;

    use rppal::i2c::I2c;

    use super::{REG_CONFIG, REG_CONVERSION, conversion_done, scale_to_adc, single_shot_config};
    use crate::error::{HwError, Result};
    use crate::util::wait_until_ready_with_timeout;

    const CONVERSION_TIMEOUT: Duration = Duration::from_millis(10);
    const POLL_INTERVAL: Duration = Duration::from_micros(200);

    pub struct Ads1115 {
        i2c: I2c,
        channel: u8,
        adc_max: u16,
    }

    fn i2c_err(e: rppal::i2c::Error) -> HwError {
        HwError::I2c(e.to_string())
    }

    impl Ads1115 {
        pub fn new(bus: u8, address: u8, channel: u8, adc_max: u16) -> Result<Self> {
            let mut i2c = I2c::with_bus(bus).map_err(i2c_err)?;
            i2c.set_slave_address(u16::from(address)).map_err(i2c_err)?;
            Ok(Self {
                i2c,
                channel,
                adc_max,
            })
        }

        /// One conversion, scaled to throttle ADC units.
        pub fn read(&mut self) -> Result<u16> {
            let cfg = single_shot_config(self.channel);
            self.i2c
                .block_write(REG_CONFIG, &cfg.to_be_bytes())
                .map_err(i2c_err)?;
            let i2c = &mut self.i2c;
            wait_until_ready_with_timeout(
                || {
                    let mut b = [0u8; 2];
                    i2c.block_read(REG_CONFIG, &mut b).map_err(i2c_err)?;
                    Ok(conversion_done(u16::from_be_bytes(b)))
                },
                CONVERSION_TIMEOUT,
                POLL_INTERVAL,
            )?;
            let mut b = [0u8; 2];
            self.i2c
                .block_read(REG_CONVERSION, &mut b)
                .map_err(i2c_err)?;
            let raw = i16::from_be_bytes(b);
            tracing::trace!(raw, "ads1115 conversion");
            Ok(scale_to_adc(raw, self.adc_max))
        }
    }
}
