//! MCP4725 12-bit I2C DAC.

/// Full-scale code.
pub const MAX_CODE: u16 = 0x0FFF;
/// Factory address with A0 tied low.
pub const DEFAULT_ADDRESS: u8 = 0x60;

/// "Fast write" frame: power-down bits `00` followed by the 12-bit code, MSB first.
/// Codes above [`MAX_CODE`] saturate.
#[inline]
pub fn fast_write_frame(code: u16) -> [u8; 2] {
    let c = code.min(MAX_CODE);
    [((c >> 8) & 0x0F) as u8, (c & 0xFF) as u8]
}

#[cfg(feature = "hardware")]
pub use device::Mcp4725;

#[cfg(feature = "hardware")]
mod device {
    use ebike_traits::Dac;
    use rppal::i2c::I2c;

    use super::{DEFAULT_ADDRESS, fast_write_frame};
    use crate::error::{HwError, Result};

    pub struct Mcp4725 {
        i2c: I2c,
        address: u8,
    }

    impl Mcp4725 {
        pub fn new(bus: u8) -> Result<Self> {
            let i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
            Ok(Self {
                i2c,
                address: DEFAULT_ADDRESS,
            })
        }
    }

    impl Dac for Mcp4725 {
        fn probe(&mut self, address: u8) -> bool {
            if self.i2c.set_slave_address(u16::from(address)).is_err() {
                return false;
            }
            let mut status = [0u8; 3];
            let found = self.i2c.read(&mut status).is_ok();
            tracing::trace!(address, found, "mcp4725 probe");
            found
        }

        fn set_address(&mut self, address: u8) {
            self.address = address;
            if let Err(e) = self.i2c.set_slave_address(u16::from(address)) {
                tracing::warn!(address, error = %e, "mcp4725 address not applied");
            }
        }

        fn write_output(
            &mut self,
            value: u16,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            match self.i2c.write(&fast_write_frame(value)) {
                Ok(2) => Ok(()),
                Ok(_) => Err(Box::new(HwError::Nack(self.address))),
                Err(e) => Err(Box::new(HwError::I2c(e.to_string()))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, [0x00, 0x00])]
    #[case(0x0ABC, [0x0A, 0xBC])]
    #[case(MAX_CODE, [0x0F, 0xFF])]
    #[case(0xFFFF, [0x0F, 0xFF])]
    fn frames(#[case] code: u16, #[case] frame: [u8; 2]) {
        assert_eq!(fast_write_frame(code), frame);
    }
}
