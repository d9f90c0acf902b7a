use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("no acknowledge from device at {0:#04x}")]
    Nack(u8),
    #[error("bus timeout")]
    Timeout,
    #[error("adc conversion timeout")]
    ConversionTimeout,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
