use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssistError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("bus timeout")]
    Timeout,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("calibration rejected: {0}")]
    Calibration(#[from] CalibrationError),
}

/// Boot-time throttle recalibration outcomes that leave the previous calibration in place.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("no throttle samples available")]
    NoSamples,
    #[error("rest reading {candidate} above plausible limit {limit}")]
    ImplausibleRest { candidate: u16, limit: u16 },
    #[error("throttle never exceeded {threshold} (peak {peak})")]
    NoTravel { threshold: u16, peak: u16 },
    #[error("degenerate throttle range {min_raw}..{max_raw}")]
    DegenerateRange { min_raw: u16, max_raw: u16 },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing sensors")]
    MissingSensors,
    #[error("missing dac")]
    MissingDac,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
