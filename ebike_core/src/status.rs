//! Per-tick input sample and report.

use std::fmt;

use crate::cruise::CruiseState;
use crate::ramp::RampKind;

/// Sensor readings of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSample {
    /// Edges since the previous tick.
    pub pedal_edges: u32,
    pub throttle_raw: u16,
    pub brake_active: bool,
    pub timestamp_ms: u64,
}

impl SensorSample {
    #[inline]
    pub fn pedal_edge(&self) -> bool {
        self.pedal_edges > 0
    }
}

/// Which rule decided the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    WalkAssist,
    Brake,
    Idle,
    Cruise,
    Throttle,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WalkAssist => "walk_assist",
            Self::Brake => "brake",
            Self::Idle => "idle",
            Self::Cruise => "cruise",
            Self::Throttle => "throttle",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one tick of the decision loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub timestamp_ms: u64,
    /// Value decided this tick.
    pub commanded: u16,
    /// Value the DAC is holding (the last successful write).
    pub output: u16,
    pub source: Source,
    pub throttle_level: u16,
    pub pedaling: bool,
    pub cadence_rpm: Option<u32>,
    pub brake: bool,
    pub cruise: CruiseState,
    pub ramp: Option<RampKind>,
    pub dac_ok: bool,
}

impl TickReport {
    pub fn cruise_label(&self) -> &'static str {
        match self.cruise {
            CruiseState::Idle => "idle",
            CruiseState::Fixing { .. } => "fixing",
            CruiseState::Fixed { .. } => "fixed",
            CruiseState::Releasing { .. } => "releasing",
        }
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={}ms out={} src={} thr={} pas={} brake={} cruise={}",
            self.timestamp_ms,
            self.output,
            self.source,
            self.throttle_level,
            u8::from(self.pedaling),
            u8::from(self.brake),
            self.cruise_label(),
        )?;
        if let Some(rpm) = self.cadence_rpm {
            write!(f, " rpm={rpm}")?;
        }
        if let Some(kind) = self.ramp {
            write!(f, " ramp={kind:?}")?;
        }
        if !self.dac_ok {
            f.write_str(" dac=ERR")?;
        }
        Ok(())
    }
}
