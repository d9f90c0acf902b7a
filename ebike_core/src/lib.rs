#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Pedal-assist decision engine (hardware-agnostic).
//!
//! All I/O goes through the `ebike_traits` seams: `AssistSensors` for PAS, throttle and
//! brake, `Dac` for the motor controller input and `Buzzer` for cues.
//!
//! ## Architecture
//!
//! - **Cadence**: PAS edge debouncing (`cadence`)
//! - **Throttle**: raw ADC to output codes, boot recalibration (`throttle`)
//! - **Cruise**: latch/release state machine (`cruise`)
//! - **Walk assist**: brake-gated low speed push (`walk_assist`)
//! - **Ramp**: progressive and auto-progressive transitions (`ramp`)
//! - **Decision loop**: arbitration and DAC write per tick (`core`, `runner`)
//!
//! ## Units
//!
//! Outputs are DAC codes in `[0, out_max]` (4095 for a 12-bit DAC). Time is milliseconds
//! since boot on the injected `Clock`; cruise and release counters are ticks.

pub mod builder;
pub mod cadence;
pub mod config;
pub mod conversions;
pub mod core;
pub mod cruise;
pub mod dac;
pub mod error;
pub mod hw_error;
pub mod logger;
pub mod mocks;
pub mod ramp;
pub mod range;
pub mod runner;
pub mod status;
pub mod throttle;
pub mod util;
pub mod walk_assist;

pub use builder::{AssistBuilder, AssistController, build_assist};
pub use cadence::{CadenceDetector, CadenceState};
pub use config::*;
pub use crate::core::{AssistCore, BootReport, FaultCounters};
pub use cruise::{CruiseController, CruiseEvent, CruiseState, ReleaseCause};
pub use error::{AssistError, BuildError, CalibrationError, Result};
pub use logger::{ChannelConsole, Console, TracingConsole};
pub use ramp::{Curve, RampGenerator, RampKind, RampState};
pub use range::{clamp, within_tolerance};
pub use runner::RunStats;
pub use status::{SensorSample, Source, TickReport};
pub use throttle::{ThrottleCalibration, ThrottleChannel};
pub use walk_assist::{WalkAssistController, WalkState};
