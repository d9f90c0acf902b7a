//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "ebike", version, about = "E-bike assist controller")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/ebike.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging] level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Where sensors and the DAC come from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Backend {
    /// In-process simulated rig
    Sim,
    /// Raspberry Pi GPIO/I2C (needs the `hardware` feature)
    Rpi,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the assist loop until Ctrl-C (or --ticks)
    Run {
        #[arg(long, value_enum, default_value = "sim")]
        backend: Backend,
        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Simulated crank cadence in rpm (0 = not pedaling)
        #[arg(long, value_name = "RPM", default_value_t = 60)]
        cadence: u32,
        /// Simulated throttle reading in ADC units (defaults to the configured rest)
        #[arg(long, value_name = "RAW")]
        throttle_raw: Option<u16>,
        /// Hold the simulated brake lever
        #[arg(long, action = ArgAction::SetTrue)]
        brake: bool,
        /// Print one line per tick
        #[arg(long, action = ArgAction::SetTrue)]
        verbose: bool,
        /// Buzzer GPIO (rpi backend)
        #[arg(long, value_name = "PIN", default_value_t = 22)]
        buzzer_pin: u8,
    },
    /// Replay a scenario CSV (t_ms,pedal_edges,throttle_raw,brake) on a virtual clock
    Simulate {
        #[arg(value_name = "CSV")]
        scenario: PathBuf,
        /// Print only the final summary
        #[arg(long, action = ArgAction::SetTrue)]
        quiet: bool,
    },
    /// Validate the config and list every value that would be adjusted
    CheckConfig {
        /// Fail when any value needs adjusting
        #[arg(long, action = ArgAction::SetTrue)]
        strict: bool,
    },
    /// Boot against the simulated rig and report calibration and DAC discovery
    SelfCheck,
}
