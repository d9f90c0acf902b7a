//! Command implementations: config loading, backend assembly and the ride loops.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ebike_config::{Adjustment, Config};
use ebike_core::{
    AssistConfig, AssistController, AssistError, BootReport, CalibrationError, ChannelConsole,
    RunStats, SensorSample, TickReport, build_assist,
};
use ebike_hardware::{PasGenerator, SimInputs, SimulatedBuzzer, SimulatedDac, SimulatedSensors};
use ebike_traits::{AssistSensors, Buzzer, Dac, ManualClock};
use eyre::{Result, WrapErr};
use serde_json::{Value, json};

use crate::cli::Backend;

type Backends = (Box<dyn AssistSensors>, Box<dyn Dac>, Box<dyn Buzzer>);

/// Read and parse the TOML config. Values are not sanitized yet.
pub fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).wrap_err_with(|| format!("invalid configuration in {}", path.display()))
}

pub fn warn_adjustments(adjustments: &[Adjustment]) {
    for a in adjustments {
        tracing::warn!(adjustment = %a, "config value adjusted");
    }
}

pub fn report_json(r: &TickReport) -> Value {
    json!({
        "t_ms": r.timestamp_ms,
        "output": r.output,
        "commanded": r.commanded,
        "source": r.source.as_str(),
        "throttle": r.throttle_level,
        "pedaling": r.pedaling,
        "cadence_rpm": r.cadence_rpm,
        "brake": r.brake,
        "cruise": r.cruise_label(),
        "ramp": r.ramp.map(|k| format!("{k:?}")),
        "dac_ok": r.dac_ok,
    })
}

pub fn stats_json(s: &RunStats) -> Value {
    json!({
        "summary": {
            "ticks": s.ticks,
            "overruns": s.overruns,
            "dac_errors": s.dac_errors,
            "peak_output": s.peak_output,
            "cruise_ticks": s.cruise_ticks,
            "walk_assist_ticks": s.walk_assist_ticks,
        }
    })
}

fn print_stats(s: &RunStats, json: bool) {
    if json {
        println!("{}", stats_json(s));
    } else {
        println!(
            "ticks={} overruns={} dac_errors={} peak_output={} cruise_ticks={} walk_assist_ticks={}",
            s.ticks, s.overruns, s.dac_errors, s.peak_output, s.cruise_ticks, s.walk_assist_ticks
        );
    }
}

/// The simulated DAC answers where the config expects it, or at the first scanned address.
fn sim_dac(cfg: &Config) -> SimulatedDac {
    match cfg.dac.address {
        0 => SimulatedDac::default(),
        addr => SimulatedDac::new(addr),
    }
}

// ── check-config ─────────────────────────────────────────────────────────────

pub fn check_config(path: &Path, raw: &Config, strict: bool, json: bool) -> Result<()> {
    let (_, adjustments) = raw.clone().sanitized();
    if json {
        let list: Vec<Value> = adjustments
            .iter()
            .map(|a| json!({ "field": a.field, "reason": a.reason, "from": a.from, "to": a.to }))
            .collect();
        println!(
            "{}",
            json!({ "config": path.display().to_string(), "adjustments": list })
        );
    } else {
        for a in &adjustments {
            println!("adjusted: {a}");
        }
        println!(
            "config {}: {} adjustment(s)",
            path.display(),
            adjustments.len()
        );
    }
    if strict {
        raw.validate().wrap_err("invalid configuration")?;
    }
    Ok(())
}

// ── self-check ───────────────────────────────────────────────────────────────

fn calibration_text(r: &Option<std::result::Result<u16, CalibrationError>>) -> String {
    match r {
        None => "disabled".to_string(),
        Some(Ok(v)) => v.to_string(),
        Some(Err(e)) => format!("kept ({e})"),
    }
}

pub fn self_check(cfg: &Config, json: bool) -> Result<BootReport> {
    let inputs = SimInputs::new();
    inputs.set_throttle(cfg.throttle.min_raw);
    let mut ctl = AssistController::builder()
        .with_sensors(SimulatedSensors::new(inputs))
        .with_dac(sim_dac(cfg))
        .with_buzzer(SimulatedBuzzer)
        .with_clock(Box::new(ManualClock::new()))
        .with_config(AssistConfig::from(cfg))
        .build()?;
    let boot = ctl.boot();
    if !boot.dac_ok {
        return Err(eyre::Report::new(AssistError::HardwareFault(format!(
            "dac at {:#04x} rejected the boot write",
            boot.dac_address
        ))));
    }
    if json {
        println!(
            "{}",
            json!({
                "dac_address": boot.dac_address,
                "min_raw": boot.calibration.min_raw(),
                "max_raw": boot.calibration.max_raw(),
                "rest": calibration_text(&boot.rest),
                "travel": calibration_text(&boot.travel),
            })
        );
    } else {
        println!(
            "self-check OK: dac={:#04x} throttle={}..{} rest={} travel={}",
            boot.dac_address,
            boot.calibration.min_raw(),
            boot.calibration.max_raw(),
            calibration_text(&boot.rest),
            calibration_text(&boot.travel),
        );
    }
    Ok(boot)
}

// ── simulate ─────────────────────────────────────────────────────────────────

/// Replay a scenario on a virtual clock. Boot recalibration is skipped so the
/// configured throttle range applies.
pub fn simulate(cfg: &Config, scenario: &Path, quiet: bool, json: bool) -> Result<RunStats> {
    let rows = ebike_config::load_scenario_csv(scenario)
        .wrap_err_with(|| format!("scenario {}", scenario.display()))?;
    let mut assist = AssistConfig::from(cfg);
    assist.throttle.recalibrate_min = false;
    assist.throttle.recalibrate_max = false;

    let clock = ManualClock::new();
    let mut core = build_assist(
        SimulatedSensors::new(SimInputs::new()),
        sim_dac(cfg),
        assist,
        Some(Box::new(clock.clone())),
        Some(Box::new(SimulatedBuzzer)),
        None,
    )?;
    core.boot();
    tracing::info!(rows = rows.len(), "replaying scenario");

    let mut stats = RunStats::default();
    for row in &rows {
        clock.set_offset(Duration::from_millis(row.t_ms));
        let report = core.tick_with(SensorSample {
            pedal_edges: row.pedal_edges,
            throttle_raw: row.throttle_raw,
            brake_active: row.brake,
            timestamp_ms: row.t_ms,
        });
        stats.record(&report);
        if !quiet {
            if json {
                println!("{}", report_json(&report));
            } else {
                println!("{report}");
            }
        }
    }
    print_stats(&stats, json);
    Ok(stats)
}

// ── run ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct RunOpts {
    pub backend: Backend,
    pub ticks: Option<u64>,
    pub cadence: u32,
    pub throttle_raw: Option<u16>,
    pub brake: bool,
    pub verbose: bool,
    pub buzzer_pin: u8,
}

#[cfg(feature = "hardware")]
fn rpi_backend(cfg: &Config, buzzer_pin: u8) -> Result<Backends> {
    use ebike_hardware::buzzer::GpioBuzzer;
    use ebike_hardware::mcp4725::Mcp4725;
    use ebike_hardware::rpi::{RpiPins, RpiSensors};

    let pins = RpiPins {
        adc_max: cfg.throttle.adc_max,
        ..RpiPins::default()
    };
    let sensors = RpiSensors::new(&pins).wrap_err("open rpi sensors")?;
    let dac = Mcp4725::new(pins.i2c_bus).wrap_err("open i2c dac")?;
    let buzzer: Box<dyn Buzzer> = if cfg.buzzer.enabled {
        Box::new(GpioBuzzer::new(buzzer_pin).wrap_err("open buzzer pin")?)
    } else {
        Box::new(ebike_traits::NoBuzzer)
    };
    Ok((Box::new(sensors), Box::new(dac), buzzer))
}

#[cfg(not(feature = "hardware"))]
fn rpi_backend(_cfg: &Config, _buzzer_pin: u8) -> Result<Backends> {
    eyre::bail!("the rpi backend requires a build with the `hardware` feature")
}

pub fn run(cfg: &Config, opts: RunOpts, json: bool) -> Result<RunStats> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || flag.store(true, Ordering::Release))
            .wrap_err("install Ctrl-C handler")?;
    }

    let mut sim: Option<SimInputs> = None;
    let (sensors, dac, buzzer): Backends = match opts.backend {
        Backend::Sim => {
            let inputs = SimInputs::new();
            inputs.set_throttle(cfg.throttle.min_raw);
            sim = Some(inputs.clone());
            (
                Box::new(SimulatedSensors::new(inputs)),
                Box::new(sim_dac(cfg)),
                Box::new(SimulatedBuzzer),
            )
        }
        Backend::Rpi => rpi_backend(cfg, opts.buzzer_pin)?,
    };

    let (console, printer) = if cfg.console.enabled {
        let (console, rx) = ChannelConsole::bounded(cfg.console.capacity);
        let printer = std::thread::Builder::new()
            .name("console".into())
            .spawn(move || {
                for line in rx.iter() {
                    println!("{line}");
                }
            })
            .wrap_err("spawn console printer")?;
        (Some(console), Some(printer))
    } else {
        (None, None)
    };

    let mut builder = AssistController::builder()
        .with_sensors(sensors)
        .with_dac(dac)
        .with_buzzer(buzzer)
        .with_config(AssistConfig::from(cfg));
    if let Some(console) = console {
        builder = builder.with_console(console);
    }
    let mut ctl = builder.build()?;

    let boot = ctl.boot();
    tracing::info!(
        dac = boot.dac_address,
        min_raw = boot.calibration.min_raw(),
        max_raw = boot.calibration.max_raw(),
        dac_ok = boot.dac_ok,
        "boot complete"
    );

    let pas = match &sim {
        Some(inputs) => {
            inputs.set_throttle(opts.throttle_raw.unwrap_or(cfg.throttle.min_raw));
            inputs.set_brake(opts.brake);
            PasGenerator::spawn(
                inputs.pulses().clone(),
                opts.cadence,
                u32::from(cfg.pedal.magnets),
            )
            .wrap_err("start simulated pedal sensor")?
        }
        None => None,
    };

    let stats = ctl.run(&shutdown, opts.ticks, |r| {
        if !opts.verbose {
            return;
        }
        if json {
            println!("{}", report_json(r));
        } else {
            println!("{r}");
        }
    });

    drop(pas);
    // Dropping the controller closes the console channel.
    drop(ctl);
    if let Some(p) = printer {
        let _ = p.join();
    }
    print_stats(&stats, json);
    Ok(stats)
}
