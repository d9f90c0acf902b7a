#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and scenario parsing for the assist controller.
//!
//! - `Config` and its sections are deserialized from TOML. Every field has a default, so
//!   an empty file is a complete configuration.
//! - Field names of the original firmware headers (`pulsos_fijar_crucero`, ...) are
//!   accepted as aliases.
//! - `Config::sanitize` clamps invariant violations to the nearest valid value and reports
//!   what it changed; `Config::validate` turns the first violation into an error.
//! - Scenario CSV loader for offline replays enforces headers and time ordering.
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DacCfg {
    /// 7-bit bus address; 0 scans for the device at boot.
    #[serde(alias = "dir_dac")]
    pub address: u8,
    /// DAC resolution; the output full scale is `2^bits - 1`.
    pub resolution_bits: u8,
}

impl Default for DacCfg {
    fn default() -> Self {
        Self {
            address: 0,
            resolution_bits: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuzzerCfg {
    #[serde(alias = "buzzer_activo")]
    pub enabled: bool,
}

impl Default for BuzzerCfg {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThrottleCfg {
    /// Full scale of the throttle ADC.
    pub adc_max: u16,
    /// Default rest reading (ADC units).
    pub min_raw: u16,
    /// Default full-travel reading (ADC units).
    pub max_raw: u16,
    #[serde(alias = "recalcular_rango_min_acelerador")]
    pub recalibrate_min: bool,
    #[serde(alias = "recalcular_rango_max_acelerador")]
    pub recalibrate_max: bool,
    /// Readings averaged for the rest point at boot.
    pub rest_samples: u16,
    /// Added on top of the averaged rest reading to swallow noise.
    pub rest_margin: u16,
    /// A rest reading above this means the throttle was held at boot.
    pub max_plausible_rest: u16,
    /// Readings scanned for the full-travel point at boot.
    pub travel_samples: u16,
    /// Distance above rest that starts full-travel capture.
    pub min_travel_delta: u16,
    /// Spacing between boot calibration readings.
    pub sample_interval_ms: u64,
    /// Output level at or below which the throttle counts as released.
    pub deadband: u16,
}

impl Default for ThrottleCfg {
    fn default() -> Self {
        Self {
            adc_max: 1023,
            min_raw: 190,
            max_raw: 850,
            recalibrate_min: true,
            recalibrate_max: true,
            rest_samples: 30,
            rest_margin: 8,
            max_plausible_rest: 400,
            travel_samples: 20,
            min_travel_delta: 200,
            sample_interval_ms: 10,
            deadband: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PedalCfg {
    /// Consecutive PAS edges that assert pedaling (2, 3 or 4).
    #[serde(alias = "interrupciones_activacion_pedaleo")]
    pub activation_edges: u8,
    /// Larger values accept slower cadence before declaring a stop.
    #[serde(alias = "tolerancia_pas")]
    pub pas_tolerance: u8,
    /// Expected gap between edges at the slowest useful cadence.
    pub base_gap_ms: u64,
    /// Magnets on the PAS disc (edges per crank revolution).
    pub magnets: u8,
}

impl Default for PedalCfg {
    fn default() -> Self {
        Self {
            activation_edges: 3,
            pas_tolerance: 3,
            base_gap_ms: 150,
            magnets: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WalkAssistCfg {
    #[serde(alias = "ayuda_salida_activa", alias = "freno_pulsado")]
    pub enabled: bool,
    #[serde(alias = "retardo_ayuda_arranque")]
    pub delay_ms: u64,
    #[serde(alias = "activar_progresivo_ayuda_arranque")]
    pub progressive: bool,
    /// First output of a walk-assist run (DAC codes).
    #[serde(alias = "v_salida_progresivo_ayuda_arranque")]
    pub start_value: u16,
    /// Steady walk-assist output (DAC codes).
    pub sustain_value: u16,
    #[serde(alias = "tiempo_ejecucion_progresivo_ayuda_arranque")]
    pub progressive_ms: u64,
    #[serde(alias = "retardo_ejecucion_progresivo_ayuda_arranque")]
    pub rearm_delay_ms: u64,
    pub max_output: u16,
    pub allow_full_output: bool,
}

impl Default for WalkAssistCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 600,
            progressive: true,
            start_value: 2800,
            sustain_value: 1800,
            progressive_ms: 1500,
            rearm_delay_ms: 500,
            max_output: 3000,
            allow_full_output: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CruiseCfg {
    #[serde(alias = "modo_crucero")]
    pub enabled: bool,
    /// Steady ticks needed to fix the cruise value (2 = continuous cruise).
    #[serde(alias = "pulsos_fijar_crucero")]
    pub fix_pulses: u16,
    /// Steady ticks needed to re-fix below the cruise value (0 = use `fix_pulses`).
    #[serde(alias = "pulsos_fijar_debajo_crucero")]
    pub fix_below_pulses: u16,
    /// Throttle stability window (output units, open interval).
    pub tolerance: u16,
    #[serde(alias = "liberar_crucero_con_freno")]
    pub release_with_brake: bool,
    #[serde(
        alias = "pulsos_liberar_crucero",
        alias = "pulsos_liberar_crucero_con_freno"
    )]
    pub brake_release_pulses: u16,
    #[serde(
        alias = "liberar_crucero_con_acelerador",
        alias = "liberar_crucero_con_acelerador_sin_pedaleo"
    )]
    pub release_with_throttle: bool,
    #[serde(alias = "tiempo_anula_crucero_acelerador")]
    pub throttle_release_ms: u64,
}

impl Default for CruiseCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            fix_pulses: 20,
            fix_below_pulses: 5,
            tolerance: 40,
            release_with_brake: true,
            brake_release_pulses: 36,
            release_with_throttle: true,
            throttle_release_ms: 150,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RampCfg {
    /// Seconds for a full-scale progressive ramp.
    #[serde(alias = "retardo_aceleracion")]
    pub accel_delay_s: u32,
    /// Idle pedaling seconds after which the next start is auto-progressive.
    #[serde(alias = "retardo_inicio_progresivo")]
    pub auto_progressive_delay_s: u32,
    /// 1 (gentlest) ..= 10 (near-immediate).
    #[serde(alias = "suavidad_progresivos")]
    pub smoothing: f32,
    /// 1 (gentlest) ..= 10 (near-immediate).
    #[serde(alias = "suavidad_autoprogresivos")]
    pub auto_smoothing: f32,
}

impl Default for RampCfg {
    fn default() -> Self {
        Self {
            accel_delay_s: 5,
            auto_progressive_delay_s: 10,
            smoothing: 5.0,
            auto_smoothing: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssistCfg {
    /// Cut motor output while not pedaling (walk assist excepted).
    pub require_pedaling: bool,
    /// Control tick period.
    pub tick_ms: u64,
}

impl Default for AssistCfg {
    fn default() -> Self {
        Self {
            require_pedaling: true,
            tick_ms: 140,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsoleCfg {
    #[serde(alias = "habilitar_consola")]
    pub enabled: bool,
    /// Lines buffered before the console starts dropping.
    pub capacity: usize,
}

impl Default for ConsoleCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub dac: DacCfg,
    pub buzzer: BuzzerCfg,
    pub throttle: ThrottleCfg,
    pub pedal: PedalCfg,
    pub walk_assist: WalkAssistCfg,
    pub cruise: CruiseCfg,
    pub ramp: RampCfg,
    pub assist: AssistCfg,
    pub console: ConsoleCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Full-scale code of a DAC with the given resolution.
#[inline]
pub fn full_scale(resolution_bits: u8) -> u16 {
    let bits = u32::from(resolution_bits.clamp(1, 16));
    u16::try_from((1u32 << bits) - 1).unwrap_or(u16::MAX)
}

/// One value changed by [`Config::sanitize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub field: &'static str,
    pub reason: &'static str,
    pub from: String,
    pub to: String,
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (was {}, using {})",
            self.field, self.reason, self.from, self.to
        )
    }
}

fn adjust<T>(
    out: &mut Vec<Adjustment>,
    slot: &mut T,
    to: T,
    field: &'static str,
    reason: &'static str,
) where
    T: PartialEq + fmt::Display,
{
    if *slot != to {
        out.push(Adjustment {
            field,
            reason,
            from: slot.to_string(),
            to: to.to_string(),
        });
        *slot = to;
    }
}

fn clamp_smoothing(v: f32) -> f32 {
    if v.is_finite() { v.clamp(1.0, 10.0) } else { 5.0 }
}

impl Config {
    /// Output full scale for the configured DAC.
    pub fn output_max(&self) -> u16 {
        full_scale(self.dac.resolution_bits)
    }

    /// Clamp every invariant violation to the nearest valid value.
    ///
    /// Returns the list of changes; an empty list means the config was already valid.
    pub fn sanitize(&mut self) -> Vec<Adjustment> {
        let mut out = Vec::new();

        // DAC
        if self.dac.address != 0 && !(0x08..=0x77).contains(&self.dac.address) {
            adjust(
                &mut out,
                &mut self.dac.address,
                0,
                "dac.address",
                "must be a 7-bit address in 0x08..=0x77 or 0 for auto-detect",
            );
        }
        let bits = self.dac.resolution_bits.clamp(8, 16);
        adjust(
            &mut out,
            &mut self.dac.resolution_bits,
            bits,
            "dac.resolution_bits",
            "must be in [8, 16]",
        );
        let out_max = self.output_max();

        // Throttle
        if self.throttle.adc_max == 0 {
            adjust(
                &mut out,
                &mut self.throttle.adc_max,
                ThrottleCfg::default().adc_max,
                "throttle.adc_max",
                "must be > 0",
            );
        }
        let adc_max = self.throttle.adc_max;
        if self.throttle.max_raw > adc_max {
            adjust(
                &mut out,
                &mut self.throttle.max_raw,
                adc_max,
                "throttle.max_raw",
                "must be <= throttle.adc_max",
            );
        }
        if self.throttle.min_raw >= self.throttle.max_raw {
            let d = ThrottleCfg::default();
            let (min, max) = if d.max_raw <= adc_max {
                (d.min_raw, d.max_raw)
            } else {
                (0, adc_max)
            };
            adjust(
                &mut out,
                &mut self.throttle.min_raw,
                min,
                "throttle.min_raw",
                "must be < throttle.max_raw",
            );
            adjust(
                &mut out,
                &mut self.throttle.max_raw,
                max,
                "throttle.max_raw",
                "must be > throttle.min_raw",
            );
        }
        let rest = self.throttle.rest_samples.max(1);
        adjust(
            &mut out,
            &mut self.throttle.rest_samples,
            rest,
            "throttle.rest_samples",
            "must be >= 1",
        );
        let travel = self.throttle.travel_samples.max(1);
        adjust(
            &mut out,
            &mut self.throttle.travel_samples,
            travel,
            "throttle.travel_samples",
            "must be >= 1",
        );
        let interval = self.throttle.sample_interval_ms.min(100);
        adjust(
            &mut out,
            &mut self.throttle.sample_interval_ms,
            interval,
            "throttle.sample_interval_ms",
            "must be <= 100",
        );
        let deadband = self.throttle.deadband.min(out_max / 2);
        adjust(
            &mut out,
            &mut self.throttle.deadband,
            deadband,
            "throttle.deadband",
            "must be <= half the output range",
        );

        // Pedal
        let edges = self.pedal.activation_edges.clamp(2, 4);
        adjust(
            &mut out,
            &mut self.pedal.activation_edges,
            edges,
            "pedal.activation_edges",
            "must be 2, 3 or 4",
        );
        let tol = self.pedal.pas_tolerance.min(10);
        adjust(
            &mut out,
            &mut self.pedal.pas_tolerance,
            tol,
            "pedal.pas_tolerance",
            "must be in [0, 10]",
        );
        let gap = self.pedal.base_gap_ms.clamp(10, 2000);
        adjust(
            &mut out,
            &mut self.pedal.base_gap_ms,
            gap,
            "pedal.base_gap_ms",
            "must be in [10, 2000]",
        );
        let magnets = self.pedal.magnets.max(1);
        adjust(
            &mut out,
            &mut self.pedal.magnets,
            magnets,
            "pedal.magnets",
            "must be >= 1",
        );

        // Walk assist
        let max_output = self.walk_assist.max_output.min(out_max);
        adjust(
            &mut out,
            &mut self.walk_assist.max_output,
            max_output,
            "walk_assist.max_output",
            "must be <= DAC full scale",
        );
        let ceiling = if self.walk_assist.allow_full_output {
            out_max
        } else {
            self.walk_assist.max_output
        };
        let sustain = self.walk_assist.sustain_value.min(ceiling);
        adjust(
            &mut out,
            &mut self.walk_assist.sustain_value,
            sustain,
            "walk_assist.sustain_value",
            "must be <= walk_assist.max_output",
        );
        let start = self.walk_assist.start_value.clamp(sustain, ceiling);
        adjust(
            &mut out,
            &mut self.walk_assist.start_value,
            start,
            "walk_assist.start_value",
            "must be in [walk_assist.sustain_value, walk_assist.max_output]",
        );

        // Cruise
        let fix = self.cruise.fix_pulses.max(1);
        adjust(
            &mut out,
            &mut self.cruise.fix_pulses,
            fix,
            "cruise.fix_pulses",
            "must be >= 1",
        );
        let release = self.cruise.brake_release_pulses.max(1);
        adjust(
            &mut out,
            &mut self.cruise.brake_release_pulses,
            release,
            "cruise.brake_release_pulses",
            "must be >= 1",
        );
        let ctol = self.cruise.tolerance.max(1);
        adjust(
            &mut out,
            &mut self.cruise.tolerance,
            ctol,
            "cruise.tolerance",
            "must be >= 1",
        );

        // Ramp
        let s = clamp_smoothing(self.ramp.smoothing);
        adjust(
            &mut out,
            &mut self.ramp.smoothing,
            s,
            "ramp.smoothing",
            "must be in [1, 10]",
        );
        let s = clamp_smoothing(self.ramp.auto_smoothing);
        adjust(
            &mut out,
            &mut self.ramp.auto_smoothing,
            s,
            "ramp.auto_smoothing",
            "must be in [1, 10]",
        );
        let accel = self.ramp.accel_delay_s.min(60);
        adjust(
            &mut out,
            &mut self.ramp.accel_delay_s,
            accel,
            "ramp.accel_delay_s",
            "must be <= 60",
        );
        let auto = self.ramp.auto_progressive_delay_s.min(3600);
        adjust(
            &mut out,
            &mut self.ramp.auto_progressive_delay_s,
            auto,
            "ramp.auto_progressive_delay_s",
            "must be <= 3600",
        );

        // Loop
        let tick = self.assist.tick_ms.clamp(1, 1000);
        adjust(
            &mut out,
            &mut self.assist.tick_ms,
            tick,
            "assist.tick_ms",
            "must be in [1, 1000]",
        );

        // Console
        let cap = self.console.capacity.max(1);
        adjust(
            &mut out,
            &mut self.console.capacity,
            cap,
            "console.capacity",
            "must be >= 1",
        );

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            let from = r.to_string();
            out.push(Adjustment {
                field: "logging.rotation",
                reason: "must be never, daily or hourly",
                from,
                to: "never".to_string(),
            });
            self.logging.rotation = Some("never".to_string());
        }

        out
    }

    /// Return a sanitized copy together with the adjustments applied.
    #[must_use]
    pub fn sanitized(mut self) -> (Self, Vec<Adjustment>) {
        let adjustments = self.sanitize();
        (self, adjustments)
    }

    /// Strict check: error on the first value `sanitize` would have to change.
    pub fn validate(&self) -> eyre::Result<()> {
        let (_, adjustments) = self.clone().sanitized();
        if let Some(first) = adjustments.first() {
            eyre::bail!("{} {} (got {})", first.field, first.reason, first.from);
        }
        Ok(())
    }
}

/// Scenario CSV schema for offline replays.
///
/// Expected headers:
/// t_ms,pedal_edges,throttle_raw,brake
///
/// Example:
/// t_ms,pedal_edges,throttle_raw,brake
/// 0,0,190,false
/// 140,1,600,false
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioRow {
    pub t_ms: u64,
    /// Edges since the previous row.
    pub pedal_edges: u32,
    pub throttle_raw: u16,
    pub brake: bool,
}

pub fn load_scenario_csv(path: &std::path::Path) -> eyre::Result<Vec<ScenarioRow>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open scenario CSV {:?}: {}", path, e))?;
    parse_scenario(rdr)
}

/// Parse a scenario from any reader (headers required).
pub fn parse_scenario_reader<R: std::io::Read>(reader: R) -> eyre::Result<Vec<ScenarioRow>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    parse_scenario(rdr)
}

fn parse_scenario<R: std::io::Read>(mut rdr: csv::Reader<R>) -> eyre::Result<Vec<ScenarioRow>> {
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read scenario headers: {}", e))?
        .clone();
    let expected = ["t_ms", "pedal_edges", "throttle_raw", "brake"];
    let actual: Vec<String> = headers.iter().map(ToString::to_string).collect();
    if actual != expected {
        eyre::bail!(
            "scenario CSV must have headers 't_ms,pedal_edges,throttle_raw,brake', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<ScenarioRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<ScenarioRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid scenario row {}: {}", idx + 2, e))?;
        if let Some(prev) = rows.last()
            && row.t_ms < prev.t_ms
        {
            eyre::bail!(
                "scenario rows must be ordered by t_ms (row {} goes back from {} to {})",
                idx + 2,
                prev.t_ms,
                row.t_ms
            );
        }
        rows.push(row);
    }
    if rows.is_empty() {
        eyre::bail!("scenario CSV has no rows");
    }
    Ok(rows)
}
