//! Human-readable error descriptions and structured JSON error formatting.

use ebike_core::error::{AssistError, BuildError};
use ebike_hardware::error::HwError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensors => {
                "What happened: No sensors were provided to the assist engine.\nLikely causes: The sensor backend failed to initialize.\nHow to fix: Check the backend selection and wiring, then rerun.".to_string()
            }
            BuildError::MissingDac => {
                "What happened: No DAC was provided to the assist engine.\nLikely causes: The I2C bus could not be opened.\nHow to fix: Enable I2C and check the DAC wiring, then rerun.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Run `ebike check-config` and edit the reported keys."
            ),
        };
    }

    if let Some(ae) = err.downcast_ref::<AssistError>() {
        return match ae {
            AssistError::Timeout => "What happened: A bus transfer timed out.\nLikely causes: Loose I2C wiring or a missing pull-up.\nHow to fix: Check SDA/SCL, power and ground to the ADC and DAC.".to_string(),
            AssistError::Hardware(m) | AssistError::HardwareFault(m) => format!(
                "What happened: Hardware fault ({m}).\nLikely causes: DAC not present at the configured address or not powered.\nHow to fix: Set [dac] address = 0 to scan 0x60..0x67 and check the wiring."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(he) = err.downcast_ref::<HwError>() {
        return format!(
            "What happened: Hardware initialization failed ({he}).\nLikely causes: Wrong pin numbers, I2C disabled, or missing GPIO permissions.\nHow to fix: Enable I2C, check the wiring, and run with access to /dev/gpiomem and /dev/i2c-*."
        );
    }

    if err.downcast_ref::<toml::de::Error>().is_some() {
        return format!(
            "What happened: The config file could not be parsed.\nLikely causes: A TOML syntax error or a value of the wrong type.\nHow to fix: Fix the file and rerun. Details: {}",
            root_cause(err)
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = format!("{err:#}").to_ascii_lowercase();

    if lower.contains("failed to read config") {
        return format!(
            "What happened: {msg}.\nLikely causes: Wrong --config path or missing file.\nHow to fix: Pass --config pointing at a TOML file (see etc/ebike.toml)."
        );
    }

    if lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid ({}).\nLikely causes: Out-of-range values.\nHow to fix: Run `ebike check-config` and edit the reported keys.",
            root_cause(err)
        );
    }

    if lower.contains("scenario csv must have headers") {
        return "Invalid headers in scenario CSV. Expected 't_ms,pedal_edges,throttle_raw,brake'.".to_string();
    }

    if lower.contains("scenario") {
        return format!("Scenario could not be replayed: {}", root_cause(err));
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn root_cause(err: &eyre::Report) -> String {
    err.root_cause().to_string()
}

/// Stable exit codes: 3 configuration, 4 hardware, 5 scenario input, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<toml::de::Error>().is_some() {
        return 3;
    }
    if let Some(BuildError::InvalidConfig(_)) = err.downcast_ref::<BuildError>() {
        return 3;
    }
    match err.downcast_ref::<AssistError>() {
        Some(AssistError::Config(_)) => return 3,
        Some(AssistError::Hardware(_) | AssistError::HardwareFault(_) | AssistError::Timeout) => {
            return 4;
        }
        _ => {}
    }
    if err.downcast_ref::<HwError>().is_some() {
        return 4;
    }
    let lower = format!("{err:#}").to_ascii_lowercase();
    if lower.contains("invalid configuration") || lower.contains("failed to read config") {
        return 3;
    }
    if lower.contains("scenario") {
        return 5;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    let reason = match exit_code_for_error(err) {
        3 => "Config",
        4 => "Hardware",
        5 => "Scenario",
        _ => "Error",
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn hardware_faults_map_to_exit_code_4() {
        let err = eyre::Report::new(AssistError::HardwareFault("nack".into()));
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(humanize(&err).contains("Hardware fault (nack)"));
    }

    #[test]
    fn toml_errors_survive_context() {
        let err = toml::from_str::<ebike_config::Config>("[pedal]\nmagnets = \"x\"")
            .wrap_err("invalid configuration in cfg.toml")
            .unwrap_err();
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("could not be parsed"));
    }

    #[test]
    fn json_error_carries_reason() {
        let err = eyre::eyre!("scenario rows must be ordered by t_ms");
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Scenario");
    }
}
