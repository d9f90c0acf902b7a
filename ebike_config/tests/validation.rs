use ebike_config::{Config, load_toml};
use rstest::rstest;

#[rstest]
#[case("[pedal]\nactivation_edges = 7", "pedal.activation_edges")]
#[case("[pedal]\nactivation_edges = 1", "pedal.activation_edges")]
#[case("[ramp]\nsmoothing = 0", "ramp.smoothing")]
#[case("[ramp]\nauto_smoothing = 12.5", "ramp.auto_smoothing")]
#[case("[throttle]\nmin_raw = 900\nmax_raw = 300", "throttle.min_raw")]
#[case("[cruise]\nfix_pulses = 0", "cruise.fix_pulses")]
#[case("[cruise]\nbrake_release_pulses = 0", "cruise.brake_release_pulses")]
#[case("[assist]\ntick_ms = 0", "assist.tick_ms")]
#[case("[dac]\naddress = 0x80", "dac.address")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation")]
fn validate_names_the_offending_field(#[case] toml: &str, #[case] field: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(field),
        "error `{err}` should mention {field}"
    );
}

#[test]
fn sanitize_clamps_to_nearest_valid_value() {
    let mut cfg = load_toml(
        r#"
[pedal]
activation_edges = 9
pas_tolerance = 50

[ramp]
smoothing = -3
auto_smoothing = 40
"#,
    )
    .expect("parse TOML");

    let adjustments = cfg.sanitize();
    assert_eq!(cfg.pedal.activation_edges, 4);
    assert_eq!(cfg.pedal.pas_tolerance, 10);
    assert_eq!(cfg.ramp.smoothing, 1.0);
    assert_eq!(cfg.ramp.auto_smoothing, 10.0);
    assert_eq!(adjustments.len(), 4);
    cfg.validate().expect("sanitized config is valid");
}

#[test]
fn degenerate_throttle_range_falls_back_to_defaults() {
    let mut cfg = load_toml("[throttle]\nmin_raw = 500\nmax_raw = 500").expect("parse TOML");
    cfg.sanitize();
    assert!(cfg.throttle.min_raw < cfg.throttle.max_raw);
    assert_eq!(cfg.throttle.min_raw, 190);
    assert_eq!(cfg.throttle.max_raw, 850);
}

#[test]
fn walk_assist_values_stay_under_the_ceiling() {
    let mut cfg = load_toml(
        r#"
[walk_assist]
start_value = 4000
sustain_value = 3500
max_output = 3000
"#,
    )
    .expect("parse TOML");
    cfg.sanitize();
    assert_eq!(cfg.walk_assist.sustain_value, 3000);
    assert_eq!(cfg.walk_assist.start_value, 3000);

    let mut full = load_toml(
        r#"
[walk_assist]
start_value = 4000
sustain_value = 3500
allow_full_output = true
"#,
    )
    .expect("parse TOML");
    full.sanitize();
    assert_eq!(full.walk_assist.start_value, 4000);
}

#[test]
fn start_value_is_raised_to_sustain_value() {
    let mut cfg =
        load_toml("[walk_assist]\nstart_value = 1000\nsustain_value = 1800").expect("parse TOML");
    cfg.sanitize();
    assert_eq!(cfg.walk_assist.start_value, 1800);
}

#[test]
fn default_config_is_valid() {
    Config::default().validate().expect("defaults must be valid");
    assert_eq!(Config::default().output_max(), 4095);
}

#[test]
fn mistyped_value_is_a_parse_error() {
    assert!(load_toml("[cruise]\nfix_pulses = \"many\"").is_err());
}
