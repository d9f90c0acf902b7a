//! The shipped presets reproduce the firmware's deployment variants.
use ebike_config::load_toml;

const SAMPLE: &str = include_str!("../../etc/ebike.toml");
const TIMED: &str = include_str!("../../etc/presets/timed_cruise.toml");
const CONTINUOUS: &str = include_str!("../../etc/presets/continuous_cruise.toml");
const NO_CRUISE: &str = include_str!("../../etc/presets/no_cruise.toml");

#[test]
fn sample_config_is_valid_and_matches_defaults() {
    let cfg = load_toml(SAMPLE).expect("sample parses");
    cfg.validate().expect("sample is valid");
    assert_eq!(cfg.cruise, ebike_config::CruiseCfg::default());
    assert_eq!(cfg.walk_assist, ebike_config::WalkAssistCfg::default());
}

#[test]
fn timed_preset_uses_original_key_names() {
    let cfg = load_toml(TIMED).expect("timed preset parses");
    cfg.validate().expect("timed preset is valid");
    assert!(cfg.cruise.enabled);
    assert_eq!(cfg.cruise.fix_pulses, 20);
    assert_eq!(cfg.cruise.fix_below_pulses, 5);
    assert_eq!(cfg.cruise.brake_release_pulses, 36);
    assert_eq!(cfg.cruise.throttle_release_ms, 150);
    assert_eq!(cfg.pedal.activation_edges, 3);
    assert_eq!(cfg.walk_assist.delay_ms, 600);
    assert!(cfg.walk_assist.progressive);
}

#[test]
fn continuous_preset_fixes_every_other_tick() {
    let cfg = load_toml(CONTINUOUS).expect("continuous preset parses");
    cfg.validate().expect("continuous preset is valid");
    assert_eq!(cfg.cruise.fix_pulses, 2);
    assert_eq!(cfg.cruise.fix_below_pulses, 0);
    assert_eq!(cfg.cruise.brake_release_pulses, 23);
    assert_eq!(cfg.dac.address, 0x60);
    assert!(!cfg.walk_assist.progressive);
}

#[test]
fn no_cruise_preset_disables_latching_and_walk_assist() {
    let cfg = load_toml(NO_CRUISE).expect("no-cruise preset parses");
    cfg.validate().expect("no-cruise preset is valid");
    assert!(!cfg.cruise.enabled);
    assert!(!cfg.cruise.release_with_throttle);
    assert!(!cfg.walk_assist.enabled);
}
