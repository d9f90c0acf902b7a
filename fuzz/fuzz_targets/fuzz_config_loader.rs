#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors are fine; panics are not.
    let Ok(cfg) = toml::from_str::<ebike_config::Config>(data) else {
        return;
    };
    let _ = cfg.validate();
    // Sanitizing must always land on a config that validates and stays put.
    let (clean, _) = cfg.sanitized();
    assert!(clean.validate().is_ok(), "sanitized config still invalid: {clean:?}");
    let (again, adjustments) = clean.clone().sanitized();
    assert!(adjustments.is_empty());
    assert_eq!(again, clean);
});
