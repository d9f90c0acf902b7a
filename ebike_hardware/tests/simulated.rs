use std::time::{Duration, Instant};

use ebike_hardware::{PasGenerator, SimInputs, SimulatedDac, SimulatedSensors};
use ebike_traits::{AssistSensors, Dac};

#[test]
fn pas_generator_feeds_the_edge_counter() {
    let inputs = SimInputs::new();
    let sensors = SimulatedSensors::new(inputs.clone());
    // 60 rpm with 12 magnets: one edge every 83 ms
    let pas = PasGenerator::spawn(inputs.pulses().clone(), 60, 12)
        .unwrap()
        .expect("generator");
    let deadline = Instant::now() + Duration::from_secs(2);
    while sensors.pedal_edge_count() < 3 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    drop(pas);
    let stopped_at = sensors.pedal_edge_count();
    assert!(stopped_at >= 3, "only {stopped_at} edges");
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(sensors.pedal_edge_count(), stopped_at);
}

#[test]
fn zero_cadence_spawns_nothing() {
    let inputs = SimInputs::new();
    assert!(PasGenerator::spawn(inputs.pulses().clone(), 0, 12).unwrap().is_none());
}

#[test]
fn failing_dac_keeps_last_code() {
    let mut dac = SimulatedDac::default();
    let probe = dac.clone();
    dac.set_address(0x60);
    dac.write_output(1200).unwrap();
    probe.set_failing(true);
    assert!(dac.write_output(3000).is_err());
    assert_eq!(probe.last(), 1200);
    assert_eq!(probe.writes(), 1);
    assert_eq!(probe.selected_address(), 0x60);
}
