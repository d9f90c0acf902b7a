use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use ebike_core::mocks::{RecordingDac, ScriptedSensors};
use ebike_core::{AssistConfig, SensorSample, build_assist};
use ebike_traits::ManualClock;

// Synthetic ride: pedaling with a slowly wandering throttle and occasional brake taps.
fn synth_ride(n: usize, seed: u32) -> Vec<SensorSample> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    let mut throttle: i32 = 400;
    (0..n)
        .map(|i| {
            throttle = (throttle + (next() % 21) as i32 - 10).clamp(190, 850);
            SensorSample {
                pedal_edges: u32::from(i % 3 != 0),
                throttle_raw: throttle as u16,
                brake_active: next() % 97 == 0,
                timestamp_ms: i as u64 * 140,
            }
        })
        .collect()
}

pub fn bench_tick(c: &mut Criterion) {
    let mut g = c.benchmark_group("tick");
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p ebike_core --bench tick
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let ride = synth_ride(10_000, 0xB1CE);

    for &fix_pulses in &[2u16, 20] {
        g.bench_function(format!("ride_fix_{fix_pulses}"), |b| {
            b.iter_batched(
                || {
                    let mut cfg = AssistConfig::default();
                    cfg.cruise.fix_pulses = fix_pulses;
                    build_assist(
                        ScriptedSensors::new(),
                        RecordingDac::new(),
                        cfg,
                        Some(Box::new(ManualClock::new())),
                        None,
                        None,
                    )
                    .unwrap()
                },
                |mut core| {
                    for s in &ride {
                        black_box(core.tick_with(black_box(*s)));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(tick, bench_tick);
criterion_main!(tick);
