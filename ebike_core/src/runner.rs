use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ebike_traits::{AssistSensors, Dac};

use crate::core::AssistCore;
use crate::status::{Source, TickReport};

/// Summary of a paced run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    /// Ticks that finished after their deadline.
    pub overruns: u64,
    pub dac_errors: u64,
    pub peak_output: u16,
    pub cruise_ticks: u64,
    pub walk_assist_ticks: u64,
}

impl RunStats {
    /// Fold one tick into the totals.
    pub fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        if !report.dac_ok {
            self.dac_errors += 1;
        }
        self.peak_output = self.peak_output.max(report.output);
        match report.source {
            Source::Cruise => self.cruise_ticks += 1,
            Source::WalkAssist => self.walk_assist_ticks += 1,
            _ => {}
        }
    }
}

/// Call `tick()` every `tick_ms` on the controller's clock until `shutdown` is set or
/// `max_ticks` ticks have run.
///
/// Deadlines are absolute, so a slow tick shortens the following sleep; a tick that
/// overruns its deadline restarts the schedule from now.
pub fn run<S, D, F>(
    core: &mut AssistCore<S, D>,
    shutdown: &AtomicBool,
    max_ticks: Option<u64>,
    mut on_tick: F,
) -> RunStats
where
    S: AssistSensors,
    D: Dac,
    F: FnMut(&TickReport),
{
    let clock = core.clock();
    let period = Duration::from_millis(core.config().output.tick_ms.max(1));
    let mut stats = RunStats::default();
    let mut deadline = clock.now();
    tracing::info!(
        tick_ms = crate::util::millis_u64(period),
        hz = crate::util::tick_hz(core.config().output.tick_ms),
        ?max_ticks,
        "assist loop start"
    );

    loop {
        if shutdown.load(Ordering::Acquire) {
            tracing::info!("shutdown requested");
            break;
        }
        if let Some(max) = max_ticks
            && stats.ticks >= max
        {
            break;
        }

        let report = core.tick();
        stats.record(&report);
        on_tick(&report);

        deadline += period;
        let now = clock.now();
        if now < deadline {
            clock.sleep(deadline - now);
        } else {
            stats.overruns += 1;
            tracing::debug!(
                late_ms = crate::util::millis_u64(now - deadline),
                "tick overran"
            );
            deadline = now;
        }
    }

    tracing::info!(
        ticks = stats.ticks,
        overruns = stats.overruns,
        dac_errors = stats.dac_errors,
        "assist loop stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_assist;
    use crate::config::AssistConfig;
    use crate::mocks::{RecordingDac, ScriptedSensors};
    use ebike_traits::ManualClock;

    #[test]
    fn stops_after_max_ticks_on_exact_schedule() {
        let clock = ManualClock::new();
        let dac = RecordingDac::new();
        let mut core = build_assist(
            ScriptedSensors::new(),
            dac.clone(),
            AssistConfig::default(),
            Some(Box::new(clock.clone())),
            None,
            None,
        )
        .unwrap();
        let shutdown = AtomicBool::new(false);
        let mut seen = Vec::new();
        let stats = run(&mut core, &shutdown, Some(5), |r| seen.push(r.timestamp_ms));
        assert_eq!(stats.ticks, 5);
        assert_eq!(stats.overruns, 0);
        assert_eq!(seen, vec![0, 140, 280, 420, 560]);
        assert_eq!(dac.writes().len(), 5);
    }

    #[test]
    fn shutdown_flag_stops_before_first_tick() {
        let mut core = build_assist(
            ScriptedSensors::new(),
            RecordingDac::new(),
            AssistConfig::default(),
            Some(Box::new(ManualClock::new())),
            None,
            None,
        )
        .unwrap();
        let shutdown = AtomicBool::new(true);
        let stats = run(&mut core, &shutdown, None, |_| {});
        assert_eq!(stats.ticks, 0);
    }
}
