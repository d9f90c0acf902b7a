//! Beep patterns for the audible cues.

use ebike_traits::Cue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beep {
    pub on_ms: u16,
    pub off_ms: u16,
}

const fn beep(on_ms: u16, off_ms: u16) -> Beep {
    Beep { on_ms, off_ms }
}

const BOOT: &[Beep] = &[beep(200, 0)];
const CRUISE_FIXED: &[Beep] = &[beep(60, 60), beep(60, 0)];
const CRUISE_RELEASED: &[Beep] = &[beep(150, 0)];
const WALK_ASSIST: &[Beep] = &[beep(40, 40), beep(40, 40), beep(40, 0)];

pub fn pattern(cue: Cue) -> &'static [Beep] {
    match cue {
        Cue::Boot => BOOT,
        Cue::CruiseFixed => CRUISE_FIXED,
        Cue::CruiseReleased => CRUISE_RELEASED,
        Cue::WalkAssist => WALK_ASSIST,
    }
}

/// Total time a pattern keeps the buzzer busy.
pub fn pattern_ms(cue: Cue) -> u32 {
    pattern(cue)
        .iter()
        .map(|b| u32::from(b.on_ms) + u32::from(b.off_ms))
        .sum()
}

#[cfg(feature = "hardware")]
pub use device::GpioBuzzer;

#[cfg(feature = "hardware")]
mod device {
    use std::sync::mpsc::{SyncSender, TrySendError, sync_channel};
    use std::thread;
    use std::time::Duration;

    use ebike_traits::{Buzzer, Cue};
    use rppal::gpio::Gpio;

    use super::pattern;
    use crate::error::{HwError, Result};

    /// Active buzzer on a GPIO pin. Patterns play on a worker thread so `play` never blocks.
    pub struct GpioBuzzer {
        tx: SyncSender<Cue>,
    }

    impl GpioBuzzer {
        pub fn new(pin: u8) -> Result<Self> {
            let mut out = Gpio::new()
                .and_then(|g| g.get(pin))
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output_low();
            let (tx, rx) = sync_channel::<Cue>(4);
            thread::Builder::new()
                .name("buzzer".into())
                .spawn(move || {
                    for cue in rx {
                        for b in pattern(cue) {
                            out.set_high();
                            thread::sleep(Duration::from_millis(u64::from(b.on_ms)));
                            out.set_low();
                            thread::sleep(Duration::from_millis(u64::from(b.off_ms)));
                        }
                    }
                })?;
            Ok(Self { tx })
        }
    }

    impl Buzzer for GpioBuzzer {
        fn play(&mut self, cue: Cue) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            match self.tx.try_send(cue) {
                Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
                Err(TrySendError::Disconnected(_)) => {
                    Err(Box::new(HwError::Gpio("buzzer worker stopped".into())))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cue_is_audible_and_distinct() {
        let cues = [Cue::Boot, Cue::CruiseFixed, Cue::CruiseReleased, Cue::WalkAssist];
        for (i, a) in cues.iter().enumerate() {
            assert!(pattern(*a).iter().all(|b| b.on_ms > 0));
            for b in &cues[i + 1..] {
                assert_ne!(pattern(*a), pattern(*b));
            }
        }
        assert_eq!(pattern_ms(Cue::CruiseFixed), 180);
    }

    #[test]
    fn patterns_are_static() {
        let a: &'static [Beep] = pattern(Cue::WalkAssist);
        assert_eq!(a.len(), 3);
        assert_eq!(pattern_ms(Cue::Boot), 200);
        assert_eq!(pattern_ms(Cue::WalkAssist), 200);
    }
}
