//! Console diagnostic stream.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError};

pub trait Console {
    fn line(&self, line: &str);
}

/// Forwards lines to `tracing` under the `ebike::console` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn line(&self, line: &str) {
        tracing::info!(target: "ebike::console", "{line}");
    }
}

/// Bounded, non-blocking console; lines are dropped when the reader falls behind.
pub struct ChannelConsole {
    tx: Sender<String>,
    dropped: AtomicU64,
}

impl ChannelConsole {
    pub fn bounded(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Lines lost to a full or disconnected channel.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Console for ChannelConsole {
    fn line(&self, line: &str) {
        match self.tx.try_send(line.to_owned()) {
            Ok(()) => {}
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
