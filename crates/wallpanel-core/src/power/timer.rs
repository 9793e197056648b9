// wallpanel — turn a spare screen into a presence-aware wall display

//! Inactivity timer: a cancellable one-shot that asks the controller to put
//! the display to sleep after a quiet period.

use super::controller::PowerCommand;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Single-shot rearming timer.
///
/// Each rearm cancels the previous schedule. The generation counter is the
/// hard guarantee: a firing that raced its own cancellation carries a stale
/// generation and is ignored by the controller, so aborting the sleep task
/// never needs to be exact.
pub(crate) struct InactivityTimer {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl InactivityTimer {
    pub(crate) fn new() -> Self {
        Self {
            generation: 0,
            task: None,
        }
    }

    /// Cancel any pending firing and schedule a new one after `delay`.
    pub(crate) fn rearm(&mut self, delay: Duration, tx: &mpsc::Sender<PowerCommand>) {
        self.cancel();
        let generation = self.generation;
        let tx = tx.clone();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(PowerCommand::InactivityElapsed(generation)).await;
        }));
    }

    /// Cancel any pending firing.
    pub(crate) fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a firing with this generation is the one currently scheduled.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}
