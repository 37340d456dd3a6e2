//! Periodic state-sync timer

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Repeating timer running on the controller's runtime
///
/// Ticks every `period` until the callback returns `false`, the timer is
/// stopped, or it is dropped. The first tick comes one period after start.
pub(crate) struct PollTimer {
    handle: JoinHandle<()>,
}

impl PollTimer {
    pub(crate) fn start<F>(runtime: &Handle, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !tick() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub(crate) fn stop(self) {
        self.handle.abort();
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
