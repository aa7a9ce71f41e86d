//! One-second tick source on the tokio runtime.
//!
//! Each tick is one second of study time, so the period is not
//! configurable.
//!
//! At most one tick task is alive per `Ticker`. Starting a ticker that is
//! already running does nothing, so a doubled `start` can never produce a
//! double-speed cadence.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the tick task. The first tick fires one second after start.
    ///
    /// Returns `false` without spawning if a tick task is already live.
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, mut on_tick: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        if self.is_running() {
            return false;
        }
        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                on_tick();
            }
        }));
        true
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
