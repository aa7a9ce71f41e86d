//! Session timer implementation.
//!
//! The session timer is a tick-counting state machine. It does not own a
//! thread or a task - the [`Ticker`](super::Ticker) (or a test) is responsible
//! for calling `tick()` once per second while the session is foregrounded.
//!
//! ## Generations
//!
//! Every `start`, `pause` and `reset` bumps a generation counter. A tick
//! source captures the generation it was started with, and `tick()` drops
//! any tick whose generation no longer matches. A tick that was already in
//! flight when the timer was paused or reset therefore cannot move
//! `elapsed_secs`.
//!
//! ```text
//! Stopped --start--> Running --pause--> Stopped (elapsed kept)
//!                    Running --reset--> Stopped (elapsed = 0)
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimer {
    elapsed_secs: u64,
    running: bool,
    generation: u64,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting. Returns the generation a tick source must present,
    /// or `None` if the timer is already running.
    pub fn start(&mut self) -> Option<u64> {
        if self.running {
            return None;
        }
        self.running = true;
        self.generation += 1;
        Some(self.generation)
    }

    /// Stop counting, keeping the elapsed time.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.generation += 1;
        true
    }

    /// Stop counting and zero the elapsed time.
    pub fn reset(&mut self) {
        self.running = false;
        self.elapsed_secs = 0;
        self.generation += 1;
    }

    /// Apply one tick from the source started at `generation`.
    ///
    /// Returns the new elapsed seconds, or `None` if the tick was stale.
    pub fn tick(&mut self, generation: u64) -> Option<u64> {
        if !self.running || generation != self.generation {
            return None;
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        Some(self.elapsed_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn start_pause_resume() {
        let mut timer = SessionTimer::new();
        assert!(!timer.is_running());

        let gen = timer.start().unwrap();
        assert!(timer.is_running());
        timer.tick(gen);
        timer.tick(gen);

        assert!(timer.pause());
        assert_eq!(timer.elapsed_secs(), 2);

        let gen = timer.start().unwrap();
        timer.tick(gen);
        assert_eq!(timer.elapsed_secs(), 3);
    }

    #[test]
    fn start_twice_is_noop() {
        let mut timer = SessionTimer::new();
        let gen = timer.start().unwrap();
        assert!(timer.start().is_none());
        assert_eq!(timer.generation(), gen);
    }

    #[test]
    fn reset_zeroes_elapsed() {
        let mut timer = SessionTimer::new();
        let gen = timer.start().unwrap();
        for _ in 0..10 {
            timer.tick(gen);
        }
        timer.reset();
        assert_eq!(timer.elapsed_secs(), 0);
        assert!(!timer.is_running());
    }

    #[test]
    fn stale_tick_after_reset_is_dropped() {
        let mut timer = SessionTimer::new();
        let gen = timer.start().unwrap();
        timer.tick(gen);
        timer.reset();
        assert_eq!(timer.tick(gen), None);
        assert_eq!(timer.elapsed_secs(), 0);

        // Restarting hands out a fresh generation; the old one stays dead.
        let fresh = timer.start().unwrap();
        assert_ne!(fresh, gen);
        assert_eq!(timer.tick(gen), None);
        assert_eq!(timer.tick(fresh), Some(1));
    }

    #[test]
    fn tick_while_paused_is_dropped() {
        let mut timer = SessionTimer::new();
        let gen = timer.start().unwrap();
        timer.pause();
        assert_eq!(timer.tick(gen), None);
        assert_eq!(timer.elapsed_secs(), 0);
    }

    proptest! {
        #[test]
        fn elapsed_equals_tick_count(ticks in 0u64..5_000) {
            let mut timer = SessionTimer::new();
            let gen = timer.start().unwrap();
            for _ in 0..ticks {
                timer.tick(gen);
            }
            prop_assert_eq!(timer.elapsed_secs(), ticks);
        }
    }
}
