//! Async shell around [`StudySessionMachine`].
//!
//! The controller owns the single tick source and talks to the session API.
//! The machine lives behind a `std::sync::Mutex` that is never held across
//! an `.await`; tick callbacks and lifecycle handlers take the same lock, so
//! a backgrounding reset and an in-flight tick cannot interleave.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::machine::{
    CancelReason, SessionConfig, SessionOutcome, SessionStatus, StudySession, StudySessionMachine,
};
use crate::error::{Result, SessionError};
use crate::events::Event;
use crate::ports::{CreateSessionRequest, FinishSessionRequest, SessionApi};
use crate::reward::RewardCalculator;
use crate::timer::Ticker;

pub struct StudyController {
    machine: Arc<Mutex<StudySessionMachine>>,
    ticker: Mutex<Ticker>,
    api: Arc<dyn SessionApi>,
    rewards: RewardCalculator,
    events: broadcast::Sender<Event>,
}

impl StudyController {
    pub fn new(api: Arc<dyn SessionApi>, rewards: RewardCalculator, ticker: Ticker) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            machine: Arc::new(Mutex::new(StudySessionMachine::new())),
            ticker: Mutex::new(ticker),
            api,
            rewards,
            events,
        }
    }

    /// Subscribe to session events (UI re-render hook).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status()
    }

    pub fn session(&self) -> Option<StudySession> {
        self.lock().session().cloned()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.lock().elapsed_secs()
    }

    pub fn is_ticking(&self) -> bool {
        lock_ticker(&self.ticker).is_running()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Create the session on the backend and start the timer.
    ///
    /// On API failure the machine is rolled back to `Idle` and the error
    /// is returned. If the app was backgrounded while the create call was
    /// in flight, returns `SessionError::Interrupted`.
    pub async fn start(&self, config: SessionConfig) -> Result<StudySession> {
        let session_id = {
            let mut machine = self.lock();
            let event = machine.begin_start(&config)?;
            self.emit(event);
            machine
                .session()
                .map(|s| s.id)
                .ok_or(SessionError::Interrupted)?
        };

        let request = CreateSessionRequest {
            deck_category: config.deck_category.clone(),
            deck_math_topic: config.deck_math_topic.clone(),
            session_goal_minutes: config.goal_minutes,
        };
        let created = self.api.create_session(&request).await;

        let mut machine = self.lock();
        match created {
            Ok(remote_id) => {
                let (event, generation) = machine.confirm_start(session_id, remote_id.clone())
                    .inspect_err(|_| {
                        warn!(%session_id, %remote_id, "session interrupted while being created");
                    })?;
                self.start_ticking(generation);
                info!(
                    %session_id,
                    %remote_id,
                    category = %config.deck_category,
                    goal_minutes = config.goal_minutes,
                    "study session started"
                );
                self.emit(event);
                machine
                    .session()
                    .cloned()
                    .ok_or_else(|| SessionError::Interrupted.into())
            }
            Err(e) => {
                warn!(%session_id, error = %e, "create session failed; rolled back");
                if let Some(event) = machine.abort_start(session_id) {
                    self.emit(event);
                }
                Err(e.into())
            }
        }
    }

    pub fn record_card_studied(&self) -> Result<u32> {
        let mut machine = self.lock();
        let event = machine.record_card_studied()?;
        let cards = machine.session().map(|s| s.cards_studied).unwrap_or(0);
        self.emit(event);
        Ok(cards)
    }

    pub fn pause(&self) -> Result<()> {
        let mut machine = self.lock();
        let event = machine.pause()?;
        self.stop_ticking();
        self.emit(event);
        Ok(())
    }

    pub fn resume(&self) -> Result<()> {
        let mut machine = self.lock();
        let (event, generation) = machine.resume()?;
        self.start_ticking(generation);
        self.emit(event);
        Ok(())
    }

    /// Compute the reward and commit the session.
    ///
    /// On API failure the session returns to its pre-finish status (and
    /// resumes ticking if it was active) and the error is returned.
    pub async fn finish(&self, notes: Option<String>) -> Result<SessionOutcome> {
        let ticket = {
            let mut machine = self.lock();
            let (ticket, event) = machine.begin_finish()?;
            self.stop_ticking();
            self.emit(event);
            ticket
        };

        let reward = self.rewards.compute(
            ticket.elapsed_seconds,
            ticket.cards_studied,
            ticket.goal_minutes,
        );
        let request = FinishSessionRequest {
            cards_studied: ticket.cards_studied,
            duration: ticket.elapsed_seconds,
            notes,
            rewards: reward,
        };
        let committed = self.api.finish_session(&ticket.remote_id, &request).await;

        let mut machine = self.lock();
        match committed {
            Ok(server) => {
                let outcome = SessionOutcome {
                    session_id: ticket.session_id,
                    remote_id: ticket.remote_id.clone(),
                    elapsed_seconds: ticket.elapsed_seconds,
                    cards_studied: ticket.cards_studied,
                    reward,
                    server,
                };
                let event = machine.complete_finish(ticket.session_id, outcome.clone())?;
                info!(
                    session_id = %ticket.session_id,
                    elapsed_secs = ticket.elapsed_seconds,
                    cards = ticket.cards_studied,
                    xavicoins = reward.xavicoins,
                    "study session finished"
                );
                self.emit(event);
                Ok(outcome)
            }
            Err(e) => {
                warn!(session_id = %ticket.session_id, error = %e, "finish session failed; rolled back");
                if let Some((event, generation)) = machine.abort_finish(ticket.session_id) {
                    if let Some(generation) = generation {
                        self.start_ticking(generation);
                    }
                    self.emit(event);
                }
                Err(e.into())
            }
        }
    }

    /// User-initiated abandonment; nothing is committed.
    pub fn cancel(&self) -> Result<()> {
        let mut machine = self.lock();
        let event = machine.cancel(CancelReason::User)?;
        self.stop_ticking();
        info!("study session cancelled by user");
        self.emit(event);
        Ok(())
    }

    /// Clear a finished or cancelled session after its result was read.
    pub fn dismiss(&self) -> Result<StudySession> {
        let mut machine = self.lock();
        let session = machine.dismiss()?;
        self.emit(Event::SessionCleared {
            session_id: session.id,
        });
        Ok(session)
    }

    /// Navigation away from the study screen.
    pub fn leave(&self) {
        let mut machine = self.lock();
        let events = machine.leave();
        if machine.status() != SessionStatus::Finishing {
            self.stop_ticking();
        }
        for event in events {
            self.emit(event);
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    pub fn on_app_backgrounded(&self) {
        let mut machine = self.lock();
        if let Some(event) = machine.on_app_backgrounded() {
            self.stop_ticking();
            info!("study session cancelled: app left the foreground");
            self.emit(event);
        }
    }

    pub fn on_app_foregrounded(&self) {
        let mut machine = self.lock();
        if let Some(event) = machine.on_app_foregrounded() {
            debug!("surfacing inactivity prompt");
            self.emit(event);
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, StudySessionMachine> {
        self.machine.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Callers hold the machine lock, so ordering is machine then ticker.
    ///
    /// The machine only hands out a generation on a stopped -> running
    /// transition, so any source still alive here is stale and replaced.
    fn start_ticking(&self, generation: u64) {
        let machine = Arc::clone(&self.machine);
        let events = self.events.clone();
        let mut ticker = lock_ticker(&self.ticker);
        ticker.stop();
        ticker.start(move || {
            let mut machine = machine.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(event) = machine.tick(generation) {
                let _ = events.send(event);
            }
        });
    }

    fn stop_ticking(&self) {
        lock_ticker(&self.ticker).stop();
    }
}

fn lock_ticker(ticker: &Mutex<Ticker>) -> MutexGuard<'_, Ticker> {
    ticker.lock().unwrap_or_else(|e| e.into_inner())
}
