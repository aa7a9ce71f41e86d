//! Study session state machine.
//!
//! Pure and synchronous: external calls are split into `begin_*` /
//! `confirm_*` / `abort_*` steps so the async controller can run the network
//! call without holding the machine, and roll back on failure.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Starting -> Active <-> Paused -> Finishing -> Finished
//!         Starting | Active | Paused -> Cancelled
//! ```
//!
//! Leaving the foreground while `Starting`, `Active` or `Paused` cancels the
//! session and zeroes its elapsed time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::events::Event;
use crate::ports::{FinishSessionResponse, SessionId};
use crate::reward::RewardBreakdown;
use crate::timer::SessionTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    /// Waiting for the backend to create the session.
    Starting,
    Active,
    Paused,
    /// Waiting for the backend to commit the result.
    Finishing,
    Finished,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Starting => "starting",
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Finishing => "finishing",
            SessionStatus::Finished => "finished",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Finished | SessionStatus::Cancelled)
    }

    /// A new session may be started from this status.
    pub fn can_start(self) -> bool {
        self == SessionStatus::Idle || self.is_terminal()
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// User abandoned the session.
    User,
    /// App left the foreground.
    Backgrounded,
    /// The screen hosting the session was closed.
    NavigatedAway,
}

/// Parameters chosen on the session config screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub deck_category: String,
    pub deck_math_topic: Option<String>,
    pub goal_minutes: u32,
}

/// Result of a committed session, kept until the caller dismisses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub remote_id: SessionId,
    pub elapsed_seconds: u64,
    pub cards_studied: u32,
    pub reward: RewardBreakdown,
    pub server: FinishSessionResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    /// Local instance id; a fresh one per `start`.
    pub id: Uuid,
    pub remote_id: Option<SessionId>,
    pub deck_category: String,
    pub deck_math_topic: Option<String>,
    pub session_goal_minutes: u32,
    pub elapsed_seconds: u64,
    pub cards_studied: u32,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<CancelReason>,
    pub outcome: Option<SessionOutcome>,
}

/// Snapshot handed to the controller when a finish is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishTicket {
    pub session_id: Uuid,
    pub remote_id: SessionId,
    pub elapsed_seconds: u64,
    pub cards_studied: u32,
    pub goal_minutes: u32,
}

#[derive(Debug, Default)]
pub struct StudySessionMachine {
    session: Option<StudySession>,
    timer: SessionTimer,
    /// Status to restore if the in-flight finish fails.
    finishing_from: Option<SessionStatus>,
    /// Session cancelled by backgrounding whose prompt is not yet shown.
    inactivity_prompt: Option<Uuid>,
}

impl StudySessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Idle)
    }

    pub fn session(&self) -> Option<&StudySession> {
        self.session.as_ref()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn has_pending_inactivity_prompt(&self) -> bool {
        self.inactivity_prompt.is_some()
    }

    // ── Start ────────────────────────────────────────────────────────

    /// Create a fresh `Starting` session. Rejected without touching the
    /// current session unless it is idle or terminal.
    pub fn begin_start(&mut self, config: &SessionConfig) -> Result<Event, SessionError> {
        let status = self.status();
        if !status.can_start() {
            return Err(SessionError::AlreadyActive(status));
        }

        self.timer.reset();
        self.finishing_from = None;
        let id = Uuid::new_v4();
        self.session = Some(StudySession {
            id,
            remote_id: None,
            deck_category: config.deck_category.clone(),
            deck_math_topic: config.deck_math_topic.clone(),
            session_goal_minutes: config.goal_minutes,
            elapsed_seconds: 0,
            cards_studied: 0,
            status: SessionStatus::Starting,
            started_at: None,
            cancel_reason: None,
            outcome: None,
        });
        Ok(Event::SessionStarting {
            session_id: id,
            at: Utc::now(),
        })
    }

    /// The backend created the session: go `Active` and start the timer.
    ///
    /// Returns the timer generation the tick source must present.
    pub fn confirm_start(
        &mut self,
        session_id: Uuid,
        remote_id: SessionId,
    ) -> Result<(Event, u64), SessionError> {
        if !self.is(session_id, SessionStatus::Starting) {
            return Err(SessionError::Interrupted);
        }
        let generation = self.start_timer();
        let session = self.session_mut()?;
        session.status = SessionStatus::Active;
        session.remote_id = Some(remote_id);
        session.started_at = Some(Utc::now());
        session.elapsed_seconds = 0;
        session.cards_studied = 0;
        Ok((
            Event::SessionStarted {
                session_id,
                goal_minutes: session.session_goal_minutes,
                at: Utc::now(),
            },
            generation,
        ))
    }

    /// The create call failed: drop the pending session, back to `Idle`.
    pub fn abort_start(&mut self, session_id: Uuid) -> Option<Event> {
        if !self.is(session_id, SessionStatus::Starting) {
            return None;
        }
        self.session = None;
        Some(Event::SessionStartFailed {
            session_id,
            at: Utc::now(),
        })
    }

    // ── Running ──────────────────────────────────────────────────────

    pub fn record_card_studied(&mut self) -> Result<Event, SessionError> {
        let session = self.session_in("record a card", &[SessionStatus::Active])?;
        session.cards_studied = session.cards_studied.saturating_add(1);
        Ok(Event::CardStudied {
            session_id: session.id,
            cards_studied: session.cards_studied,
        })
    }

    pub fn pause(&mut self) -> Result<Event, SessionError> {
        self.session_in("pause", &[SessionStatus::Active])?;
        self.timer.pause();
        let elapsed = self.timer.elapsed_secs();
        let session = self.session_mut()?;
        session.status = SessionStatus::Paused;
        session.elapsed_seconds = elapsed;
        Ok(Event::SessionPaused {
            session_id: session.id,
            elapsed_secs: elapsed,
            at: Utc::now(),
        })
    }

    /// Returns the timer generation the tick source must present.
    pub fn resume(&mut self) -> Result<(Event, u64), SessionError> {
        self.session_in("resume", &[SessionStatus::Paused])?;
        let generation = self.start_timer();
        let elapsed = self.timer.elapsed_secs();
        let session = self.session_mut()?;
        session.status = SessionStatus::Active;
        Ok((
            Event::SessionResumed {
                session_id: session.id,
                elapsed_secs: elapsed,
                at: Utc::now(),
            },
            generation,
        ))
    }

    /// Apply one tick from the source started at `generation`.
    pub fn tick(&mut self, generation: u64) -> Option<Event> {
        if self.status() != SessionStatus::Active {
            return None;
        }
        let elapsed = self.timer.tick(generation)?;
        let session = self.session.as_mut()?;
        session.elapsed_seconds = elapsed;
        Some(Event::Tick {
            session_id: session.id,
            elapsed_secs: elapsed,
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// The app left the foreground. Any live session is cancelled with its
    /// elapsed time zeroed; no reward accrues for it.
    pub fn on_app_backgrounded(&mut self) -> Option<Event> {
        match self.status() {
            SessionStatus::Starting | SessionStatus::Active | SessionStatus::Paused => {}
            SessionStatus::Finishing => {
                tracing::debug!("backgrounded while finishing; commit already requested");
                return None;
            }
            _ => return None,
        }
        self.timer.reset();
        let session = self.session.as_mut()?;
        session.elapsed_seconds = 0;
        session.status = SessionStatus::Cancelled;
        session.cancel_reason = Some(CancelReason::Backgrounded);
        self.inactivity_prompt = Some(session.id);
        Some(Event::SessionCancelled {
            session_id: session.id,
            reason: CancelReason::Backgrounded,
            at: Utc::now(),
        })
    }

    /// The app returned to the foreground. Surfaces the inactivity prompt
    /// once; never resumes a session.
    pub fn on_app_foregrounded(&mut self) -> Option<Event> {
        let session_id = self.inactivity_prompt.take()?;
        Some(Event::InactivityPrompt {
            session_id,
            at: Utc::now(),
        })
    }

    // ── Finish ───────────────────────────────────────────────────────

    /// Freeze the session for commit: pauses the timer and goes `Finishing`.
    pub fn begin_finish(&mut self) -> Result<(FinishTicket, Event), SessionError> {
        let status = self.status();
        if status == SessionStatus::Finishing {
            return Err(SessionError::OperationInFlight("finish"));
        }
        let remote_id = self
            .session_in("finish", &[SessionStatus::Active, SessionStatus::Paused])?
            .remote_id
            .clone()
            .ok_or(SessionError::Interrupted)?;
        if self.timer.elapsed_secs() == 0 {
            return Err(SessionError::NothingElapsed);
        }

        self.timer.pause();
        self.finishing_from = Some(status);
        let elapsed = self.timer.elapsed_secs();
        let session = self.session_mut()?;
        session.status = SessionStatus::Finishing;
        session.elapsed_seconds = elapsed;

        let ticket = FinishTicket {
            session_id: session.id,
            remote_id,
            elapsed_seconds: elapsed,
            cards_studied: session.cards_studied,
            goal_minutes: session.session_goal_minutes,
        };
        let event = Event::SessionFinishing {
            session_id: session.id,
            elapsed_secs: elapsed,
            at: Utc::now(),
        };
        Ok((ticket, event))
    }

    pub fn complete_finish(
        &mut self,
        session_id: Uuid,
        outcome: SessionOutcome,
    ) -> Result<Event, SessionError> {
        if !self.is(session_id, SessionStatus::Finishing) {
            return Err(SessionError::Interrupted);
        }
        self.finishing_from = None;
        let session = self.session_mut()?;
        session.status = SessionStatus::Finished;
        let event = Event::SessionFinished {
            session_id,
            elapsed_secs: outcome.elapsed_seconds,
            cards_studied: outcome.cards_studied,
            reward: outcome.reward,
            at: Utc::now(),
        };
        session.outcome = Some(outcome);
        Ok(event)
    }

    /// The commit call failed: restore the pre-finish status. If that was
    /// `Active`, the timer is restarted and its new generation returned.
    pub fn abort_finish(&mut self, session_id: Uuid) -> Option<(Event, Option<u64>)> {
        if !self.is(session_id, SessionStatus::Finishing) {
            return None;
        }
        let restore = self.finishing_from.take().unwrap_or(SessionStatus::Paused);
        let generation = if restore == SessionStatus::Active {
            Some(self.start_timer())
        } else {
            None
        };
        let session = self.session.as_mut()?;
        session.status = restore;
        Some((
            Event::SessionFinishFailed {
                session_id,
                status: restore,
                at: Utc::now(),
            },
            generation,
        ))
    }

    // ── Cancel / clear ───────────────────────────────────────────────

    pub fn cancel(&mut self, reason: CancelReason) -> Result<Event, SessionError> {
        if self.status() == SessionStatus::Finishing {
            return Err(SessionError::OperationInFlight("finish"));
        }
        self.session_in(
            "cancel",
            &[
                SessionStatus::Starting,
                SessionStatus::Active,
                SessionStatus::Paused,
            ],
        )?;
        self.timer.pause();
        let session = self.session_mut()?;
        session.status = SessionStatus::Cancelled;
        session.cancel_reason = Some(reason);
        Ok(Event::SessionCancelled {
            session_id: session.id,
            reason,
            at: Utc::now(),
        })
    }

    /// Clear a finished or cancelled session, returning it. Callers read
    /// the reward from it before it is gone.
    pub fn dismiss(&mut self) -> Result<StudySession, SessionError> {
        let status = self.status();
        if !status.is_terminal() {
            return Err(SessionError::InvalidTransition {
                action: "dismiss",
                status,
            });
        }
        self.timer.reset();
        self.session.take().ok_or(SessionError::InvalidTransition {
            action: "dismiss",
            status,
        })
    }

    /// Navigation away from the session screen: cancel anything live and
    /// clear the slot. A session mid-commit is left to complete.
    pub fn leave(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        match self.status() {
            SessionStatus::Idle | SessionStatus::Finishing => return events,
            SessionStatus::Starting | SessionStatus::Active | SessionStatus::Paused => {
                if let Ok(event) = self.cancel(CancelReason::NavigatedAway) {
                    events.push(event);
                }
            }
            SessionStatus::Finished | SessionStatus::Cancelled => {}
        }
        if let Ok(session) = self.dismiss() {
            events.push(Event::SessionCleared {
                session_id: session.id,
            });
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn is(&self, session_id: Uuid, status: SessionStatus) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.id == session_id && s.status == status)
    }

    fn start_timer(&mut self) -> u64 {
        self.timer
            .start()
            .unwrap_or_else(|| self.timer.generation())
    }

    fn session_mut(&mut self) -> Result<&mut StudySession, SessionError> {
        let status = self.status();
        self.session.as_mut().ok_or(SessionError::InvalidTransition {
            action: "update",
            status,
        })
    }

    fn session_in(
        &mut self,
        action: &'static str,
        allowed: &[SessionStatus],
    ) -> Result<&mut StudySession, SessionError> {
        let status = self.status();
        if !allowed.contains(&status) {
            return Err(SessionError::InvalidTransition { action, status });
        }
        self.session_mut()
    }
}
