use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reward::RewardBreakdown;
use crate::session::{CancelReason, SessionStatus};

/// Every state change of a study session produces an Event.
/// The UI subscribes to them to re-render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarting {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    SessionStarted {
        session_id: Uuid,
        goal_minutes: u32,
        at: DateTime<Utc>,
    },
    /// The create call failed and the session was rolled back.
    SessionStartFailed {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    Tick {
        session_id: Uuid,
        elapsed_secs: u64,
    },
    CardStudied {
        session_id: Uuid,
        cards_studied: u32,
    },
    SessionPaused {
        session_id: Uuid,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        session_id: Uuid,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionFinishing {
        session_id: Uuid,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// The commit call failed; the session is back in `status`.
    SessionFinishFailed {
        session_id: Uuid,
        status: SessionStatus,
        at: DateTime<Utc>,
    },
    SessionFinished {
        session_id: Uuid,
        elapsed_secs: u64,
        cards_studied: u32,
        reward: RewardBreakdown,
        at: DateTime<Utc>,
    },
    SessionCancelled {
        session_id: Uuid,
        reason: CancelReason,
        at: DateTime<Utc>,
    },
    /// The app came back to the foreground after a session was cancelled
    /// for inactivity.
    InactivityPrompt {
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    SessionCleared {
        session_id: Uuid,
    },
}
