//! # Xavistudy Core Library
//!
//! This library provides the study-session logic of the Xavistudy learning
//! platform: timing a study session while the app is in the foreground,
//! turning the result into a Xavicoin reward, and keeping the daily streak
//! current. The backend and the UI are external; the core talks to them
//! through traits.
//!
//! ## Architecture
//!
//! - **Session timer**: a tick-counting timer plus a 1-Hz tokio tick source
//! - **State machine**: pure session lifecycle; leaving the foreground
//!   cancels the live session and zeroes its time
//! - **Controller**: async shell that calls the backend with rollback
//! - **Rewards**: pure, table-driven Xavicoin computation
//! - **Streaks**: once-per-day streak update with an injectable clock
//! - **Storage**: TOML configuration and a local SQLite history
//!
//! ## Key Components
//!
//! - [`StudySessionMachine`]: session state machine
//! - [`StudyController`]: session commands against a [`SessionApi`]
//! - [`RewardCalculator`]: reward computation
//! - [`StreakUpdateCoordinator`]: daily streak trigger
//! - [`StudyContext`]: mount/unmount wiring to the app lifecycle

pub mod api;
pub mod clock;
pub mod context;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod ports;
pub mod reward;
pub mod session;
pub mod storage;
pub mod streak;
pub mod timer;

pub use api::HttpBackend;
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::StudyContext;
pub use error::{ApiError, ConfigError, CoreError, SessionError, ValidationError};
pub use events::Event;
pub use lifecycle::{AppState, ChannelLifecycle, LifecycleSource, LifecycleSubscription};
pub use ports::{
    AchievementApi, CreateSessionRequest, FinishSessionRequest, FinishSessionResponse,
    SessionApi, SessionId, SessionStatistics, StreakApi, User, UserApi, UserId,
};
pub use reward::{RewardBreakdown, RewardCalculator, RewardConfig, RewardStep, RewardTable};
pub use session::{
    CancelReason, SessionConfig, SessionOutcome, SessionStatus, StudyController, StudySession,
    StudySessionMachine,
};
pub use storage::{Config, Database, SessionRecord, Stats};
pub use streak::{
    InMemoryMemo, KvStreakMemo, StreakMemo, StreakUpdateCoordinator, StreakUpdateOutcome,
};
pub use timer::{SessionTimer, Ticker};
