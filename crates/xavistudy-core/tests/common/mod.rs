//! Shared in-memory fakes for the backend ports.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use xavistudy_core::ports::ApiResult;
use xavistudy_core::{
    AchievementApi, ApiError, CreateSessionRequest, FinishSessionRequest, FinishSessionResponse,
    InMemoryMemo, ManualClock, RewardCalculator, SessionApi, SessionConfig, SessionId,
    SessionStatistics, StreakApi, StreakUpdateCoordinator, StudyController, Ticker, User, UserApi,
    UserId,
};

// ── Session API ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSessionApi {
    pub fail_create: AtomicBool,
    pub fail_finish: AtomicBool,
    /// When set, `create_session` waits for `release_create`.
    pub hold_create: AtomicBool,
    create_gate: Notify,
    next_id: AtomicU64,
    pub created: Mutex<Vec<CreateSessionRequest>>,
    pub finished: Mutex<Vec<(SessionId, FinishSessionRequest)>>,
}

impl FakeSessionApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn release_create(&self) {
        self.create_gate.notify_one();
    }

    pub fn finish_calls(&self) -> Vec<(SessionId, FinishSessionRequest)> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionApi for FakeSessionApi {
    async fn create_session(&self, request: &CreateSessionRequest) -> ApiResult<SessionId> {
        if self.hold_create.load(Ordering::SeqCst) {
            self.create_gate.notified().await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ApiError::Network("connection refused".into()));
        }
        self.created.lock().unwrap().push(request.clone());
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SessionId(format!("remote-{id}")))
    }

    async fn finish_session(
        &self,
        session_id: &SessionId,
        request: &FinishSessionRequest,
    ) -> ApiResult<FinishSessionResponse> {
        if self.fail_finish.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected {
                status: 500,
                message: "database unavailable".into(),
            });
        }
        self.finished
            .lock()
            .unwrap()
            .push((session_id.clone(), request.clone()));
        Ok(FinishSessionResponse {
            rewards: request.rewards,
            statistics: SessionStatistics {
                total_sessions: 1,
                total_study_seconds: request.duration,
                total_cards_studied: u64::from(request.cards_studied),
            },
        })
    }
}

pub fn controller(api: &Arc<FakeSessionApi>) -> StudyController {
    StudyController::new(api.clone(), RewardCalculator::default(), Ticker::default())
}

pub fn math_session(goal_minutes: u32) -> SessionConfig {
    SessionConfig {
        deck_category: "math".into(),
        deck_math_topic: Some("fractions".into()),
        goal_minutes,
    }
}

// ── Streak / user / achievement APIs ─────────────────────────────────

pub struct FakeStreakBackend {
    pub streak_calls: AtomicU32,
    pub user_calls: AtomicU32,
    pub achievement_calls: Mutex<Vec<(UserId, u32)>>,
    pub fail_streak: AtomicBool,
    pub fail_user: AtomicBool,
    pub fail_achievements: AtomicBool,
    /// When set, `update_streak` waits for `release_streak`.
    pub hold_streak: AtomicBool,
    streak_gate: Notify,
    streak: AtomicU32,
    user_id: UserId,
}

impl FakeStreakBackend {
    pub fn new(user_id: &str, streak: u32) -> Arc<Self> {
        Arc::new(Self {
            streak_calls: AtomicU32::new(0),
            user_calls: AtomicU32::new(0),
            achievement_calls: Mutex::new(Vec::new()),
            fail_streak: AtomicBool::new(false),
            fail_user: AtomicBool::new(false),
            fail_achievements: AtomicBool::new(false),
            hold_streak: AtomicBool::new(false),
            streak_gate: Notify::new(),
            streak: AtomicU32::new(streak),
            user_id: UserId(user_id.into()),
        })
    }

    pub fn user(&self) -> User {
        User {
            id: self.user_id.clone(),
            username: "ana".into(),
            current_streak: self.streak.load(Ordering::SeqCst),
            longest_streak: 0,
            xavicoins: 0,
        }
    }

    pub fn release_streak(&self) {
        self.streak_gate.notify_one();
    }

    pub fn streak_calls(&self) -> u32 {
        self.streak_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreakApi for FakeStreakBackend {
    async fn update_streak(&self, _user_id: &UserId) -> ApiResult<()> {
        self.streak_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_streak.load(Ordering::SeqCst) {
            self.streak_gate.notified().await;
        }
        if self.fail_streak.load(Ordering::SeqCst) {
            return Err(ApiError::Network("timeout".into()));
        }
        self.streak.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl UserApi for FakeStreakBackend {
    async fn current_user(&self) -> ApiResult<User> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_user.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized);
        }
        Ok(self.user())
    }
}

#[async_trait]
impl AchievementApi for FakeStreakBackend {
    async fn update_progress_from_streak(&self, user_id: &UserId, streak_days: u32) -> ApiResult<()> {
        self.achievement_calls
            .lock()
            .unwrap()
            .push((user_id.clone(), streak_days));
        if self.fail_achievements.load(Ordering::SeqCst) {
            return Err(ApiError::NotFound("achievements".into()));
        }
        Ok(())
    }
}

pub fn noon(y: i32, m: u32, d: u32) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()))
}

/// Coordinator wired to `backend` with the user already signed in.
pub fn coordinator(
    backend: &Arc<FakeStreakBackend>,
    clock: &Arc<ManualClock>,
) -> StreakUpdateCoordinator {
    let coordinator = StreakUpdateCoordinator::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        clock.clone(),
        Arc::new(InMemoryMemo::new()),
    );
    coordinator.set_user(Some(backend.user()));
    coordinator
}

/// Poll `cond` until it holds or a second of real time passes.
pub async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
