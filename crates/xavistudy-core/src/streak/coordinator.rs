//! Once-per-day streak update trigger.
//!
//! Triggered on mount and on every return to the foreground. The first
//! trigger of a calendar day for the current user calls the streak RPC,
//! refreshes the local user snapshot and pushes the new streak into
//! achievement progress. Later triggers that day are no-ops.
//!
//! Failures are logged and swallowed. The memo key is advanced once the
//! attempt completes either way, so a failing backend is not hammered
//! within the same day; the next day (or user) retries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::memo::{update_key, StreakMemo};
use crate::clock::Clock;
use crate::ports::{AchievementApi, StreakApi, User, UserApi, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StreakUpdateOutcome {
    Updated { streak: u32 },
    AlreadyUpdatedToday,
    /// Another update is running.
    InFlight,
    NotAuthenticated,
    Failed,
}

pub struct StreakUpdateCoordinator {
    streak: Arc<dyn StreakApi>,
    users: Arc<dyn UserApi>,
    achievements: Arc<dyn AchievementApi>,
    clock: Arc<dyn Clock>,
    memo: Arc<dyn StreakMemo>,
    user: Mutex<Option<User>>,
    in_flight: AtomicBool,
}

impl StreakUpdateCoordinator {
    pub fn new(
        streak: Arc<dyn StreakApi>,
        users: Arc<dyn UserApi>,
        achievements: Arc<dyn AchievementApi>,
        clock: Arc<dyn Clock>,
        memo: Arc<dyn StreakMemo>,
    ) -> Self {
        Self {
            streak,
            users,
            achievements,
            clock,
            memo,
            user: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Current local user snapshot.
    pub fn user(&self) -> Option<User> {
        self.user.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Set (login) or clear (logout) the authenticated user.
    pub fn set_user(&self, user: Option<User>) {
        *self.user.lock().unwrap_or_else(|e| e.into_inner()) = user;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn maybe_update(&self) -> StreakUpdateOutcome {
        let Some(user_id) = self.user().map(|u| u.id) else {
            return StreakUpdateOutcome::NotAuthenticated;
        };
        let key = update_key(&user_id, self.clock.today());
        if self.memo.last_update_key().as_deref() == Some(key.as_str()) {
            debug!(%key, "streak already updated today");
            return StreakUpdateOutcome::AlreadyUpdatedToday;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("streak update already in flight");
            return StreakUpdateOutcome::InFlight;
        };
        // An update may have finished between the memo check and the guard.
        if self.memo.last_update_key().as_deref() == Some(key.as_str()) {
            return StreakUpdateOutcome::AlreadyUpdatedToday;
        }

        let outcome = self.attempt(&user_id).await;
        self.memo.set_last_update_key(&key);
        outcome
    }

    async fn attempt(&self, user_id: &UserId) -> StreakUpdateOutcome {
        if let Err(e) = self.streak.update_streak(user_id).await {
            warn!(%user_id, error = %e, "streak update failed");
            return StreakUpdateOutcome::Failed;
        }

        let user = match self.users.current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!(%user_id, error = %e, "user refresh after streak update failed");
                return StreakUpdateOutcome::Failed;
            }
        };
        let streak = user.current_streak;
        self.set_user(Some(user));

        if let Err(e) = self
            .achievements
            .update_progress_from_streak(user_id, streak)
            .await
        {
            warn!(%user_id, streak, error = %e, "achievement progress update failed");
        }

        info!(%user_id, streak, "streak updated");
        StreakUpdateOutcome::Updated { streak }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
