//! Contracts for the external collaborators the study core calls into.
//!
//! The backend owns persistence of sessions, streaks, users and
//! achievements; the core only sees these async traits. `HttpBackend`
//! in [`crate::api`] implements all of them against the REST backend, and
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;
use crate::reward::RewardBreakdown;

/// A convenience type alias for `Result<T, ApiError>`.
pub type ApiResult<T> = Result<T, ApiError>;

/// Backend identifier of a study session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(#[serde(deserialize_with = "string_or_number")] pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(#[serde(deserialize_with = "string_or_number")] pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend ids are auto-increment integers on some routes and strings on
/// others; both map to a string.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Str(String),
        Num(i64),
    }
    Ok(match Repr::deserialize(deserializer)? {
        Repr::Str(s) => s,
        Repr::Num(n) => n.to_string(),
    })
}

/// Snapshot of the authenticated user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub xavicoins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub deck_category: String,
    pub deck_math_topic: Option<String>,
    pub session_goal_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishSessionRequest {
    pub cards_studied: u32,
    /// Foreground study time in seconds.
    pub duration: u64,
    pub notes: Option<String>,
    pub rewards: RewardBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub total_study_seconds: u64,
    #[serde(default)]
    pub total_cards_studied: u64,
}

/// Backend confirmation of a committed session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishSessionResponse {
    #[serde(default)]
    pub rewards: RewardBreakdown,
    #[serde(default)]
    pub statistics: SessionStatistics,
}

#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn create_session(&self, request: &CreateSessionRequest) -> ApiResult<SessionId>;

    async fn finish_session(
        &self,
        session_id: &SessionId,
        request: &FinishSessionRequest,
    ) -> ApiResult<FinishSessionResponse>;
}

#[async_trait]
pub trait StreakApi: Send + Sync {
    async fn update_streak(&self, user_id: &UserId) -> ApiResult<()>;
}

#[async_trait]
pub trait UserApi: Send + Sync {
    /// Fetch the authenticated user, including the updated `current_streak`.
    async fn current_user(&self) -> ApiResult<User>;
}

#[async_trait]
pub trait AchievementApi: Send + Sync {
    async fn update_progress_from_streak(&self, user_id: &UserId, streak_days: u32) -> ApiResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_accept_numbers_and_strings() {
        let user: User = serde_json::from_str(r#"{"id": 12, "currentStreak": 4}"#).unwrap();
        assert_eq!(user.id, UserId("12".into()));
        assert_eq!(user.current_streak, 4);
        assert_eq!(user.username, "");

        let id: SessionId = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(id.to_string(), "abc");
    }

    #[test]
    fn finish_request_uses_backend_field_names() {
        let req = FinishSessionRequest {
            cards_studied: 3,
            duration: 610,
            notes: Some("good".into()),
            rewards: RewardBreakdown::default(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["cardsStudied"], 3);
        assert_eq!(json["duration"], 610);
        assert_eq!(json["rewards"]["xavicoins"], 0);
    }
}
