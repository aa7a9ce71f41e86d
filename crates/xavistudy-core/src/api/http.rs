//! REST backend adapter.
//!
//! Implements every port against the platform backend. JSON bodies use the
//! backend's camelCase field names; an optional bearer token is attached to
//! every request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::error::{ApiError, ConfigError, CoreError, Result};
use crate::ports::{
    AchievementApi, ApiResult, CreateSessionRequest, FinishSessionRequest, FinishSessionResponse,
    SessionApi, SessionId, StreakApi, User, UserApi, UserId,
};
use crate::storage::Config;

#[derive(Debug, Deserialize)]
struct CreatedSession {
    id: SessionId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StreakProgress<'a> {
    user_id: &'a UserId,
    streak_days: u32,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.api.base_url,
            config.api_token(),
            Duration::from_secs(config.api.timeout_secs),
        )
        .map_err(|e| match e {
            ApiError::InvalidBaseUrl(message) => CoreError::Config(ConfigError::InvalidValue {
                key: "api.base_url".into(),
                message,
            }),
            other => CoreError::Api(other),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> ApiResult<Response> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path.to_string())),
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(ApiError::Rejected {
                    status: status.as_u16(),
                    message: error_message(&body),
                })
            }
        }
    }
}

/// Pull `message` or `error` out of a JSON error body, else the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl SessionApi for HttpBackend {
    async fn create_session(&self, request: &CreateSessionRequest) -> ApiResult<SessionId> {
        let path = "study-sessions";
        let resp = self
            .send(self.request(Method::POST, path).json(request), path)
            .await?;
        let created: CreatedSession = resp.json().await?;
        Ok(created.id)
    }

    async fn finish_session(
        &self,
        session_id: &SessionId,
        request: &FinishSessionRequest,
    ) -> ApiResult<FinishSessionResponse> {
        let path = format!("study-sessions/{session_id}/finish");
        let resp = self
            .send(self.request(Method::PUT, &path).json(request), &path)
            .await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl StreakApi for HttpBackend {
    async fn update_streak(&self, user_id: &UserId) -> ApiResult<()> {
        let path = format!("users/{user_id}/streak");
        self.send(self.request(Method::POST, &path).json(&json!({})), &path)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserApi for HttpBackend {
    async fn current_user(&self) -> ApiResult<User> {
        let path = "auth/me";
        let resp = self.send(self.request(Method::GET, path), path).await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl AchievementApi for HttpBackend {
    async fn update_progress_from_streak(&self, user_id: &UserId, streak_days: u32) -> ApiResult<()> {
        let path = "achievements/progress/streak";
        let body = StreakProgress {
            user_id,
            streak_days,
        };
        self.send(self.request(Method::POST, path).json(&body), path)
            .await?;
        Ok(())
    }
}
