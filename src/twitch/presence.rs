//! Live-status checks against the Helix `streams` endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::auth::AccessToken;
use crate::error::{RecorderError, RecorderResult};

/// The subset of a Helix stream object the recorder cares about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_login: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub viewer_count: Option<u64>,
}

impl ChannelInfo {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            started_at: None,
            user_login: None,
            user_name: None,
            game_name: None,
            viewer_count: None,
        }
    }
}

/// Result of a single presence check.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceOutcome {
    Online(ChannelInfo),
    Offline,
    NotFound,
    Unauthorized,
    /// Network failure, timeout, 5xx, unexpected status or unreadable body.
    TransientError(String),
}

impl PresenceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online(_) => "online",
            Self::Offline => "offline",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::TransientError(_) => "error",
        }
    }
}

#[async_trait]
pub trait PresenceSource: Send + Sync {
    /// Never fails: every failure maps to a [`PresenceOutcome`] variant.
    async fn check_live(&self, username: &str, token: &AccessToken) -> PresenceOutcome;
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    data: Vec<ChannelInfo>,
}

/// Map an HTTP status and body from the streams endpoint onto an outcome.
pub fn classify_response(status: StatusCode, body: &str) -> PresenceOutcome {
    match status {
        StatusCode::UNAUTHORIZED => return PresenceOutcome::Unauthorized,
        StatusCode::NOT_FOUND => return PresenceOutcome::NotFound,
        s if !s.is_success() => {
            return PresenceOutcome::TransientError(format!("unexpected status {s}"))
        }
        _ => {}
    }

    match serde_json::from_str::<StreamsResponse>(body) {
        Ok(response) => match response.data.into_iter().next() {
            Some(channel) => PresenceOutcome::Online(channel),
            None => PresenceOutcome::Offline,
        },
        Err(e) => PresenceOutcome::TransientError(format!("malformed streams response: {e}")),
    }
}

/// Helix client bound to one application's client id.
pub struct HelixClient {
    client: reqwest::Client,
    api_url: String,
    client_id: String,
}

impl HelixClient {
    pub fn new(api_url: impl Into<String>, client_id: impl Into<String>) -> RecorderResult<Self> {
        let client = super::http_client()
            .map_err(|e| RecorderError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
        })
    }

    fn streams_url(&self) -> String {
        format!("{}/streams", self.api_url)
    }
}

#[async_trait]
impl PresenceSource for HelixClient {
    async fn check_live(&self, username: &str, token: &AccessToken) -> PresenceOutcome {
        let response = match self
            .client
            .get(self.streams_url())
            .query(&[("user_login", username)])
            .header("Client-ID", &self.client_id)
            .bearer_auth(token.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return PresenceOutcome::TransientError(format!("request failed: {e}")),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return PresenceOutcome::TransientError(format!("failed to read response: {e}"))
            }
        };

        debug!(%status, "Streams endpoint replied for {}", username);
        classify_response(status, &body)
    }
}
