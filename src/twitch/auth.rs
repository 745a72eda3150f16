//! Client-credentials token exchange.
//!
//! The token carries no tracked expiry. It is refreshed reactively, when a
//! presence check comes back `Unauthorized`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};

use crate::error::{RecorderError, RecorderResult};

/// Application credentials registered with Twitch.
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bearer token returned by the exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_access_token(&self) -> RecorderResult<AccessToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Turn the token endpoint's reply into a token, or an `Auth` error.
pub fn parse_token_response(status: StatusCode, body: &str) -> RecorderResult<AccessToken> {
    if !status.is_success() {
        return Err(RecorderError::Auth(format!(
            "token endpoint returned {}: {}",
            status,
            body.trim()
        )));
    }

    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| RecorderError::Auth(format!("malformed token response: {e}")))?;

    if response.access_token.is_empty() {
        return Err(RecorderError::Auth(
            "token endpoint returned an empty access_token".to_string(),
        ));
    }

    if let Some(expires_in) = response.expires_in {
        debug!("Access token expires in {}s", expires_in);
    }

    Ok(AccessToken(response.access_token))
}

/// Talks to `id.twitch.tv` (or whatever `auth_url` points at).
pub struct TwitchAuth {
    client: reqwest::Client,
    auth_url: String,
    credentials: Credentials,
}

impl TwitchAuth {
    pub fn new(auth_url: impl Into<String>, credentials: Credentials) -> RecorderResult<Self> {
        let client = super::http_client()
            .map_err(|e| RecorderError::Auth(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            auth_url: auth_url.into(),
            credentials,
        })
    }
}

#[async_trait]
impl TokenSource for TwitchAuth {
    async fn fetch_access_token(&self) -> RecorderResult<AccessToken> {
        debug!("Requesting app access token from {}", self.auth_url);

        let response = self
            .client
            .post(&self.auth_url)
            .query(&[
                ("client_id", self.credentials.client_id()),
                ("client_secret", self.credentials.client_secret()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| RecorderError::Auth(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecorderError::Auth(format!("failed to read token response: {e}")))?;

        parse_token_response(status, &body)
    }
}

/// Owns the current token and knows how to get a new one.
pub struct CredentialManager {
    source: Box<dyn TokenSource>,
    token: Option<AccessToken>,
}

impl CredentialManager {
    pub fn new(source: Box<dyn TokenSource>) -> Self {
        Self {
            source,
            token: None,
        }
    }

    /// Start with a token that was fetched elsewhere.
    pub fn with_token(source: Box<dyn TokenSource>, token: AccessToken) -> Self {
        Self {
            source,
            token: Some(token),
        }
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Exchange credentials for a fresh token. On failure the previous token,
    /// if any, stays in place.
    pub async fn refresh(&mut self) -> RecorderResult<&AccessToken> {
        let token = self.source.fetch_access_token().await?;
        info!("Obtained new Twitch access token");
        let token = self.token.insert(token);
        Ok(&*token)
    }
}
