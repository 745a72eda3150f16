//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::Router;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use twitch_recorder::config::{Config, Overrides, Settings};
use twitch_recorder::error::{RecorderError, RecorderResult};
use twitch_recorder::recorder::{CaptureExit, CaptureTool};
use twitch_recorder::twitch::{AccessToken, PresenceOutcome, PresenceSource, TokenSource};

/// Settings rooted at `root` for user `alice`, plus any extra TOML.
pub fn settings(root: &Path, extra: &str) -> Settings {
    let toml = format!(
        r#"
        [twitch]
        username = "alice"
        client_id = "id"
        client_secret = "secret"

        [recording]
        root_path = "{}"
        refresh_interval_seconds = 30

        {}
        "#,
        root.display(),
        extra
    );
    Config::from_toml_str(&toml)
        .unwrap()
        .resolve(&Overrides::default())
        .unwrap()
}

/// Hands out `token-1`, `token-2`, ... and counts calls.
#[derive(Clone, Default)]
pub struct CountingTokens {
    pub calls: Arc<AtomicUsize>,
    pub fail: bool,
}

impl CountingTokens {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for CountingTokens {
    async fn fetch_access_token(&self) -> RecorderResult<AccessToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(RecorderError::Auth("invalid client".to_string()));
        }
        Ok(AccessToken::new(format!("token-{n}")))
    }
}

/// Plays back a fixed list of outcomes, then reports `Offline`.
///
/// When `cancel_when_done` is set the token is cancelled as the last
/// scripted outcome is handed out.
#[derive(Clone, Default)]
pub struct ScriptedPresence {
    script: Arc<Mutex<VecDeque<PresenceOutcome>>>,
    pub tokens_seen: Arc<Mutex<Vec<String>>>,
    cancel_when_done: Option<CancellationToken>,
}

impl ScriptedPresence {
    pub fn new(outcomes: Vec<PresenceOutcome>) -> Self {
        Self {
            script: Arc::new(Mutex::new(outcomes.into())),
            ..Self::default()
        }
    }

    pub fn cancel_when_done(mut self, cancel: CancellationToken) -> Self {
        self.cancel_when_done = Some(cancel);
        self
    }

    pub fn checks(&self) -> usize {
        self.tokens_seen.lock().unwrap().len()
    }
}

#[async_trait]
impl PresenceSource for ScriptedPresence {
    async fn check_live(&self, _username: &str, token: &AccessToken) -> PresenceOutcome {
        self.tokens_seen
            .lock()
            .unwrap()
            .push(token.as_str().to_string());

        let mut script = self.script.lock().unwrap();
        let outcome = script.pop_front().unwrap_or(PresenceOutcome::Offline);
        if script.is_empty() {
            if let Some(cancel) = &self.cancel_when_done {
                cancel.cancel();
            }
        }
        outcome
    }
}

/// Writes `payload` to the output path, or nothing when it is `None`.
pub struct FakeCapture {
    pub payload: Option<Vec<u8>>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeCapture {
    pub fn writing(payload: &[u8]) -> Self {
        Self {
            payload: Some(payload.to_vec()),
            calls: Arc::default(),
        }
    }

    pub fn silent() -> Self {
        Self {
            payload: None,
            calls: Arc::default(),
        }
    }
}

#[async_trait]
impl CaptureTool for FakeCapture {
    fn name(&self) -> &str {
        "fake-streamlink"
    }

    async fn capture(
        &self,
        _username: &str,
        _quality: &str,
        output: &Path,
        _cancel: &CancellationToken,
    ) -> RecorderResult<CaptureExit> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.payload {
            Some(bytes) => {
                tokio::fs::write(output, bytes)
                    .await
                    .map_err(|e| RecorderError::fs(output, e))?;
                Ok(CaptureExit::Exited {
                    success: true,
                    code: Some(0),
                })
            }
            None => Ok(CaptureExit::Exited {
                success: false,
                code: Some(1),
            }),
        }
    }
}

/// One request as seen by [`StubServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (pair.to_string(), String::new()),
            })
            .collect()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: &'static str,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn record_and_reply(
    State(state): State<StubState>,
    request: Request,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    let headers = request
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    state.requests.lock().unwrap().push(RecordedRequest {
        method: request.method().as_str().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        headers,
    });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body,
    )
}

/// Local HTTP server answering every request with the same canned reply.
pub struct StubServer {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(status: u16, body: &'static str) -> Self {
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
        let state = StubState {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            requests: requests.clone(),
        };

        let app = Router::new().fallback(record_and_reply).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("stub server received no request")
    }
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Route this thread's `debug` and above events into the buffer until the
    /// guard is dropped.
    pub fn capture(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
