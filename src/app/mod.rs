use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Settings;
use crate::processing::PostProcessor;
use crate::recorder::{SessionController, Streamlink};
use crate::scheduler::PollLoop;
use crate::twitch::{CredentialManager, HelixClient, TokenSource, TwitchAuth};

/// Start the recorder and run until Ctrl-C / SIGTERM.
pub async fn run_service(settings: Settings) -> Result<()> {
    info!("Starting twitch-recorder for {}", settings.username);

    check_external_tools(&settings);
    prepare_directories(&settings)?;

    let auth = TwitchAuth::new(&settings.endpoints.auth_url, settings.credentials.clone())?;
    let token = auth
        .fetch_access_token()
        .await
        .context("Failed to obtain Twitch access token")?;
    let credentials = CredentialManager::with_token(Box::new(auth), token);

    let presence = HelixClient::new(
        &settings.endpoints.api_url,
        settings.credentials.client_id(),
    )?;

    let pipeline = PostProcessor::from_settings(&settings);
    pipeline
        .drain_leftovers()
        .await
        .context("Failed to process previous recordings")?;

    let session = SessionController::new(&settings, Box::new(Streamlink::new(&settings.capture)))?;

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    PollLoop::new(
        &settings,
        credentials,
        Box::new(presence),
        session,
        pipeline,
        cancel,
    )
    .run()
    .await;

    info!("twitch-recorder stopped");
    Ok(())
}

/// Create `recorded/<user>` and `processed/<user>` under the root path.
pub fn prepare_directories(settings: &Settings) -> Result<()> {
    for dir in [settings.recorded_dir(), settings.processed_dir()] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
}

fn check_external_tools(settings: &Settings) {
    let mut tools = vec![&settings.capture.streamlink_path];
    if settings.repair.enabled {
        tools.push(&settings.repair.ffmpeg_path);
    }

    for tool in tools {
        match which::which(tool) {
            Ok(path) => info!("Using {}", path.display()),
            Err(_) => warn!(
                "{} not found in PATH, recordings will fail until it is installed",
                tool.display()
            ),
        }
    }
}

fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("Shutdown requested, finishing current work");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!("Failed to listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
