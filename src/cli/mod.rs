use anyhow::{Context, Result};

use crate::app::prepare_directories;
use crate::config::Settings;
use crate::error::RecorderError;
use crate::processing::PostProcessor;
use crate::twitch::{HelixClient, PresenceOutcome, PresenceSource, TokenSource, TwitchAuth};

pub mod args;

pub use args::{Cli, CliCommand};

/// One presence check, printed to stdout.
pub async fn handle_check_command(settings: &Settings) -> Result<()> {
    let auth = TwitchAuth::new(&settings.endpoints.auth_url, settings.credentials.clone())?;
    let token = auth
        .fetch_access_token()
        .await
        .context("Failed to obtain Twitch access token")?;
    let presence = HelixClient::new(
        &settings.endpoints.api_url,
        settings.credentials.client_id(),
    )?;

    match presence.check_live(&settings.username, &token).await {
        PresenceOutcome::Online(channel) => {
            println!("{} is live: {}", settings.username, channel.title);
            if let Some(game) = channel.game_name.filter(|g| !g.is_empty()) {
                println!("  Playing: {}", game);
            }
            if let Some(started) = channel.started_at {
                println!("  Since:   {}", started.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        PresenceOutcome::NotFound => {
            return Err(RecorderError::NotFound(settings.username.clone()).into());
        }
        PresenceOutcome::TransientError(reason) => {
            println!("{}: error ({})", settings.username, reason);
        }
        outcome => println!("{}: {}", settings.username, outcome.as_str()),
    }

    Ok(())
}

pub async fn handle_drain_command(settings: &Settings) -> Result<()> {
    prepare_directories(settings)?;

    let handled = PostProcessor::from_settings(settings)
        .drain_leftovers()
        .await
        .context("Failed to process previous recordings")?;

    if handled == 0 {
        println!("No leftover recordings in {}", settings.recorded_dir().display());
    } else {
        println!("Processed {} leftover recording(s)", handled);
    }
    Ok(())
}

pub async fn handle_prune_command(settings: &Settings) -> Result<()> {
    match PostProcessor::from_settings(settings).prune().await {
        Some(report) => println!(
            "Removed {} file(s), {} failure(s)",
            report.removed, report.failed
        ),
        None => println!("Retention is not configured (retention.prune_after_days)"),
    }
    Ok(())
}
