//! The recorder's main loop.
//!
//! check presence → act on the outcome → prune → sleep → repeat
//!
//! Runs on a single task. A recording blocks the loop until the capture tool
//! exits and the file has been processed, so cycles never overlap.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::status::{CycleReport, LoopState, ERROR_BACKOFF};
use crate::config::Settings;
use crate::processing::PostProcessor;
use crate::recorder::{SessionController, SessionOutcome};
use crate::twitch::{ChannelInfo, CredentialManager, PresenceOutcome, PresenceSource};

pub struct PollLoop {
    username: String,
    quality: String,
    refresh_interval: Duration,
    credentials: CredentialManager,
    presence: Box<dyn PresenceSource>,
    session: SessionController,
    pipeline: PostProcessor,
    cancel: CancellationToken,
    state: LoopState,
    refreshed_last_cycle: bool,
}

impl PollLoop {
    pub fn new(
        settings: &Settings,
        credentials: CredentialManager,
        presence: Box<dyn PresenceSource>,
        session: SessionController,
        pipeline: PostProcessor,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            username: settings.username.clone(),
            quality: settings.quality.clone(),
            refresh_interval: settings.refresh_interval,
            credentials,
            presence,
            session,
            pipeline,
            cancel,
            state: LoopState::CheckingPresence,
            refreshed_last_cycle: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// One full cycle. Returns how long to wait before the next one.
    pub async fn tick(&mut self) -> CycleReport {
        self.state = LoopState::CheckingPresence;

        let outcome = match self.credentials.token() {
            Some(token) => self.presence.check_live(&self.username, token).await,
            None => PresenceOutcome::Unauthorized,
        };

        self.state = LoopState::for_outcome(&outcome);
        let refreshed_last_cycle = std::mem::take(&mut self.refreshed_last_cycle);

        let next_sleep = match outcome {
            PresenceOutcome::NotFound => {
                error!("Username {} not found, invalid username or typo", self.username);
                self.refresh_interval
            }
            PresenceOutcome::TransientError(reason) => {
                error!(
                    "Unexpected error checking {}: {}. Will try again in {}s",
                    self.username,
                    reason,
                    ERROR_BACKOFF.as_secs()
                );
                ERROR_BACKOFF
            }
            PresenceOutcome::Offline => {
                info!(
                    "{} currently offline, checking again in {}s",
                    self.username,
                    self.refresh_interval.as_secs()
                );
                self.refresh_interval
            }
            PresenceOutcome::Unauthorized => self.handle_unauthorized(refreshed_last_cycle).await,
            PresenceOutcome::Online(channel) => {
                self.record(&channel).await;
                self.refresh_interval
            }
        };

        self.pipeline.prune().await;

        debug!(
            state = self.state.as_str(),
            next_sleep_secs = next_sleep.as_secs(),
            "Cycle finished for {}",
            self.username
        );

        CycleReport {
            state: self.state,
            next_sleep,
        }
    }

    async fn handle_unauthorized(&mut self, refreshed_last_cycle: bool) -> Duration {
        info!("Unauthorized, will attempt to log back in immediately");

        match self.credentials.refresh().await {
            Ok(_) if refreshed_last_cycle => {
                // a brand-new token was rejected too; don't spin on the API
                warn!(
                    "Fresh token was rejected as well, waiting {}s before checking again",
                    self.refresh_interval.as_secs()
                );
                self.refreshed_last_cycle = true;
                self.refresh_interval
            }
            Ok(_) => {
                self.refreshed_last_cycle = true;
                Duration::ZERO
            }
            Err(e) => {
                error!(
                    "Failed to refresh access token: {}. Will try again in {}s",
                    e,
                    ERROR_BACKOFF.as_secs()
                );
                ERROR_BACKOFF
            }
        }
    }

    async fn record(&self, channel: &ChannelInfo) {
        match self.session.start_recording(channel, &self.cancel).await {
            SessionOutcome::Captured(session) => {
                self.pipeline
                    .handle_capture(&session.recorded_path, &session.processed_path)
                    .await;
                info!("Processing is done, going back to checking...");
            }
            SessionOutcome::NotCaptured => {
                info!("Skip fixing, nothing was recorded");
            }
        }
    }

    /// Loop until the cancellation token fires.
    pub async fn run(mut self) {
        info!(
            "Checking for {} every {}s, recording with {} quality",
            self.username,
            self.refresh_interval.as_secs(),
            self.quality
        );

        while !self.cancel.is_cancelled() {
            let report = self.tick().await;
            if report.next_sleep.is_zero() {
                continue;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(report.next_sleep) => {}
            }
        }

        info!("Poll loop stopped");
    }
}
