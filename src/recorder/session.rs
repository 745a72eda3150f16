use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::capture::{CaptureExit, CaptureTool};
use super::filename::RecordingNamer;
use crate::config::Settings;
use crate::twitch::ChannelInfo;

/// One live broadcast being captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSession {
    pub target_filename: String,
    pub recorded_path: PathBuf,
    pub processed_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The capture left a file behind at `recorded_path`.
    Captured(RecordingSession),
    /// The tool exited without writing anything.
    NotCaptured,
}

pub struct SessionController {
    capture: Box<dyn CaptureTool>,
    namer: RecordingNamer,
    username: String,
    quality: String,
    recorded_dir: PathBuf,
    processed_dir: PathBuf,
}

impl SessionController {
    pub fn new(settings: &Settings, capture: Box<dyn CaptureTool>) -> Result<Self> {
        Ok(Self {
            capture,
            namer: RecordingNamer::new()?,
            username: settings.username.clone(),
            quality: settings.quality.clone(),
            recorded_dir: settings.recorded_dir(),
            processed_dir: settings.processed_dir(),
        })
    }

    pub fn prepare(&self, channel: &ChannelInfo, at: NaiveDateTime) -> RecordingSession {
        let target_filename = self
            .namer
            .recording_filename(&self.username, at, &channel.title);

        RecordingSession {
            recorded_path: self.recorded_dir.join(&target_filename),
            processed_path: self.processed_dir.join(&target_filename),
            target_filename,
        }
    }

    /// Run the capture tool to completion for a live channel.
    pub async fn start_recording(
        &self,
        channel: &ChannelInfo,
        cancel: &CancellationToken,
    ) -> SessionOutcome {
        let session = self.prepare(channel, Local::now().naive_local());
        info!(
            "{} online, recording \"{}\" to {:?}",
            self.username, channel.title, session.recorded_path
        );

        match self
            .capture
            .capture(&self.username, &self.quality, &session.recorded_path, cancel)
            .await
        {
            Ok(CaptureExit::Exited { success: true, .. }) => {
                info!("Recording finished, processing video file");
            }
            Ok(CaptureExit::Exited {
                success: false,
                code,
            }) => {
                warn!(
                    "{} exited with status {:?}, processing whatever was written",
                    self.capture.name(),
                    code
                );
            }
            Ok(CaptureExit::Interrupted) => {
                info!("Recording interrupted by shutdown");
            }
            Err(e) => {
                error!("Recording failed: {}", e);
            }
        }

        if session.recorded_path.exists() {
            SessionOutcome::Captured(session)
        } else {
            info!(
                "Stream not captured, no file at {:?}",
                session.recorded_path
            );
            SessionOutcome::NotCaptured
        }
    }
}
