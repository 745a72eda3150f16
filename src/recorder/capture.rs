//! Capture subprocess contract and supervision.
//!
//! The capture tool runs until the broadcast ends. While it runs the output
//! file is sampled on a fixed interval for progress; sampling stops as soon
//! as the child exits.

use async_trait::async_trait;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CaptureSettings;
use crate::error::{RecorderError, RecorderResult};

pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// How a capture subprocess ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureExit {
    Exited { success: bool, code: Option<i32> },
    /// Killed because shutdown was requested.
    Interrupted,
}

impl From<ExitStatus> for CaptureExit {
    fn from(status: ExitStatus) -> Self {
        Self::Exited {
            success: status.success(),
            code: status.code(),
        }
    }
}

#[async_trait]
pub trait CaptureTool: Send + Sync {
    fn name(&self) -> &str;

    /// Record `username`'s live stream into `output`, returning once the
    /// tool exits. The exit status is informational only; whether `output`
    /// exists afterwards is what counts.
    async fn capture(
        &self,
        username: &str,
        quality: &str,
        output: &Path,
        cancel: &CancellationToken,
    ) -> RecorderResult<CaptureExit>;
}

/// Spinner showing how much of the stream has been written so far.
pub struct CaptureProgress {
    bar: Option<ProgressBar>,
}

impl CaptureProgress {
    /// A spinner when `enabled` and stderr is a terminal; debug log lines
    /// otherwise.
    pub fn new(enabled: bool) -> Self {
        Self::for_terminal(enabled, std::io::stderr().is_terminal())
    }

    pub fn for_terminal(enabled: bool, is_terminal: bool) -> Self {
        if !enabled || !is_terminal {
            return Self::hidden();
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
            bar.set_style(style);
        }
        bar.set_message("waiting for stream data...");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    pub fn hidden() -> Self {
        Self { bar: None }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    fn update(&self, bytes: u64) {
        match &self.bar {
            Some(bar) => bar.set_message(format!("{} written", HumanBytes(bytes))),
            None => debug!("Capture progress: {} written", HumanBytes(bytes)),
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Wait for `child` to exit while sampling the size of `output`.
///
/// A cancelled `cancel` token kills the child; the partial file is left in
/// place for post-processing.
pub async fn supervise(
    program: &str,
    child: &mut Child,
    output: &Path,
    interval: Duration,
    progress: &CaptureProgress,
    cancel: &CancellationToken,
) -> RecorderResult<CaptureExit> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            status = child.wait() => {
                break status
                    .map(CaptureExit::from)
                    .map_err(|e| RecorderError::subprocess(program, e));
            }
            _ = cancel.cancelled() => {
                info!("Shutdown requested, stopping {}", program);
                if let Err(e) = child.start_kill() {
                    warn!("Failed to kill {}: {}", program, e);
                }
                if let Err(e) = child.wait().await {
                    warn!("Failed to reap {}: {}", program, e);
                }
                break Ok(CaptureExit::Interrupted);
            }
            _ = ticker.tick() => {
                // the file only appears once the first segment arrives
                if let Ok(meta) = tokio::fs::metadata(output).await {
                    progress.update(meta.len());
                }
            }
        }
    };

    progress.finish();
    result
}

/// `streamlink --twitch-disable-ads twitch.tv/<user> <quality> -o <file>`
pub struct Streamlink {
    program: PathBuf,
    show_progress: bool,
    progress_interval: Duration,
}

impl Streamlink {
    pub fn new(settings: &CaptureSettings) -> Self {
        Self {
            program: settings.streamlink_path.clone(),
            show_progress: settings.show_progress,
            progress_interval: PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn args(username: &str, quality: &str, output: &Path) -> Vec<OsString> {
        vec![
            "--twitch-disable-ads".into(),
            format!("twitch.tv/{username}").into(),
            quality.into(),
            "-o".into(),
            output.as_os_str().to_os_string(),
        ]
    }
}

#[async_trait]
impl CaptureTool for Streamlink {
    fn name(&self) -> &str {
        "streamlink"
    }

    async fn capture(
        &self,
        username: &str,
        quality: &str,
        output: &Path,
        cancel: &CancellationToken,
    ) -> RecorderResult<CaptureExit> {
        let program = self.program.to_string_lossy().into_owned();
        debug!("Launching {} for twitch.tv/{} ({})", program, username, quality);

        let mut child = Command::new(&self.program)
            .args(Self::args(username, quality, output))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RecorderError::subprocess(&program, e))?;

        let progress = CaptureProgress::new(self.show_progress);
        supervise(
            &program,
            &mut child,
            output,
            self.progress_interval,
            &progress,
            cancel,
        )
        .await
    }
}
