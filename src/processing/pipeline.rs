use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::prune::{prune_old_files, PruneReport};
use super::repair::{Ffmpeg, RepairTool};
use super::upload::{move_file, upload_to_secondary};
use crate::config::Settings;
use crate::error::{RecorderError, RecorderResult};

/// Everything that happens to a capture once the capture tool has exited.
pub struct PostProcessor {
    repair: Option<Box<dyn RepairTool>>,
    keep_raw_on_failure: bool,
    secondary_path: Option<PathBuf>,
    prune_after_days: Option<u64>,
    recorded_dir: PathBuf,
    processed_dir: PathBuf,
}

impl PostProcessor {
    /// `repair: None` moves captures without touching them.
    pub fn new(settings: &Settings, repair: Option<Box<dyn RepairTool>>) -> Self {
        Self {
            repair,
            keep_raw_on_failure: settings.repair.keep_raw_on_failure,
            secondary_path: settings.secondary_path.clone(),
            prune_after_days: settings.prune_after_days,
            recorded_dir: settings.recorded_dir(),
            processed_dir: settings.processed_dir(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let repair: Option<Box<dyn RepairTool>> = if settings.repair.enabled {
            Some(Box::new(Ffmpeg::new(&settings.repair.ffmpeg_path)))
        } else {
            None
        };
        Self::new(settings, repair)
    }

    pub fn recorded_dir(&self) -> &Path {
        &self.recorded_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Repair `raw` into `out` (or move it when repair is off).
    ///
    /// With repair on, `raw` is removed afterwards whatever ffmpeg's exit
    /// status, unless `keep_raw_on_failure` is set and the repair failed.
    pub async fn process_file(&self, raw: &Path, out: &Path) -> RecorderResult<()> {
        let Some(tool) = &self.repair else {
            info!("Moving {:?} to {:?}", raw, out);
            return move_file(raw, out).await;
        };

        info!("Fixing {:?}", raw);
        let failed = match tool.repair(raw, out).await {
            Ok(exit) if exit.success => false,
            Ok(exit) => {
                warn!(
                    "{} exited with status {:?} while fixing {:?}: {}",
                    tool.name(),
                    exit.code,
                    raw,
                    exit.stderr_tail
                );
                true
            }
            Err(e) => {
                error!("Repair of {:?} failed: {}", raw, e);
                true
            }
        };

        if failed {
            if self.keep_raw_on_failure {
                warn!(
                    "Keeping raw capture {:?} after failed repair, it will be retried on next start",
                    raw
                );
                return Ok(());
            }
            warn!(
                "Deleting raw capture {:?} although repair failed (ffmpeg.keep_raw_on_failure is off), this recording may be lost",
                raw
            );
        }

        tokio::fs::remove_file(raw)
            .await
            .map_err(|e| RecorderError::fs(raw, e))
    }

    /// Process a capture and, when configured, copy the result to secondary
    /// storage. Failures are logged, never returned.
    pub async fn handle_capture(&self, raw: &Path, out: &Path) {
        if let Err(e) = self.process_file(raw, out).await {
            error!("Failed to process {:?}: {}", raw, e);
            return;
        }

        let Some(secondary) = &self.secondary_path else {
            return;
        };

        if !out.exists() {
            warn!("Nothing to upload, {:?} does not exist", out);
            return;
        }

        match upload_to_secondary(out, secondary).await {
            Ok(copied) => info!("Uploaded {:?} to {:?}", out, copied),
            Err(e) => error!("Secondary upload of {:?} failed: {}", out, e),
        }
    }

    /// Process captures a previous run left in the recorded directory.
    /// Returns how many files were handled.
    pub async fn drain_leftovers(&self) -> RecorderResult<usize> {
        let mut entries = tokio::fs::read_dir(&self.recorded_dir)
            .await
            .map_err(|e| RecorderError::fs(&self.recorded_dir, e))?;

        let mut leftovers = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RecorderError::fs(&self.recorded_dir, e))?
        {
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => leftovers.push(entry.path()),
                Ok(_) => {}
                Err(e) => warn!("Skipping {:?}: {}", entry.path(), e),
            }
        }

        if leftovers.is_empty() {
            return Ok(0);
        }

        leftovers.sort();
        info!("Processing {} previously recorded file(s)", leftovers.len());

        for raw in &leftovers {
            let Some(name) = raw.file_name() else {
                continue;
            };
            let out = self.processed_dir.join(name);
            self.handle_capture(raw, &out).await;
        }

        Ok(leftovers.len())
    }

    /// Apply the retention window to both directories, if one is configured.
    pub async fn prune(&self) -> Option<PruneReport> {
        let max_age_days = self.prune_after_days?;
        let dirs = [self.recorded_dir.clone(), self.processed_dir.clone()];

        let report = tokio::task::spawn_blocking(move || {
            dirs.iter()
                .map(|dir| prune_old_files(dir, max_age_days))
                .fold(PruneReport::default(), PruneReport::merge)
        })
        .await;

        match report {
            Ok(report) => {
                if report.removed > 0 || report.failed > 0 {
                    info!(
                        "Retention sweep removed {} file(s), {} failure(s)",
                        report.removed, report.failed
                    );
                }
                Some(report)
            }
            Err(e) => {
                error!("Retention sweep panicked: {}", e);
                None
            }
        }
    }
}
