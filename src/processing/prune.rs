//! Retention sweep over the recording directories.

use std::path::Path;
use std::time::SystemTime;
use tracing::{error, info, warn};
use walkdir::WalkDir;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: usize,
    pub failed: usize,
}

impl PruneReport {
    pub fn merge(self, other: PruneReport) -> PruneReport {
        PruneReport {
            removed: self.removed + other.removed,
            failed: self.failed + other.failed,
        }
    }
}

/// Whole days elapsed between `modified` and `now`. Timestamps in the
/// future count as zero days old.
pub fn age_in_days(modified: SystemTime, now: SystemTime) -> u64 {
    now.duration_since(modified)
        .map(|age| age.as_secs() / SECS_PER_DAY)
        .unwrap_or(0)
}

pub fn prune_old_files(directory: &Path, max_age_days: u64) -> PruneReport {
    prune_old_files_at(directory, max_age_days, SystemTime::now())
}

/// Delete every regular file under `directory` that is more than
/// `max_age_days` whole days old at `now`. Failures are logged per file and
/// never stop the sweep.
pub fn prune_old_files_at(directory: &Path, max_age_days: u64, now: SystemTime) -> PruneReport {
    let mut report = PruneReport::default();

    for entry in WalkDir::new(directory) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", directory, e);
                report.failed += 1;
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let modified = match entry.metadata().map(|meta| meta.modified()) {
            Ok(Ok(modified)) => modified,
            Ok(Err(e)) => {
                warn!("No modification time for {:?}: {}", entry.path(), e);
                report.failed += 1;
                continue;
            }
            Err(e) => {
                warn!("Failed to stat {:?}: {}", entry.path(), e);
                report.failed += 1;
                continue;
            }
        };

        let age = age_in_days(modified, now);
        if age <= max_age_days {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                info!("Pruned {:?} ({} days old)", entry.path(), age);
                report.removed += 1;
            }
            Err(e) => {
                error!("Failed to prune {:?}: {}", entry.path(), e);
                report.failed += 1;
            }
        }
    }

    report
}
