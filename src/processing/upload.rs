use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{RecorderError, RecorderResult};

/// Copy a finished recording into `secondary_dir`, keeping its file name.
pub async fn upload_to_secondary(file: &Path, secondary_dir: &Path) -> RecorderResult<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        RecorderError::fs(
            file,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;

    fs::create_dir_all(secondary_dir)
        .await
        .map_err(|e| RecorderError::fs(secondary_dir, e))?;

    let destination = secondary_dir.join(name);
    fs::copy(file, &destination)
        .await
        .map_err(|e| RecorderError::fs(&destination, e))?;

    Ok(destination)
}

/// Rename, falling back to copy + remove when crossing filesystems.
pub async fn move_file(from: &Path, to: &Path) -> RecorderResult<()> {
    if fs::rename(from, to).await.is_ok() {
        return Ok(());
    }

    fs::copy(from, to)
        .await
        .map_err(|e| RecorderError::fs(from, e))?;
    fs::remove_file(from)
        .await
        .map_err(|e| RecorderError::fs(from, e))
}
