use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "twitch-recorder";

/// `~/.config/twitch-recorder` on Linux, the platform equivalent elsewhere.
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .context("Unable to determine config directory")
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Default `recording.root_path`: `recorded/<user>` and `processed/<user>`
/// live under it when the config does not name a root.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = dirs::data_dir() {
        return Ok(dir.join(APP_DIR));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".local").join("share").join(APP_DIR));
    }
    Err(anyhow!("Unable to determine data directory"))
}
