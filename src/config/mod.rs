use crate::error::RecorderError;
use crate::global;
use crate::twitch::Credentials;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Lowest poll interval the Twitch API is asked to tolerate.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 15;

pub const DEFAULT_AUTH_URL: &str = "https://id.twitch.tv/oauth2/token";
pub const DEFAULT_API_URL: &str = "https://api.twitch.tv/helix";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub twitch: TwitchConfig,
    pub recording: RecordingConfig,
    pub ffmpeg: FfmpegConfig,
    pub retention: RetentionConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitchConfig {
    pub username: String,
    pub quality: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Base directory holding `recorded/` and `processed/`.
    pub root_path: Option<PathBuf>,
    pub refresh_interval_seconds: u64,
    pub streamlink_path: String,
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    pub path: String,
    /// Skip the repair pass and just move captures into `processed/`.
    pub disabled: bool,
    /// Keep the raw capture when ffmpeg exits non-zero instead of deleting it.
    pub keep_raw_on_failure: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub prune_after_days: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub enabled: bool,
    pub secondary_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            quality: "best".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            auth_url: None,
            api_url: None,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            refresh_interval_seconds: MIN_REFRESH_INTERVAL_SECS,
            streamlink_path: "streamlink".to_string(),
            show_progress: true,
        }
    }
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            path: "ffmpeg".to_string(),
            disabled: false,
            keep_raw_on_failure: false,
        }
    }
}

/// Values taken from the command line or environment that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub username: Option<String>,
    pub quality: Option<String>,
    pub disable_ffmpeg: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Resolved, immutable run configuration handed to every component.
#[derive(Debug, Clone)]
pub struct Settings {
    pub username: String,
    pub quality: String,
    pub refresh_interval: Duration,
    pub root_path: PathBuf,
    pub credentials: Credentials,
    pub endpoints: ApiEndpoints,
    pub capture: CaptureSettings,
    pub repair: RepairSettings,
    pub prune_after_days: Option<u64>,
    pub secondary_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub auth_url: String,
    pub api_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub streamlink_path: PathBuf,
    pub show_progress: bool,
}

#[derive(Debug, Clone)]
pub struct RepairSettings {
    pub enabled: bool,
    pub ffmpeg_path: PathBuf,
    pub keep_raw_on_failure: bool,
}

impl Settings {
    pub fn recorded_dir(&self) -> PathBuf {
        self.root_path.join("recorded").join(&self.username)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root_path.join("processed").join(&self.username)
    }
}

/// Raise intervals below [`MIN_REFRESH_INTERVAL_SECS`], warning when it happens.
pub fn clamp_refresh_interval(seconds: u64) -> u64 {
    if seconds < MIN_REFRESH_INTERVAL_SECS {
        warn!(
            "Refresh interval of {}s is below the minimum, using {}s",
            seconds, MIN_REFRESH_INTERVAL_SECS
        );
        MIN_REFRESH_INTERVAL_SECS
    } else {
        seconds
    }
}

impl Config {
    /// `path` when given, otherwise the per-user default location.
    pub fn path_or_default(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => global::config_file(),
        }
    }

    /// Load the config at `config_path`.
    ///
    /// A missing file is written with defaults and reported as a
    /// [`RecorderError::Config`] so the user fills in credentials first.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            Self::default().save_to(config_path)?;
            bail!(RecorderError::Config(format!(
                "no config file found, wrote a default one to {}; fill in twitch.username, twitch.client_id and twitch.client_secret and run again",
                config_path.display()
            )));
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply overrides, validate, and produce the immutable [`Settings`].
    pub fn resolve(self, overrides: &Overrides) -> Result<Settings> {
        let username = overrides
            .username
            .clone()
            .unwrap_or(self.twitch.username)
            .trim()
            .to_lowercase();
        if username.is_empty() {
            bail!(RecorderError::Config(
                "no Twitch username configured, set twitch.username or pass --username"
                    .to_string()
            ));
        }

        let quality = overrides
            .quality
            .clone()
            .unwrap_or(self.twitch.quality);
        let quality = if quality.trim().is_empty() {
            "best".to_string()
        } else {
            quality
        };

        let client_id = overrides
            .client_id
            .clone()
            .unwrap_or(self.twitch.client_id);
        let client_secret = overrides
            .client_secret
            .clone()
            .unwrap_or(self.twitch.client_secret);
        if client_id.is_empty() || client_secret.is_empty() {
            bail!(RecorderError::Config(
                "Twitch client credentials missing, set twitch.client_id/twitch.client_secret or TWITCH_CLIENT_ID/TWITCH_CLIENT_SECRET"
                    .to_string()
            ));
        }

        let secondary_path = if self.upload.enabled {
            match self.upload.secondary_path {
                Some(path) => Some(path),
                None => bail!(RecorderError::Config(
                    "upload.enabled is set but upload.secondary_path is missing".to_string()
                )),
            }
        } else {
            None
        };

        let root_path = match self.recording.root_path {
            Some(path) => path,
            None => global::data_dir()?,
        };

        let refresh = clamp_refresh_interval(self.recording.refresh_interval_seconds);

        let disabled = self.ffmpeg.disabled || overrides.disable_ffmpeg;
        if disabled {
            info!("ffmpeg repair disabled, captures will be moved as-is");
        }

        Ok(Settings {
            username,
            quality,
            refresh_interval: Duration::from_secs(refresh),
            root_path,
            credentials: Credentials::new(client_id, client_secret),
            endpoints: ApiEndpoints {
                auth_url: self
                    .twitch
                    .auth_url
                    .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
                api_url: self
                    .twitch
                    .api_url
                    .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            },
            capture: CaptureSettings {
                streamlink_path: PathBuf::from(self.recording.streamlink_path),
                show_progress: self.recording.show_progress,
            },
            repair: RepairSettings {
                enabled: !disabled,
                ffmpeg_path: PathBuf::from(self.ffmpeg.path),
                keep_raw_on_failure: self.ffmpeg.keep_raw_on_failure,
            },
            prune_after_days: self.retention.prune_after_days,
            secondary_path,
        })
    }
}
