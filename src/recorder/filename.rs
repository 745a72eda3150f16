use anyhow::Result;
use chrono::NaiveDateTime;
use regex::Regex;

/// Local timestamp layout embedded in every recording name.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %Hh%Mm%Ss";

/// Builds filesystem-safe recording names from channel metadata.
pub struct RecordingNamer {
    disallowed: Regex,
}

impl RecordingNamer {
    pub fn new() -> Result<Self> {
        // Anything outside [A-Za-z0-9 _.-] can break paths or shells
        let disallowed = Regex::new(r"[^A-Za-z0-9 _.\-]")?;
        Ok(Self { disallowed })
    }

    pub fn sanitize(&self, raw: &str) -> String {
        self.disallowed.replace_all(raw, "").into_owned()
    }

    /// `"<username> - <YYYY-MM-DD HHhMMmSSs> - <title>.mp4"`, sanitized.
    pub fn recording_filename(&self, username: &str, at: NaiveDateTime, title: &str) -> String {
        let raw = format!(
            "{} - {} - {}.mp4",
            username,
            at.format(TIMESTAMP_FORMAT),
            title
        );
        self.sanitize(&raw)
    }
}
