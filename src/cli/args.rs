use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(name = "twitch-recorder")]
#[command(about = "Record a Twitch channel whenever it goes live", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long = "log-level", visible_aliases = ["log", "logging"], global = true)]
    pub log_level: Option<Level>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Channel to watch, overrides twitch.username
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Stream quality passed to streamlink, overrides twitch.quality
    #[arg(short, long, global = true)]
    pub quality: Option<String>,

    /// Move captures as-is instead of repairing them with ffmpeg
    #[arg(long, global = true)]
    pub disable_ffmpeg: bool,

    #[arg(long, env = "TWITCH_CLIENT_ID", hide_env_values = true, global = true)]
    pub client_id: Option<String>,

    #[arg(long, env = "TWITCH_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// Check once whether the channel is live and exit
    Check,
    /// Process recordings left over from a previous run and exit
    Drain,
    /// Run one retention sweep and exit
    Prune,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            username: self.username.clone(),
            quality: self.quality.clone(),
            disable_ffmpeg: self.disable_ffmpeg,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}
