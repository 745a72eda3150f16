//! Twitch Helix API access: app token exchange and live-status checks.

pub mod auth;
pub mod presence;

use std::time::Duration;

pub use auth::{AccessToken, CredentialManager, Credentials, TokenSource, TwitchAuth};
pub use presence::{classify_response, ChannelInfo, HelixClient, PresenceOutcome, PresenceSource};

/// Every request against Twitch gives up after this long.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("twitch-recorder/", env!("CARGO_PKG_VERSION")))
        .build()
}
