//! Poll loop states and the sleep each one leads to.

use std::time::Duration;

use crate::twitch::PresenceOutcome;

/// Fixed backoff after an unexpected failure, whatever the refresh interval.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    CheckingPresence,
    HandlingOffline,
    HandlingNotFound,
    HandlingUnauthorized,
    HandlingError,
    Recording,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckingPresence => "checking_presence",
            Self::HandlingOffline => "offline",
            Self::HandlingNotFound => "not_found",
            Self::HandlingUnauthorized => "unauthorized",
            Self::HandlingError => "error",
            Self::Recording => "recording",
        }
    }

    pub fn for_outcome(outcome: &PresenceOutcome) -> Self {
        match outcome {
            PresenceOutcome::Online(_) => Self::Recording,
            PresenceOutcome::Offline => Self::HandlingOffline,
            PresenceOutcome::NotFound => Self::HandlingNotFound,
            PresenceOutcome::Unauthorized => Self::HandlingUnauthorized,
            PresenceOutcome::TransientError(_) => Self::HandlingError,
        }
    }
}

/// Outcome of one pass through the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub state: LoopState,
    pub next_sleep: Duration,
}
