//! Connection status published by the push source.
//!
//! The list view shows this next to the job table so the user can tell a
//! quiet list from a dead channel.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// First connection attempt in progress.
    #[default]
    Connecting,
    /// Handshake done; updates are flowing.
    Connected,
    /// The connection dropped or failed; retrying with backoff.
    Reconnecting { attempt: u32 },
    /// The push source has been torn down.
    Stopped,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => f.write_str("connecting"),
            ConnectionStatus::Connected => f.write_str("live"),
            ConnectionStatus::Reconnecting { attempt } => {
                write!(f, "reconnecting (attempt {attempt})")
            }
            ConnectionStatus::Stopped => f.write_str("stopped"),
        }
    }
}

/// Progress of the activation fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// The first fetch has not completed yet.
    #[default]
    Loading,
    /// The first snapshot has been applied to the registry.
    Loaded { count: usize },
    /// The first fetch failed; polling keeps trying.
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}
