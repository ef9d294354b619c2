//! Connection state of the live order feed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of the change-stream subscription.
///
/// ```text
/// Disconnected -> Connecting -> Connected
/// Connecting | Connected -> Error -> Connecting (scheduled retry)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    /// True while a subscription is being opened or is live.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Observable snapshot of the connection published to consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Automatic reconnect attempts since the last successful subscription.
    pub reconnect_attempts: u32,
    /// Last received event or confirmed heartbeat.
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Last received data event.
    pub last_change: Option<DateTime<Utc>>,
    /// Set when automatic retries gave up; cleared by a manual reconnect.
    pub retries_exhausted: bool,
}

impl ConnectionStatus {
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}
