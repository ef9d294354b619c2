//! Realtime channel and reconnection configuration.

use std::time::Duration;

use serde::Deserialize;

/// Live change-feed settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Channel topic joined on the realtime socket.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Keepalive and staleness check period (milliseconds).
    ///
    /// A connection with no activity for twice this period is stale.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Capacity of the normalized event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Delay before the first connection attempt after start (milliseconds).
    #[serde(default = "default_initial_connect_delay_ms")]
    pub initial_connect_delay_ms: u64,
}

fn default_channel() -> String {
    "admin-orders-changes".into()
}

const fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

const fn default_event_buffer() -> usize {
    1024
}

const fn default_initial_connect_delay_ms() -> u64 {
    100
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            event_buffer: default_event_buffer(),
            initial_connect_delay_ms: default_initial_connect_delay_ms(),
        }
    }
}

impl RealtimeConfig {
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    #[must_use]
    pub fn initial_connect_delay(&self) -> Duration {
        Duration::from_millis(self.initial_connect_delay_ms)
    }
}

/// Automatic reconnection policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectionConfig {
    /// Delay before the first retry (milliseconds); doubles per attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for a single retry delay (milliseconds).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Automatic attempts before giving up until a manual reconnect.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

const fn default_base_delay_ms() -> u64 {
    3_000
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

const fn default_max_attempts() -> u32 {
    10
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}
