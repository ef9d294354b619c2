//! Newness highlighting and notification settings.

use std::time::Duration;

use serde::Deserialize;

/// How long freshly inserted orders stay highlighted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewnessConfig {
    /// Highlight lifetime when the order is never acknowledged (milliseconds).
    #[serde(default = "default_expiry_ms")]
    pub expiry_ms: u64,
    /// Display time after which a shown order counts as viewed (milliseconds).
    #[serde(default = "default_auto_view_ms")]
    pub auto_view_ms: u64,
}

const fn default_expiry_ms() -> u64 {
    10_000
}

const fn default_auto_view_ms() -> u64 {
    5_000
}

impl Default for NewnessConfig {
    fn default() -> Self {
        Self {
            expiry_ms: default_expiry_ms(),
            auto_view_ms: default_auto_view_ms(),
        }
    }
}

impl NewnessConfig {
    #[must_use]
    pub fn expiry(&self) -> Duration {
        Duration::from_millis(self.expiry_ms)
    }

    #[must_use]
    pub fn auto_view(&self) -> Duration {
        Duration::from_millis(self.auto_view_ms)
    }
}

/// Notification dispatch settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Log order and connection notifications.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}
