//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::infrastructure::config::realtime::ReconnectionConfig;
use crate::infrastructure::config::settings::Config;

/// The default retry policy (3 s base, 30 s cap, 10 attempts).
///
/// Tests run on paused tokio time, so real delays cost nothing.
pub fn reconnection() -> ReconnectionConfig {
    ReconnectionConfig::default()
}

/// A valid configuration pointing at a local backend.
pub fn config() -> Config {
    let mut config = Config::default();
    config.backend.url = "http://localhost:54321".into();
    config.backend.api_key = Some("test-key".into());
    config
}

/// Minimal TOML accepted by [`Config::parse_toml`].
pub const MINIMAL_TOML: &str = r#"
[backend]
url = "http://localhost:54321"
"#;
