use std::path::Path;

use crate::adapter::inbound::cli::{load_config, output};
use crate::error::Result;
use crate::infrastructure::config::backend::API_KEY_ENV;
use crate::infrastructure::config::settings::Config;

/// Validate the configuration file without connecting.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = load_config(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    print_summary(&config);

    if config.backend.api_key.is_some() {
        output::success("API key detected");
    } else {
        output::warning(&format!("API key not configured (set {API_KEY_ENV})"));
    }

    output::success("Configuration check complete");
    Ok(())
}

fn print_summary(config: &Config) {
    let reconnection = &config.reconnection;

    output::section("Summary");
    output::field("Backend", &config.backend.url);
    output::field(
        "Table",
        format!("{}.{}", config.backend.schema, config.backend.table),
    );
    output::field("Channel", &config.realtime.channel);
    output::field(
        "Heartbeat",
        format!("{} ms", config.realtime.heartbeat_interval_ms),
    );
    output::field(
        "Reconnect",
        format!(
            "{} attempts, {}-{} ms",
            reconnection.max_attempts, reconnection.base_delay_ms, reconnection.max_delay_ms
        ),
    );
    output::field(
        "Newness",
        format!(
            "expires {} ms, auto-view {} ms",
            config.newness.expiry_ms, config.newness.auto_view_ms
        ),
    );
    output::field(
        "Notify",
        if config.notifications.enabled {
            "enabled"
        } else {
            "disabled"
        },
    );
}
