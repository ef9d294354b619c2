use std::io::Write;

use tempfile::NamedTempFile;

/// Every section, with values that differ from the defaults.
pub const FULL_TOML: &str = r#"
[backend]
url = "https://shop.example.co"
schema = "shop"
table = "customer_orders"
products_table = "catalog"

[backend.http]
timeout_ms = 2000
connect_timeout_ms = 1000

[realtime]
channel = "orders-feed"
heartbeat_interval_ms = 15000
event_buffer = 64
initial_connect_delay_ms = 0

[reconnection]
base_delay_ms = 1000
max_delay_ms = 8000
max_attempts = 5

[newness]
expiry_ms = 20000
auto_view_ms = 3000

[notifications]
enabled = false

[logging]
level = "debug"
format = "json"
"#;

/// A backend nothing listens on.
pub const UNREACHABLE_TOML: &str = r#"
[backend]
url = "http://127.0.0.1:9"

[backend.http]
timeout_ms = 500
connect_timeout_ms = 200
"#;

/// Write `contents` to a temporary `.toml` file removed on drop.
pub fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("ordersync-test-")
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}
