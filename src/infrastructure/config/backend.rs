//! Backend (REST + realtime) endpoint configuration.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::Result;

/// Environment variable holding the backend API key.
pub const API_KEY_ENV: &str = "ORDERSYNC_API_KEY";

/// Realtime protocol version requested on the websocket URL.
const REALTIME_VSN: &str = "1.0.0";

/// Backend project configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: String,
    /// Database schema holding the orders table.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Orders table name.
    #[serde(default = "default_table")]
    pub table: String,
    /// Products table used for image lookups.
    #[serde(default = "default_products_table")]
    pub products_table: String,
    /// HTTP client settings for REST calls.
    #[serde(default)]
    pub http: HttpConfig,
    /// API key, loaded from `ORDERSYNC_API_KEY` (never from the config file).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_schema() -> String {
    "public".into()
}

fn default_table() -> String {
    "orders".into()
}

fn default_products_table() -> String {
    "products".into()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            schema: default_schema(),
            table: default_table(),
            products_table: default_products_table(),
            http: HttpConfig::default(),
            api_key: None,
        }
    }
}

impl BackendConfig {
    /// Base URL of the PostgREST API (`{url}/rest/v1`).
    pub fn rest_url(&self) -> Result<Url> {
        Ok(self.base_url()?.join("rest/v1/")?)
    }

    /// Websocket URL of the realtime endpoint, with key and protocol version.
    pub fn realtime_url(&self) -> Result<Url> {
        let mut url = self.base_url()?.join("realtime/v1/websocket")?;
        let scheme = if url.scheme() == "http" { "ws" } else { "wss" };
        // http(s) -> ws(s) is always a valid scheme change.
        let _ = url.set_scheme(scheme);
        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = &self.api_key {
                query.append_pair("apikey", key);
            }
            query.append_pair("vsn", REALTIME_VSN);
        }
        Ok(url)
    }

    /// Backend URL as a directory, so joins keep any base path.
    fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}/", self.url.trim_end_matches('/')))?)
    }
}

/// HTTP client timeouts.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Total request timeout (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connection establishment timeout (milliseconds).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_connect_timeout_ms() -> u64 {
    5_000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
