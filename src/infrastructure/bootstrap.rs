//! Composition root: builds adapters from configuration and wires sessions.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapter::outbound::notifier::LogNotifier;
use crate::adapter::outbound::realtime::RealtimeFeed;
use crate::adapter::outbound::rest::RestClient;
use crate::application::cache::ProductImageCache;
use crate::application::{OrdersHandle, OrdersSession, SessionOptions};
use crate::error::Result;
use crate::infrastructure::config::backend::API_KEY_ENV;
use crate::infrastructure::config::settings::Config;
use crate::port::{FeedFactory, NotifierRegistry, NullNotifier, OrderNotifier};

/// Build the notifier chain from configuration.
pub fn build_notifier(config: &Config) -> Arc<dyn OrderNotifier> {
    if !config.notifications.enabled {
        info!("Notifications disabled");
        return Arc::new(NullNotifier);
    }
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier::new()));
    Arc::new(registry)
}

/// REST client for the configured backend.
///
/// # Errors
///
/// Returns an error if the backend URL is invalid.
pub fn rest_client(config: &Config) -> Result<Arc<RestClient>> {
    if config.backend.api_key.is_none() {
        warn!(env = API_KEY_ENV, "API key not set; requests are unauthenticated");
    }
    Ok(Arc::new(RestClient::from_config(&config.backend)?))
}

/// Factory for realtime subscriptions to the configured backend.
///
/// # Errors
///
/// Returns an error if the realtime URL cannot be derived.
pub fn feed_factory(config: &Config) -> Result<FeedFactory> {
    RealtimeFeed::factory(config)
}

/// Image cache backed by the products table.
#[must_use]
pub fn image_cache(rest: Arc<RestClient>) -> ProductImageCache {
    ProductImageCache::new(rest)
}

/// Start a live orders session against the configured backend.
///
/// The session loads the collection and connects on its own.
///
/// # Errors
///
/// Returns an error if the adapters cannot be built from `config`.
pub fn start_session(config: &Config) -> Result<(OrdersHandle, JoinHandle<()>)> {
    let rest = rest_client(config)?;
    let factory = feed_factory(config)?;
    let notifier = build_notifier(config);

    info!(
        table = %config.backend.table,
        channel = %config.realtime.channel,
        "Starting orders session"
    );
    Ok(OrdersSession::spawn(
        rest,
        factory,
        notifier,
        SessionOptions::from_config(config),
    ))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::testkit::config::config;

    #[test]
    fn invalid_url_is_rejected() {
        let mut config = config();
        config.backend.url = "not a url".into();
        assert!(rest_client(&config).is_err());
        assert!(feed_factory(&config).is_err());
    }

    #[test]
    fn factory_yields_realtime_feeds() {
        let factory = feed_factory(&config()).unwrap();
        assert_eq!(factory().name(), "realtime");
    }

    #[test]
    fn disabled_notifications_build_null_notifier() {
        let mut config = config();
        config.notifications.enabled = false;
        // Must not panic or log.
        build_notifier(&config).orders_received(1);
    }

    #[tokio::test]
    async fn session_against_unreachable_backend_shuts_down() {
        let mut config = config();
        config.backend.url = "http://127.0.0.1:9".into();
        let (handle, task) = start_session(&config).unwrap();

        handle.shutdown();
        timeout(Duration::from_secs(10), task)
            .await
            .expect("session did not stop")
            .unwrap();
        assert!(handle.orders().is_empty());
    }
}
