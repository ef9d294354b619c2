use std::path::Path;
use std::time::Duration;

use tokio::time::timeout;

use crate::adapter::inbound::cli::{load_config, output};
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap;
use crate::port::{ChangeFilter, FeedSignal, OrderRepository, SubscriptionStatus};

/// Test REST and realtime connectivity to the backend.
pub async fn execute_connection<P: AsRef<Path>>(config_path: P, wait_secs: u64) -> Result<()> {
    let config = load_config(config_path.as_ref())?;

    output::section("Connection Check");
    output::field("Backend", &config.backend.url);
    output::field("Channel", &config.realtime.channel);

    let rest = bootstrap::rest_client(&config)?;
    let pb = output::spinner("Querying REST API");
    match rest.fetch_all().await {
        Ok(orders) => output::spinner_success(
            &pb,
            &format!("REST API reachable ({} orders)", orders.len()),
        ),
        Err(e) => {
            output::spinner_fail(&pb, "REST API check failed");
            return Err(e);
        }
    }

    let pb = output::spinner("Joining realtime channel");
    let factory = bootstrap::feed_factory(&config)?;
    let mut feed = factory();
    let filter = ChangeFilter::all(&config.backend.schema, &config.backend.table);
    if let Err(e) = feed.subscribe(&filter).await {
        output::spinner_fail(&pb, "Could not open realtime socket");
        return Err(e);
    }

    let confirmed = timeout(Duration::from_secs(wait_secs), async {
        loop {
            match feed.next_signal().await {
                Some(FeedSignal::Status(SubscriptionStatus::Subscribed)) => return Ok(()),
                Some(FeedSignal::Status(status)) => return Err(status.to_string()),
                Some(_) => continue,
                None => return Err("socket closed".to_string()),
            }
        }
    })
    .await;
    feed.unsubscribe().await;

    match confirmed {
        Ok(Ok(())) => output::spinner_success(&pb, "Realtime subscription confirmed"),
        Ok(Err(reason)) => {
            output::spinner_fail(&pb, "Realtime subscription failed");
            return Err(Error::Connection(reason));
        }
        Err(_) => {
            output::spinner_fail(&pb, "Realtime subscription not confirmed in time");
            return Err(Error::Connection(format!(
                "no subscription confirmation within {wait_secs}s"
            )));
        }
    }

    output::success("Connection checks passed");
    Ok(())
}
