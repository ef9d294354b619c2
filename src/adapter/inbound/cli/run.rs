//! Handler for the `run` command.

use std::collections::HashSet;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::application::OrdersHandle;
use crate::domain::{ConnectionStatus, OrderId};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::logging::LogFormat;
use crate::infrastructure::config::settings::Config;

/// Execute the run command.
///
/// Follows the live feed until Ctrl-C, printing connection transitions and
/// newly arrived orders. Lines typed on stdin control the session, see
/// [`Control`].
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs || output::is_json() {
        config.logging.format = LogFormat::Json;
    }
    config.logging.init();

    print_startup(&config);

    let (handle, task) = bootstrap::start_session(&config)?;
    follow(&handle).await;

    info!("Shutting down");
    handle.shutdown();
    if let Err(e) = task.await {
        warn!(error = %e, "Orders session task failed");
    }
    output::success("Stopped");
    Ok(())
}

fn print_startup(config: &Config) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Backend", &config.backend.url);
    output::field("Table", &config.backend.table);
    if output::verbosity() > 0 {
        output::field("Channel", &config.realtime.channel);
        output::field(
            "Heartbeat",
            format!("{} ms", config.realtime.heartbeat_interval_ms),
        );
    }
    if !config.notifications.enabled {
        output::warning("Notifications disabled");
    }
    output::note(CONTROL_HELP);
}

const CONTROL_HELP: &str = "Type r to reconnect, f to refresh, s for status, then Enter";

/// Interactive command read from stdin while following.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    /// Reset the retry budget and reconnect now.
    Reconnect,
    /// Reload the whole collection.
    Refresh,
    Status,
    Help,
}

impl Control {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "reconnect" => Some(Self::Reconnect),
            "f" | "refresh" => Some(Self::Refresh),
            "s" | "status" => Some(Self::Status),
            "h" | "?" | "help" => Some(Self::Help),
            _ => None,
        }
    }
}

async fn handle_control(handle: &OrdersHandle, control: Control) {
    match control {
        Control::Reconnect => {
            info!("Manual reconnect from console");
            output::event(&timestamp(), "connection", "reconnecting");
            handle.manual_reconnect();
        }
        Control::Refresh => match handle.refresh().await {
            Ok(count) => {
                output::event(&timestamp(), "refresh", &format!("{count} orders loaded"));
                output::field("Pending", handle.pending_count());
            }
            Err(e) => output::warning(&format!("Refresh failed: {e}")),
        },
        Control::Status => {
            let status = handle.connection();
            output::field("Connection", output::connection(status.state));
            output::field("Attempts", status.reconnect_attempts);
            output::field("Orders", handle.orders().len());
            output::field("Pending", handle.pending_count());
            output::field("New", handle.new_order_ids().len());
        }
        Control::Help => output::note(CONTROL_HELP),
    }
}

async fn follow(handle: &OrdersHandle) {
    let mut connection = handle.watch_connection();
    let mut changes = handle.changed();
    let mut announced: HashSet<OrderId> = HashSet::new();
    let mut last = connection.borrow_and_update().clone();

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = input.next_line(), if input_open => match line {
                Ok(Some(line)) => match Control::parse(&line) {
                    Some(control) => handle_control(handle, control).await,
                    None if line.trim().is_empty() => {}
                    None => output::note(CONTROL_HELP),
                },
                // Detached or closed stdin leaves the feed running.
                Ok(None) | Err(_) => input_open = false,
            },
            result = connection.changed() => {
                if result.is_err() {
                    break;
                }
                let status = connection.borrow_and_update().clone();
                print_transition(&last, &status);
                last = status;
            }
            result = changes.changed() => {
                if result.is_err() {
                    break;
                }
                changes.borrow_and_update();
                announce_new_orders(handle, &mut announced);
            }
        }
    }
}

fn print_transition(previous: &ConnectionStatus, current: &ConnectionStatus) {
    if previous.state == current.state && previous.retries_exhausted == current.retries_exhausted
    {
        return;
    }

    let mut message = output::connection(current.state);
    if current.reconnect_attempts > 0 && !current.is_connected() {
        message = format!("{message} (attempt {})", current.reconnect_attempts);
    }
    output::event(&timestamp(), "connection", &message);

    if current.retries_exhausted {
        output::warning("Automatic reconnection gave up; type r to reconnect");
    }
}

fn announce_new_orders(handle: &OrdersHandle, announced: &mut HashSet<OrderId>) {
    let current = handle.new_order_ids();
    let mut shown = Vec::new();

    for id in &current {
        if announced.contains(id) {
            continue;
        }
        if let Some(order) = handle.order(id) {
            let message = format!(
                "#{} {} {} ({} items)",
                order.id.short(),
                order.customer_phone,
                output::highlight(order.total),
                order.total_quantity()
            );
            output::event(&timestamp(), "new order", &message);
            shown.push(id.clone());
        }
    }

    // Forget ids that are no longer new so a re-insert is announced again.
    announced.retain(|id| current.contains(id));

    if !shown.is_empty() {
        announced.extend(shown.iter().cloned());
        handle.displayed(&shown);
        output::field("Pending", handle.pending_count());
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
