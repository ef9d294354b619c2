//! Notifier that writes events to the tracing log.

use tracing::{error, info};

use crate::port::{Event, OrderNotifier};

/// Turns notifications into log lines, one per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Text shown for `event`.
    #[must_use]
    pub fn message(event: &Event) -> String {
        match event {
            Event::OrdersReceived { count: 1 } => "New order received".to_string(),
            Event::OrdersReceived { count } => format!("{count} new orders received"),
            Event::StatusChanged { id, to, .. } => {
                format!("Order #{} status changed to {to}", id.short())
            }
            Event::OrderDeleted { id } => format!("Order #{} was deleted", id.short()),
            Event::ConnectionExhausted { attempts } => {
                format!("Failed to reconnect after {attempts} attempts; reconnect manually")
            }
        }
    }
}

impl OrderNotifier for LogNotifier {
    fn notify(&self, event: Event) {
        let message = Self::message(&event);
        match event {
            Event::ConnectionExhausted { attempts } => {
                error!(target: "ordersync::notify", attempts, "{message}");
            }
            Event::StatusChanged { from, to, .. } => {
                info!(target: "ordersync::notify", %from, %to, "{message}");
            }
            Event::OrdersReceived { .. } | Event::OrderDeleted { .. } => {
                info!(target: "ordersync::notify", "{message}");
            }
        }
    }
}
