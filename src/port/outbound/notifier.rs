//! Notifier port for order and connection events.
//!
//! The feed and the session report what happened through [`OrderNotifier`];
//! whether that becomes a log line, a toast or a push message is up to the
//! adapter.

use crate::domain::{OrderId, OrderStatus};

/// Events that can trigger notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// New pending orders arrived through the live feed.
    OrdersReceived {
        /// Number of orders in this signal.
        count: usize,
    },
    /// A remote update changed the status of an order.
    StatusChanged {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
    /// An order was deleted remotely.
    OrderDeleted { id: OrderId },
    /// Automatic reconnection gave up.
    ConnectionExhausted {
        /// Attempts made before giving up.
        attempts: u32,
    },
}

/// Trait for notification handlers.
///
/// Notifications are fire-and-forget. `notify` must return quickly; slow
/// implementations should hand the event to their own task.
pub trait OrderNotifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);

    /// Signal `count` new orders.
    fn orders_received(&self, count: usize) {
        self.notify(Event::OrdersReceived { count });
    }

    /// Signal a status transition.
    fn status_changed(&self, id: &OrderId, from: OrderStatus, to: OrderStatus) {
        self.notify(Event::StatusChanged {
            id: id.clone(),
            from,
            to,
        });
    }

    /// Signal a remote delete.
    fn order_deleted(&self, id: &OrderId) {
        self.notify(Event::OrderDeleted { id: id.clone() });
    }

    /// Signal that automatic reconnection stopped after `attempts`.
    fn connection_exhausted(&self, attempts: u32) {
        self.notify(Event::ConnectionExhausted { attempts });
    }
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
#[derive(Default)]
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn OrderNotifier>>,
}

impl NotifierRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, notifier: Box<dyn OrderNotifier>) {
        self.notifiers.push(notifier);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl OrderNotifier for NotifierRegistry {
    fn notify(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }
}

/// A no-op notifier for tests or when notifications are disabled.
pub struct NullNotifier;

impl OrderNotifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}
