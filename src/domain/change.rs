//! Normalized change events for the orders collection.

use super::id::OrderId;
use super::order::{Order, OrderStatus};

/// One confirmed server-side change to the orders collection.
///
/// Events carry no sequence number; they are applied in the order the
/// transport delivers them and the last write for an id wins.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A new order was created.
    Insert(Order),
    /// An existing order was modified. Both snapshots are always present.
    Update {
        /// Record after the change.
        new: Order,
        /// Record before the change.
        old: Order,
    },
    /// An order was removed. Only the identity of the old record survives.
    Delete {
        /// Identifier of the removed order.
        id: OrderId,
    },
}

impl ChangeEvent {
    /// Identifier of the order the event refers to.
    #[must_use]
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Insert(order) => &order.id,
            Self::Update { new, .. } => &new.id,
            Self::Delete { id } => id,
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// For updates, the status transition if the status changed.
    #[must_use]
    pub fn status_transition(&self) -> Option<(OrderStatus, OrderStatus)> {
        match self {
            Self::Update { new, old } if new.status != old.status => Some((old.status, new.status)),
            _ => None,
        }
    }
}
