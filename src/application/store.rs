//! Canonical in-memory copy of the orders collection.
//!
//! The store is a cache, never the source of truth: every confirmed server
//! event overwrites local state, and a later refresh replaces it wholesale.

use chrono::{DateTime, Utc};

use crate::domain::{ChangeEvent, Order, OrderId, OrderStats};

/// Outcome of applying a change to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new order was added.
    Inserted,
    /// An existing order was overwritten.
    Replaced,
    /// An order was removed.
    Removed,
    /// Nothing matched; the store is unchanged.
    Ignored,
}

/// Ordered collection of orders, newest first.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationStore {
    orders: Vec<Order>,
}

impl ReconciliationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a normalized change event.
    pub fn apply(&mut self, event: ChangeEvent) -> Applied {
        match event {
            ChangeEvent::Insert(order) => self.apply_insert(order),
            ChangeEvent::Update { new, .. } => self.apply_update(new),
            ChangeEvent::Delete { id } => self.apply_delete(&id),
        }
    }

    /// Prepend a new order. An insert for a known id replaces it in place.
    pub fn apply_insert(&mut self, order: Order) -> Applied {
        match self.position(&order.id) {
            Some(idx) => {
                self.orders[idx] = order;
                Applied::Replaced
            }
            None => {
                self.orders.insert(0, order);
                Applied::Inserted
            }
        }
    }

    /// Overwrite the order with the same id. Unknown ids are ignored.
    pub fn apply_update(&mut self, order: Order) -> Applied {
        match self.position(&order.id) {
            Some(idx) => {
                self.orders[idx] = order;
                Applied::Replaced
            }
            None => Applied::Ignored,
        }
    }

    /// Remove an order. Removing an unknown id is a no-op.
    pub fn apply_delete(&mut self, id: &OrderId) -> Applied {
        match self.position(id) {
            Some(idx) => {
                self.orders.remove(idx);
                Applied::Removed
            }
            None => Applied::Ignored,
        }
    }

    /// Apply a local edit right away, ahead of the confirming server event.
    pub fn optimistic_set<F>(&mut self, mutator: F)
    where
        F: FnOnce(&mut Vec<Order>),
    {
        mutator(&mut self.orders);
    }

    /// Replace the whole collection, sorted newest first.
    pub fn replace_all(&mut self, mut orders: Vec<Order>) {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.orders = orders;
    }

    /// Number of orders with status `pending`, computed on read.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.orders.iter().filter(|order| order.is_pending()).count()
    }

    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| &order.id == id)
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[must_use]
    pub fn stats(&self, now: DateTime<Utc>) -> OrderStats {
        OrderStats::compute(&self.orders, now)
    }

    fn position(&self, id: &OrderId) -> Option<usize> {
        self.orders.iter().position(|order| &order.id == id)
    }
}
