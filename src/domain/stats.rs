//! Summary counts over an order collection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::order::{Order, OrderStatus};

/// Per-status counts and revenue for the orders currently held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Sum of `total` over completed orders.
    pub revenue: Decimal,
    /// Orders created on the current UTC day.
    pub today: usize,
}

impl OrderStats {
    /// Compute statistics for `orders` relative to `now`.
    #[must_use]
    pub fn compute<'a>(orders: impl IntoIterator<Item = &'a Order>, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let mut stats = Self::default();

        for order in orders {
            stats.total += 1;
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::InProgress => stats.in_progress += 1,
                OrderStatus::Completed => {
                    stats.completed += 1;
                    stats.revenue += order.total;
                }
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
            if order.created_at.date_naive() == today {
                stats.today += 1;
            }
        }

        stats
    }
}
