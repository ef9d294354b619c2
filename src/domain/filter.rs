//! Order list filtering used by list views.

use chrono::{DateTime, Duration, Utc};

use super::order::{Order, OrderStatus};

/// Creation-date window relative to the start of the current UTC day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateRange {
    #[default]
    All,
    Today,
    /// The last seven days.
    Week,
    /// The last thirty days.
    Month,
}

impl DateRange {
    fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start_of_day = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
        match self {
            Self::All => None,
            Self::Today => Some(start_of_day),
            Self::Week => Some(start_of_day - Duration::days(7)),
            Self::Month => Some(start_of_day - Duration::days(30)),
        }
    }
}

/// Criteria for narrowing an order list.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Case-insensitive text matched against contact fields, id and item names.
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub range: DateRange,
}

impl OrderFilter {
    /// Whether `order` passes every criterion.
    #[must_use]
    pub fn matches(&self, order: &Order, now: DateTime<Utc>) -> bool {
        if let Some(status) = self.status {
            if order.status != status {
                return false;
            }
        }
        if let Some(cutoff) = self.range.cutoff(now) {
            if order.created_at < cutoff {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => Self::matches_text(order, &term.to_lowercase()),
            _ => true,
        }
    }

    /// Apply the filter, preserving the input order.
    #[must_use]
    pub fn apply<'a>(&self, orders: &'a [Order], now: DateTime<Utc>) -> Vec<&'a Order> {
        orders.iter().filter(|order| self.matches(order, now)).collect()
    }

    fn matches_text(order: &Order, term: &str) -> bool {
        let contains = |field: &str| field.to_lowercase().contains(term);
        contains(&order.customer_phone)
            || contains(&order.customer_residence)
            || contains(&order.customer_apartment)
            || contains(order.id.as_str())
            || order.items.iter().any(|item| contains(&item.name))
    }
}
