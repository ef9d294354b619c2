//! Order records as stored by the backend.
//!
//! [`Order`] mirrors a row of the `orders` table. The client never derives
//! any of its fields: `total` in particular is taken verbatim from checkout
//! and is not recomputed from the line items.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{OrderId, ProductId};

/// Lifecycle status of an order.
///
/// Transitions are unconstrained; any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in display order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownStatus(s.to_string()))
    }
}

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Delivery,
    Pickup,
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivery => f.write_str("delivery"),
            Self::Pickup => f.write_str("pickup"),
        }
    }
}

/// A single line of an order.
///
/// `name` and `price` are snapshots taken at checkout; later catalog edits
/// do not flow back into existing orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product the line was created from.
    #[serde(rename = "id")]
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Unit price at checkout.
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_phone: String,
    #[serde(default)]
    pub customer_residence: String,
    #[serde(default)]
    pub customer_apartment: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    pub status: OrderStatus,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Set a new status and bump `updated_at`, as a local edit would.
    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Whether the record was touched after creation.
    #[must_use]
    pub fn was_updated(&self) -> bool {
        self.updated_at != self.created_at
    }
}

/// Order submission as received at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_phone: String,
    #[serde(default)]
    pub customer_residence: String,
    #[serde(default)]
    pub customer_apartment: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
}

impl NewOrder {
    /// Build a pickup order (no address needed).
    pub fn pickup(phone: impl Into<String>, items: Vec<OrderItem>, total: Decimal) -> Self {
        Self {
            customer_phone: phone.into(),
            customer_residence: String::new(),
            customer_apartment: String::new(),
            items,
            total,
            delivery_method: DeliveryMethod::Pickup,
        }
    }

    /// Check the submission against the checkout rules.
    ///
    /// # Errors
    ///
    /// Returns the first rule that is violated.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.customer_phone.trim().is_empty() {
            return Err(DomainError::MissingField {
                field: "customer_phone",
            });
        }
        if self.items.is_empty() {
            return Err(DomainError::EmptyItems);
        }
        if self.total <= Decimal::ZERO {
            return Err(DomainError::NonPositiveTotal { total: self.total });
        }
        if self.delivery_method == DeliveryMethod::Delivery
            && (self.customer_residence.trim().is_empty()
                || self.customer_apartment.trim().is_empty())
        {
            return Err(DomainError::MissingDeliveryAddress);
        }
        Ok(())
    }
}

/// Lenient timestamp (de)serialization.
///
/// The REST API returns RFC 3339 (`2024-05-01T10:00:00.123+00:00`) while
/// change-feed records may carry the Postgres text form
/// (`2024-05-01 10:00:00.123+00`). Both are accepted.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const PG_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        if let Ok(parsed) = DateTime::parse_from_str(raw, PG_FORMATS[0]) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, PG_FORMATS[1])
            .ok()
            .map(|naive| naive.and_utc())
    }
}
