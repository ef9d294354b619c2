//! Request and response bodies of the REST (PostgREST) API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{NewOrder, OrderStatus};

/// `PATCH` body for a status change.
#[derive(Debug, Serialize)]
pub struct StatusPatch {
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

/// `POST` body for a new order; the row starts out pending.
#[derive(Debug, Serialize)]
pub struct NewOrderRow<'a> {
    #[serde(flatten)]
    pub order: &'a NewOrder,
    pub status: OrderStatus,
}

impl<'a> NewOrderRow<'a> {
    pub fn pending(order: &'a NewOrder) -> Self {
        Self {
            order,
            status: OrderStatus::Pending,
        }
    }
}

/// Projection of a products row used for image lookups.
#[derive(Debug, Deserialize)]
pub struct ProductImageRow {
    #[serde(default)]
    pub image: Option<String>,
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ApiErrorBody {
    /// Human-readable message, falling back to `raw`.
    pub fn describe(&self, raw: &str) -> String {
        let mut message = self.message.clone().unwrap_or_else(|| raw.to_string());
        if let Some(code) = &self.code {
            message = format!("{message} [{code}]");
        }
        if let Some(hint) = &self.hint {
            message = format!("{message} (hint: {hint})");
        }
        message
    }
}
