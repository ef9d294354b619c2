//! Product catalog lookups.

use async_trait::async_trait;

use crate::domain::ProductId;
use crate::error::Result;

/// Read access to product metadata referenced by order lines.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Image URL of a product; `None` if the product is unknown or has none.
    async fn product_image(&self, id: &ProductId) -> Result<Option<String>>;
}
