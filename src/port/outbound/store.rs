//! Order persistence port.

use async_trait::async_trait;

use crate::domain::{NewOrder, Order, OrderId, OrderStatus};
use crate::error::Result;

/// CRUD access to the orders collection of the backend.
///
/// The live feed only needs [`fetch_all`](Self::fetch_all); the mutations
/// exist so that local optimistic edits have a confirmed counterpart.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Fetch the full collection. Ordering is not guaranteed.
    async fn fetch_all(&self) -> Result<Vec<Order>>;

    /// Fetch a single order, `None` if it does not exist.
    async fn fetch(&self, id: &OrderId) -> Result<Option<Order>>;

    /// Set the status of an order and return the stored record.
    async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order>;

    /// Delete an order.
    async fn delete(&self, id: &OrderId) -> Result<()>;

    /// Validate and create an order with status `pending`.
    async fn create(&self, order: &NewOrder) -> Result<Order>;
}
