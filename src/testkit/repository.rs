//! In-memory doubles for the REST ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::domain::{NewOrder, Order, OrderId, OrderStatus, ProductId};
use crate::error::{Error, Result};
use crate::port::{OrderRepository, ProductCatalog};

/// Order repository backed by a vector. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    orders: Arc<Mutex<Vec<Order>>>,
    failing: Arc<AtomicBool>,
    fetches: Arc<AtomicU32>,
}

impl InMemoryRepository {
    pub fn new(orders: Vec<Order>) -> Self {
        Self {
            orders: Arc::new(Mutex::new(orders)),
            ..Self::default()
        }
    }

    /// Make every call fail with a connection error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Replace the stored orders, as another client would.
    pub fn set_orders(&self, orders: Vec<Order>) {
        *self.orders.lock() = orders;
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().clone()
    }

    /// Number of `fetch_all` calls.
    pub fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Connection("backend unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn fetch_all(&self) -> Result<Vec<Order>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.orders())
    }

    async fn fetch(&self, id: &OrderId) -> Result<Option<Order>> {
        self.check()?;
        Ok(self.orders.lock().iter().find(|o| &o.id == id).cloned())
    }

    async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        self.check()?;
        let mut orders = self.orders.lock();
        let order = orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        order.set_status(status, Utc::now());
        Ok(order.clone())
    }

    async fn delete(&self, id: &OrderId) -> Result<()> {
        self.check()?;
        self.orders.lock().retain(|o| &o.id != id);
        Ok(())
    }

    async fn create(&self, new: &NewOrder) -> Result<Order> {
        self.check()?;
        new.validate()?;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(uuid::Uuid::new_v4().to_string()),
            customer_phone: new.customer_phone.clone(),
            customer_residence: new.customer_residence.clone(),
            customer_apartment: new.customer_apartment.clone(),
            items: new.items.clone(),
            total: new.total,
            delivery_method: new.delivery_method,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.orders.lock().insert(0, order.clone());
        Ok(order)
    }
}

/// Product catalog with fixed answers and a lookup counter.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    images: Arc<HashMap<ProductId, String>>,
    failing: Arc<Vec<ProductId>>,
    lookups: Arc<AtomicU32>,
}

impl StaticCatalog {
    pub fn new(images: &[(&str, &str)]) -> Self {
        Self {
            images: Arc::new(
                images
                    .iter()
                    .map(|(id, url)| (ProductId::new(*id), (*url).to_string()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Lookups for these products fail with a connection error.
    pub fn with_failures(mut self, ids: &[&str]) -> Self {
        self.failing = Arc::new(ids.iter().map(|id| ProductId::new(*id)).collect());
        self
    }

    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn product_image(&self, id: &ProductId) -> Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(id) {
            return Err(Error::Connection("catalog unavailable".into()));
        }
        Ok(self.images.get(id).cloned())
    }
}
