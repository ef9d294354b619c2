//! Orders session: wires the change stream into the store and newness set.
//!
//! [`OrdersSession::spawn`] starts two tasks: the [`ChangeStreamClient`]
//! and the session loop that applies its events. Consumers hold an
//! [`OrdersHandle`] for reads, acknowledgments, mutations and connection
//! controls. Reads take a read lock and never wait on the network.

use std::future::pending;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::newness::NewnessTracker;
use super::store::{Applied, ReconciliationStore};
use super::sync::{ChangeStreamClient, ChangeStreamHandle, ClientOptions};
use crate::domain::{
    ChangeEvent, ConnectionStatus, Order, OrderFilter, OrderId, OrderStats, OrderStatus,
};
use crate::error::Result;
use crate::infrastructure::config::newness::NewnessConfig;
use crate::infrastructure::config::settings::Config;
use crate::port::{FeedFactory, OrderNotifier, OrderRepository};

/// Tunables of an [`OrdersSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub client: ClientOptions,
    pub newness: NewnessConfig,
    /// Capacity of the client-to-session event channel.
    pub event_buffer: usize,
}

impl SessionOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: ClientOptions::from_config(config),
            newness: config.newness.clone(),
            event_buffer: config.realtime.event_buffer,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            client: ClientOptions::default(),
            newness: NewnessConfig::default(),
            event_buffer: 1024,
        }
    }
}

struct Shared {
    store: RwLock<ReconciliationStore>,
    newness: RwLock<NewnessTracker>,
    revision: watch::Sender<u64>,
    /// Wakes the session loop to recompute its newness deadline.
    wake: Notify,
}

impl Shared {
    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    async fn refresh(&self, repository: &dyn OrderRepository) -> Result<usize> {
        let orders = repository.fetch_all().await?;
        let count = orders.len();
        self.store.write().replace_all(orders);
        self.bump();
        info!(count, "Orders refreshed");
        Ok(count)
    }
}

/// Session task applying change events to the shared state.
pub struct OrdersSession {
    shared: Arc<Shared>,
    events: mpsc::Receiver<ChangeEvent>,
    repository: Arc<dyn OrderRepository>,
    notifier: Arc<dyn OrderNotifier>,
}

impl OrdersSession {
    /// Start the change stream and the session loop.
    ///
    /// The session loads the full collection first, then applies live
    /// events in arrival order. It ends when the client stops; the returned
    /// task resolves once both tasks are done.
    pub fn spawn(
        repository: Arc<dyn OrderRepository>,
        factory: FeedFactory,
        notifier: Arc<dyn OrderNotifier>,
        options: SessionOptions,
    ) -> (OrdersHandle, JoinHandle<()>) {
        let (event_tx, event_rx) = mpsc::channel(options.event_buffer.max(1));
        let (client, client_task) =
            ChangeStreamClient::spawn(factory, options.client, notifier.clone(), event_tx);
        let (revision, _) = watch::channel(0);

        let shared = Arc::new(Shared {
            store: RwLock::new(ReconciliationStore::new()),
            newness: RwLock::new(NewnessTracker::from_config(&options.newness)),
            revision,
            wake: Notify::new(),
        });

        let session = Self {
            shared: shared.clone(),
            events: event_rx,
            repository: repository.clone(),
            notifier,
        };
        let task = tokio::spawn(session.run(client_task));

        (
            OrdersHandle {
                shared,
                client,
                repository,
            },
            task,
        )
    }

    async fn run(mut self, client_task: JoinHandle<()>) {
        if let Err(e) = self.shared.refresh(self.repository.as_ref()).await {
            warn!(error = %e, "Initial order fetch failed");
        }

        loop {
            let deadline = self.shared.newness.read().next_deadline();
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => self.apply(event),
                    None => break,
                },
                () = sleep_until_opt(deadline) => self.expire_newness(),
                () = self.shared.wake.notified() => {}
            }
        }

        if let Err(e) = client_task.await {
            warn!(error = %e, "Change stream client task failed");
        }
        debug!("Orders session stopped");
    }

    fn apply(&self, event: ChangeEvent) {
        let now = Instant::now();
        let transition = event.status_transition();

        match event {
            ChangeEvent::Insert(order) => {
                let id = order.id.clone();
                let pending = order.is_pending();
                let applied = self.shared.store.write().apply_insert(order);
                if applied == Applied::Replaced {
                    debug!(order_id = id.short(), "Insert for known order replaced it");
                }
                // The initial snapshot may already hold the row.
                if pending && self.shared.newness.write().track(id.clone(), now) {
                    info!(order_id = id.short(), "New order received");
                    self.notifier.orders_received(1);
                }
            }
            ChangeEvent::Update { new, .. } => {
                let id = new.id.clone();
                match self.shared.store.write().apply_update(new) {
                    Applied::Ignored => debug!(order_id = id.short(), "Update for unknown order ignored"),
                    _ => {
                        if let Some((from, to)) = transition {
                            info!(order_id = id.short(), %from, %to, "Order status changed");
                            self.notifier.status_changed(&id, from, to);
                        }
                    }
                }
            }
            ChangeEvent::Delete { id } => {
                let applied = self.shared.store.write().apply_delete(&id);
                self.shared.newness.write().mark_seen(&id);
                if applied == Applied::Removed {
                    info!(order_id = id.short(), "Order deleted");
                    self.notifier.order_deleted(&id);
                }
            }
        }

        self.shared.bump();
    }

    fn expire_newness(&self) {
        let expired = self.shared.newness.write().expire(Instant::now());
        if !expired.is_empty() {
            debug!(count = expired.len(), "New-order highlights expired");
            self.shared.bump();
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

/// Consumer handle to a running [`OrdersSession`]. Cheap to clone.
#[derive(Clone)]
pub struct OrdersHandle {
    shared: Arc<Shared>,
    client: ChangeStreamHandle,
    repository: Arc<dyn OrderRepository>,
}

impl OrdersHandle {
    // -- reads --------------------------------------------------------------

    /// Snapshot of the collection, newest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.shared.store.read().orders().to_vec()
    }

    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<Order> {
        self.shared.store.read().get(id).cloned()
    }

    /// Orders passing `filter`, newest first.
    #[must_use]
    pub fn filtered(&self, filter: &OrderFilter) -> Vec<Order> {
        let store = self.shared.store.read();
        filter
            .apply(store.orders(), Utc::now())
            .into_iter()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.store.read().pending_count()
    }

    #[must_use]
    pub fn stats(&self) -> OrderStats {
        self.shared.store.read().stats(Utc::now())
    }

    /// Ids still highlighted as new, oldest first.
    #[must_use]
    pub fn new_order_ids(&self) -> Vec<OrderId> {
        self.shared.newness.read().ids()
    }

    #[must_use]
    pub fn is_new(&self, id: &OrderId) -> bool {
        self.shared.newness.read().is_new(id)
    }

    #[must_use]
    pub fn connection(&self) -> ConnectionStatus {
        self.client.status()
    }

    #[must_use]
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionStatus> {
        self.client.watch()
    }

    /// Receiver whose value increments on every state change.
    #[must_use]
    pub fn changed(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    // -- acknowledgments ------------------------------------------------------

    /// Drop the new-order highlight right away. Returns whether it was set.
    pub fn mark_order_as_seen(&self, id: &OrderId) -> bool {
        let removed = self.shared.newness.write().mark_seen(id);
        if removed {
            self.shared.bump();
        }
        removed
    }

    /// Open an order's details, which acknowledges it.
    pub fn view_order(&self, id: &OrderId) -> Option<Order> {
        self.mark_order_as_seen(id);
        self.order(id)
    }

    /// Report orders as on screen; highlighted ones count as seen after
    /// the auto-view delay.
    pub fn displayed(&self, ids: &[OrderId]) {
        let now = Instant::now();
        let scheduled = {
            let mut newness = self.shared.newness.write();
            ids.iter().filter(|id| newness.displayed(id, now)).count()
        };
        if scheduled > 0 {
            self.shared.wake.notify_one();
        }
    }

    // -- mutations ------------------------------------------------------------

    /// Apply a local edit immediately. The confirming server event later
    /// re-applies the same state.
    pub fn optimistic_set<F>(&self, mutator: F)
    where
        F: FnOnce(&mut Vec<Order>),
    {
        self.shared.store.write().optimistic_set(mutator);
        self.shared.bump();
    }

    /// Persist a status change, then apply it locally.
    ///
    /// Setting the status an order already has is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the backend error; local state is untouched in that case.
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<()> {
        let current = self.shared.store.read().get(id).map(|order| order.status);
        if current == Some(status) {
            debug!(order_id = id.short(), %status, "Status unchanged");
            return Ok(());
        }

        self.repository.update_status(id, status).await?;

        let now = Utc::now();
        self.optimistic_set(|orders| {
            if let Some(order) = orders.iter_mut().find(|order| &order.id == id) {
                order.set_status(status, now);
            }
        });
        info!(order_id = id.short(), %status, "Order status updated");
        Ok(())
    }

    /// Delete an order on the backend, then locally.
    ///
    /// # Errors
    ///
    /// Returns the backend error; local state is untouched in that case.
    pub async fn delete_order(&self, id: &OrderId) -> Result<()> {
        self.repository.delete(id).await?;

        self.shared.newness.write().mark_seen(id);
        self.optimistic_set(|orders| orders.retain(|order| &order.id != id));
        info!(order_id = id.short(), "Order deleted");
        Ok(())
    }

    /// Reload the whole collection from the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error; local state is untouched in that case.
    pub async fn refresh(&self) -> Result<usize> {
        self.shared.refresh(self.repository.as_ref()).await
    }

    // -- connection -----------------------------------------------------------

    pub fn connect(&self) {
        self.client.connect();
    }

    pub fn disconnect(&self) {
        self.client.disconnect();
    }

    pub fn manual_reconnect(&self) {
        self.client.manual_reconnect();
    }

    pub fn network_online(&self) {
        self.client.network_online();
    }

    pub fn network_offline(&self) {
        self.client.network_offline();
    }

    pub fn visibility_regained(&self) {
        self.client.visibility_regained();
    }

    /// Stop the client; the session loop follows once its queue drains.
    pub fn shutdown(&self) {
        self.client.shutdown();
    }
}
