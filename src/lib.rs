//! Ordersync - live, reconciled order feed for a store admin backend.
//!
//! Keeps an in-memory copy of the backend's `orders` table in sync through
//! a realtime change feed, highlights newly arrived orders and exposes the
//! collection to an operator CLI.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Orders, change events, connection status, filters and stats
//! - [`port`] - Traits for the change feed, repository, catalog and notifier
//! - [`application`] - Reconnecting stream client, reconciliation store,
//!   newness tracking and the orders session that ties them together
//! - [`adapter`] - Realtime (Phoenix channel) feed, REST client, log
//!   notifier and the command-line interface
//! - [`infrastructure`] - Configuration loading and wiring
//!
//! # Example
//!
//! ```no_run
//! use ordersync::infrastructure::bootstrap;
//! use ordersync::infrastructure::config::settings::Config;
//!
//! # async fn demo() -> ordersync::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let (orders, task) = bootstrap::start_session(&config)?;
//! println!("{} pending", orders.pending_count());
//! orders.shutdown();
//! let _ = task.await;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
