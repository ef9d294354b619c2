//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`feed`] - Mock [`ChangeFeed`](crate::port::ChangeFeed) implementations:
//!   `ScriptedFeed`, `ChannelFeed`, and their factories.
//! - [`domain`] - Builders for orders, items and feed rows.
//! - [`config`] - Canonical test configurations.
//! - [`repository`] - In-memory `OrderRepository` and `ProductCatalog`.
//! - [`notifier`] - Recording notifier.

pub mod config;
pub mod domain;
pub mod feed;
pub mod notifier;
pub mod repository;
