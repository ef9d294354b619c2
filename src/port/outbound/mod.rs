//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the backend the client talks to: the live
//! change feed, order persistence, the product catalog and notifications.

pub mod catalog;
pub mod feed;
pub mod notifier;
pub mod store;
