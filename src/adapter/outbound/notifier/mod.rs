//! Notification adapters.
//!
//! Implements the [`OrderNotifier`](crate::port::OrderNotifier) port.

mod log;

pub use log::LogNotifier;
