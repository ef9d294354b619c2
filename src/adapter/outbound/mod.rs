//! Outbound adapters (driven side).

pub mod notifier;
pub mod realtime;
pub mod rest;
