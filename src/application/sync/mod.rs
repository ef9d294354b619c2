//! Live synchronization with the backend change feed.
//!
//! - [`client`] - connection lifecycle, backoff and heartbeat monitoring
//! - [`normalize`] - raw feed records to [`ChangeEvent`](crate::domain::ChangeEvent)s
//! - [`backoff`] - retry schedule

pub mod backoff;
pub mod client;
pub mod normalize;

pub use backoff::Backoff;
pub use client::{ChangeStreamClient, ChangeStreamHandle, ClientOptions};
pub use normalize::{normalize, NormalizeError};
