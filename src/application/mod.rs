//! Application services.
//!
//! These services own the in-memory view of the orders collection and
//! coordinate the outbound ports that keep it current.

pub mod cache;
pub mod newness;
pub mod session;
pub mod store;
pub mod sync;

pub use newness::NewnessTracker;
pub use session::{OrdersHandle, OrdersSession, SessionOptions};
pub use store::{Applied, ReconciliationStore};
pub use sync::{ChangeStreamClient, ChangeStreamHandle, ClientOptions};
