//! Backend-agnostic domain types for the orders feed.

pub mod change;
pub mod connection;
pub mod error;
pub mod filter;
pub mod id;
pub mod order;
pub mod stats;

pub use change::ChangeEvent;
pub use connection::{ConnectionState, ConnectionStatus};
pub use filter::{DateRange, OrderFilter};
pub use id::{OrderId, ProductId};
pub use order::{DeliveryMethod, NewOrder, Order, OrderItem, OrderStatus};
pub use stats::OrderStats;
