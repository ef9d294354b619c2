//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │  Feed   │            │ Repository  │              │ Notifier  │
//! │ Adapter │            │   Adapter   │              │  Adapter  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! - [`ChangeFeed`] / [`FeedFactory`] - live change subscription
//! - [`OrderRepository`] - order persistence
//! - [`ProductCatalog`] - product metadata for order lines
//! - [`OrderNotifier`] - event notifications

pub mod outbound;

pub use outbound::catalog::ProductCatalog;
pub use outbound::feed::{
    ChangeFeed, ChangeFilter, ChangeKind, EventFilter, FeedFactory, FeedSignal, RawChange,
    SubscriptionStatus,
};
pub use outbound::notifier::{Event, NotifierRegistry, NullNotifier, OrderNotifier};
pub use outbound::store::OrderRepository;
