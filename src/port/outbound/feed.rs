//! Change-feed port for server-pushed collection changes.
//!
//! A [`ChangeFeed`] is one subscription to a change-data-capture style
//! feed. It reports its own lifecycle through [`SubscriptionStatus`]
//! signals and delivers raw record snapshots; normalization into domain
//! events happens in the application layer.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Kind of row change reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Which change kinds a subscription asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventFilter {
    #[default]
    All,
    Only(ChangeKind),
}

impl EventFilter {
    /// Wire form used by Postgres-changes style feeds (`*`, `INSERT`, ...).
    #[must_use]
    pub const fn as_wire(&self) -> &'static str {
        match self {
            Self::All => "*",
            Self::Only(ChangeKind::Insert) => "INSERT",
            Self::Only(ChangeKind::Update) => "UPDATE",
            Self::Only(ChangeKind::Delete) => "DELETE",
        }
    }
}

/// Subscription target: one table and the change kinds of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    pub schema: String,
    pub table: String,
    pub events: EventFilter,
}

impl ChangeFilter {
    /// All changes to `schema.table`.
    pub fn all(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            events: EventFilter::All,
        }
    }
}

/// A raw change as delivered by the transport.
///
/// Either snapshot may be absent depending on the change kind and on how
/// much of the old row the backend is configured to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChange {
    pub kind: ChangeKind,
    pub new: Option<serde_json::Value>,
    pub old: Option<serde_json::Value>,
}

/// Terminal and non-terminal states of a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// The server confirmed the subscription.
    Subscribed,
    /// The server rejected the subscription or the channel failed.
    ChannelError(String),
    /// The join request was not answered in time.
    TimedOut,
    /// The channel or the underlying socket was closed.
    Closed,
}

impl SubscriptionStatus {
    /// Whether this status ends the subscription.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::Subscribed)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribed => f.write_str("SUBSCRIBED"),
            Self::ChannelError(reason) => write!(f, "CHANNEL_ERROR ({reason})"),
            Self::TimedOut => f.write_str("TIMED_OUT"),
            Self::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Anything a subscription can yield.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSignal {
    Status(SubscriptionStatus),
    Change(RawChange),
    /// The server acknowledged a keepalive.
    Heartbeat,
}

/// One live subscription to a change feed.
///
/// Implementations are single-use: a failed or closed subscription is
/// discarded and a fresh one is obtained from a [`FeedFactory`].
#[async_trait]
pub trait ChangeFeed: Send {
    /// Open the transport and request the subscription.
    ///
    /// Returning `Ok` only means the request was sent; confirmation arrives
    /// later as `FeedSignal::Status(SubscriptionStatus::Subscribed)`.
    async fn subscribe(&mut self, filter: &ChangeFilter) -> Result<()>;

    /// Receive the next signal. `None` means the transport ended.
    async fn next_signal(&mut self) -> Option<FeedSignal>;

    /// Leave the subscription and release the transport.
    async fn unsubscribe(&mut self);

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Produces fresh feed instances, one per connection attempt.
pub type FeedFactory = Arc<dyn Fn() -> Box<dyn ChangeFeed> + Send + Sync>;
