//! Mock [`ChangeFeed`] implementations and factories.
//!
//! - [`ScriptedFeed`] - Pre-loaded subscribe result and signal queue. Goes
//!   quiet (never yields) once the queue is drained. Best for: backoff,
//!   staleness and retry exhaustion.
//!
//! - [`ChannelFeed`] - Channel-backed feed driven through a
//!   [`FeedControl`]. Best for: session tests that need on-demand delivery.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::port::{
    ChangeFeed, ChangeFilter, ChangeKind, FeedFactory, FeedSignal, RawChange, SubscriptionStatus,
};

/// Shared call counters across every feed a factory produced.
#[derive(Debug, Clone, Default)]
pub struct FeedCounters {
    connects: Arc<AtomicU32>,
    subscribes: Arc<AtomicU32>,
    unsubscribes: Arc<AtomicU32>,
}

impl FeedCounters {
    /// Feeds created by the factory (one per connection attempt).
    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn subscribes(&self) -> u32 {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn unsubscribes(&self) -> u32 {
        self.unsubscribes.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Signal builders
// ---------------------------------------------------------------------------

pub fn subscribed() -> FeedSignal {
    FeedSignal::Status(SubscriptionStatus::Subscribed)
}

pub fn channel_error() -> FeedSignal {
    FeedSignal::Status(SubscriptionStatus::ChannelError("simulated".into()))
}

pub fn insert(record: Value) -> FeedSignal {
    FeedSignal::Change(RawChange {
        kind: ChangeKind::Insert,
        new: Some(record),
        old: None,
    })
}

pub fn update(new: Value, old: Value) -> FeedSignal {
    FeedSignal::Change(RawChange {
        kind: ChangeKind::Update,
        new: Some(new),
        old: Some(old),
    })
}

pub fn delete(id: &str) -> FeedSignal {
    FeedSignal::Change(RawChange {
        kind: ChangeKind::Delete,
        new: None,
        old: Some(serde_json::json!({ "id": id })),
    })
}

// ---------------------------------------------------------------------------
// ScriptedFeed
// ---------------------------------------------------------------------------

/// A feed with a scripted subscribe result and a fixed signal queue.
///
/// A `None` entry in the queue ends the transport. An empty queue blocks
/// forever, like a live but silent connection.
pub struct ScriptedFeed {
    subscribe_result: Option<Result<()>>,
    signals: VecDeque<Option<FeedSignal>>,
    counters: FeedCounters,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self {
            subscribe_result: None,
            signals: VecDeque::new(),
            counters: FeedCounters::default(),
        }
    }

    /// Feed that confirms the subscription and then stays quiet.
    pub fn subscribed() -> Self {
        Self::new().with_signals(vec![subscribed()])
    }

    /// Feed whose channel fails right away.
    pub fn failing() -> Self {
        Self::new().with_signals(vec![channel_error()])
    }

    /// Feed whose subscribe call itself fails.
    pub fn unreachable() -> Self {
        Self::new().with_subscribe_result(Err(Error::Connection("unreachable".into())))
    }

    pub fn with_subscribe_result(mut self, result: Result<()>) -> Self {
        self.subscribe_result = Some(result);
        self
    }

    pub fn with_signals(mut self, signals: Vec<FeedSignal>) -> Self {
        self.signals = signals.into_iter().map(Some).collect();
        self
    }

    /// Append an end-of-transport marker.
    pub fn then_close(mut self) -> Self {
        self.signals.push_back(None);
        self
    }
}

impl Default for ScriptedFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeFeed for ScriptedFeed {
    async fn subscribe(&mut self, _filter: &ChangeFilter) -> Result<()> {
        self.counters.subscribes.fetch_add(1, Ordering::SeqCst);
        self.subscribe_result.take().unwrap_or(Ok(()))
    }

    async fn next_signal(&mut self) -> Option<FeedSignal> {
        match self.signals.pop_front() {
            Some(signal) => signal,
            None => std::future::pending().await,
        }
    }

    async fn unsubscribe(&mut self) {
        self.counters.unsubscribes.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Factory that builds the feed for attempt `n` (0-based) with `script(n)`.
pub fn scripted_factory<F>(script: F) -> (FeedFactory, FeedCounters)
where
    F: Fn(u32) -> ScriptedFeed + Send + Sync + 'static,
{
    let counters = FeedCounters::default();
    let shared = counters.clone();
    let factory: FeedFactory = Arc::new(move || {
        let attempt = shared.connects.fetch_add(1, Ordering::SeqCst);
        let mut feed = script(attempt);
        feed.counters = shared.clone();
        Box::new(feed) as Box<dyn ChangeFeed>
    });
    (factory, counters)
}

// ---------------------------------------------------------------------------
// ChannelFeed
// ---------------------------------------------------------------------------

/// A feed controlled externally via a [`FeedControl`].
///
/// When the factory was built with `auto_confirm`, each new feed starts
/// with a queued subscription confirmation.
pub struct ChannelFeed {
    rx: mpsc::UnboundedReceiver<Option<FeedSignal>>,
    counters: FeedCounters,
}

#[async_trait]
impl ChangeFeed for ChannelFeed {
    async fn subscribe(&mut self, _filter: &ChangeFilter) -> Result<()> {
        self.counters.subscribes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_signal(&mut self) -> Option<FeedSignal> {
        match self.rx.recv().await {
            Some(Some(signal)) => Some(signal),
            Some(None) | None => None,
        }
    }

    async fn unsubscribe(&mut self) {
        self.counters.unsubscribes.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Control handle for the feeds produced by [`channel_factory`].
///
/// Signals always go to the most recently created feed.
#[derive(Clone)]
pub struct FeedControl {
    current: Arc<Mutex<Option<mpsc::UnboundedSender<Option<FeedSignal>>>>>,
    counters: FeedCounters,
}

impl FeedControl {
    /// Deliver a signal to the current feed. Returns false if there is none.
    pub fn send(&self, signal: FeedSignal) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(Some(signal)).is_ok())
    }

    /// End the current feed's transport.
    pub fn close(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(None).is_ok())
    }

    pub fn counters(&self) -> &FeedCounters {
        &self.counters
    }
}

/// Factory of channel-backed feeds plus the control that drives them.
pub fn channel_factory(auto_confirm: bool) -> (FeedFactory, FeedControl) {
    let control = FeedControl {
        current: Arc::new(Mutex::new(None)),
        counters: FeedCounters::default(),
    };
    let shared = control.clone();
    let factory: FeedFactory = Arc::new(move || {
        shared.counters.connects.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        if auto_confirm {
            let _ = tx.send(Some(subscribed()));
        }
        *shared.current.lock() = Some(tx);
        Box::new(ChannelFeed {
            rx,
            counters: shared.counters.clone(),
        }) as Box<dyn ChangeFeed>
    });
    (factory, control)
}
