//! Change-stream client: one live subscription with automatic recovery.
//!
//! The client runs as a task that owns the current [`ChangeFeed`]. It
//! serializes every input (commands, feed signals, the retry timer and the
//! heartbeat monitor) through one `select!` loop, so handlers never race.
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//! Connecting | Connected -> Error -> Connecting (scheduled retry)
//! ```
//!
//! Consumers see the connection through a `watch` of [`ConnectionStatus`]
//! and receive normalized [`ChangeEvent`]s on the channel given at spawn.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::backoff::Backoff;
use super::normalize::normalize;
use crate::domain::{ChangeEvent, ConnectionState, ConnectionStatus};
use crate::infrastructure::config::realtime::ReconnectionConfig;
use crate::infrastructure::config::settings::Config;
use crate::port::{
    ChangeFeed, ChangeFilter, FeedFactory, FeedSignal, OrderNotifier, SubscriptionStatus,
};

/// Tunables of a [`ChangeStreamClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// What to subscribe to.
    pub filter: ChangeFilter,
    /// Staleness check period; silence longer than twice this is fatal.
    pub heartbeat_interval: Duration,
    pub reconnection: ReconnectionConfig,
    /// Connect on its own this long after spawning. `None` waits for
    /// an explicit `connect()`.
    pub initial_connect_delay: Option<Duration>,
}

impl ClientOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            filter: ChangeFilter::all(&config.backend.schema, &config.backend.table),
            heartbeat_interval: config.realtime.heartbeat_interval(),
            reconnection: config.reconnection.clone(),
            initial_connect_delay: Some(config.realtime.initial_connect_delay()),
        }
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            filter: ChangeFilter::all("public", "orders"),
            heartbeat_interval: Duration::from_secs(30),
            reconnection: ReconnectionConfig::default(),
            initial_connect_delay: None,
        }
    }
}

#[derive(Debug)]
enum Command {
    Connect,
    Disconnect,
    ManualReconnect,
    NetworkOnline,
    NetworkOffline,
    VisibilityRegained,
    Shutdown,
}

/// Cloneable handle to a running [`ChangeStreamClient`].
///
/// Every method is fire-and-forget; after the client stopped they do
/// nothing.
#[derive(Debug, Clone)]
pub struct ChangeStreamHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
}

impl ChangeStreamHandle {
    /// Open the subscription unless one is already connecting or live.
    pub fn connect(&self) {
        self.send(Command::Connect);
    }

    /// Tear down the subscription and cancel pending retries.
    pub fn disconnect(&self) {
        self.send(Command::Disconnect);
    }

    /// Reset the retry budget and connect right away.
    pub fn manual_reconnect(&self) {
        self.send(Command::ManualReconnect);
    }

    pub fn network_online(&self) {
        self.send(Command::NetworkOnline);
    }

    pub fn network_offline(&self) {
        self.send(Command::NetworkOffline);
    }

    pub fn visibility_regained(&self) {
        self.send(Command::VisibilityRegained);
    }

    /// Stop the client for good.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// Current connection snapshot.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// Receiver that observes every status change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Whether the client task has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Change stream client already stopped");
        }
    }
}

/// Actor owning the live subscription.
pub struct ChangeStreamClient {
    factory: FeedFactory,
    options: ClientOptions,
    notifier: Arc<dyn OrderNotifier>,
    events: mpsc::Sender<ChangeEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ConnectionStatus>,
    feed: Option<Box<dyn ChangeFeed>>,
    backoff: Backoff,
    retry_at: Option<Instant>,
    heartbeat: Option<Interval>,
    last_activity: Instant,
    online: bool,
}

impl ChangeStreamClient {
    /// Spawn the client task.
    ///
    /// Normalized events are sent on `events`; the task stops when that
    /// channel closes, on `shutdown()`, or when every handle is dropped.
    pub fn spawn(
        factory: FeedFactory,
        options: ClientOptions,
        notifier: Arc<dyn OrderNotifier>,
        events: mpsc::Sender<ChangeEvent>,
    ) -> (ChangeStreamHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());
        let now = Instant::now();

        let client = Self {
            factory,
            backoff: Backoff::new(options.reconnection.clone()),
            retry_at: options.initial_connect_delay.map(|delay| now + delay),
            options,
            notifier,
            events,
            commands: command_rx,
            status: status_tx,
            feed: None,
            heartbeat: None,
            last_activity: now,
            online: true,
        };
        let task = tokio::spawn(client.run());

        (
            ChangeStreamHandle {
                commands: command_tx,
                status: status_rx,
            },
            task,
        )
    }

    async fn run(mut self) {
        debug!(table = %self.options.filter.table, "Change stream client started");

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle_command(command).await {
                        break;
                    }
                }
                () = self.events.closed() => {
                    info!("Event consumer dropped, stopping change stream client");
                    break;
                }
                signal = next_signal(&mut self.feed) => {
                    if !self.handle_signal(signal).await {
                        break;
                    }
                }
                () = sleep_until_opt(self.retry_at) => {
                    self.retry_at = None;
                    self.connect().await;
                }
                () = tick_opt(&mut self.heartbeat) => self.check_heartbeat().await,
            }
        }

        self.retry_at = None;
        self.teardown().await;
        self.set_state(ConnectionState::Disconnected);
        info!("Change stream client stopped");
    }

    /// Returns false when the client should stop.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Connect => self.connect().await,
            Command::Disconnect => {
                info!("Disconnect requested");
                self.disconnect().await;
            }
            Command::ManualReconnect => self.manual_reconnect().await,
            Command::NetworkOnline => {
                info!("Network online");
                self.online = true;
                self.connect().await;
            }
            Command::NetworkOffline => {
                warn!("Network offline, suspending change stream");
                self.online = false;
                self.disconnect().await;
            }
            Command::VisibilityRegained => {
                let state = self.state();
                if self.online && state != ConnectionState::Connected {
                    debug!(%state, "Visible again, reconnecting");
                    self.connect().await;
                }
            }
            Command::Shutdown => return false,
        }
        true
    }

    /// Returns false when the event consumer is gone.
    async fn handle_signal(&mut self, signal: Option<FeedSignal>) -> bool {
        match signal {
            None => self.fail("transport closed").await,
            Some(FeedSignal::Status(SubscriptionStatus::Subscribed)) => self.on_subscribed(),
            Some(FeedSignal::Status(status)) => self.fail(&status.to_string()).await,
            Some(FeedSignal::Heartbeat) => self.touch(false),
            Some(FeedSignal::Change(raw)) => {
                self.touch(true);
                match normalize(raw) {
                    Ok(event) => {
                        debug!(kind = event.kind(), order_id = %event.order_id(), "Change received");
                        if self.events.send(event).await.is_err() {
                            info!("Event consumer dropped, stopping change stream client");
                            return false;
                        }
                    }
                    Err(e) => warn!(error = %e, "Dropping malformed change"),
                }
            }
        }
        true
    }

    async fn connect(&mut self) {
        let state = self.state();
        if state.is_active() {
            debug!(%state, "Connect ignored, subscription already active");
            return;
        }

        self.retry_at = None;
        self.teardown().await;
        self.set_state(ConnectionState::Connecting);

        let mut feed = (self.factory)();
        info!(
            feed = feed.name(),
            table = %self.options.filter.table,
            attempt = self.backoff.attempts(),
            "Subscribing to change feed"
        );
        match feed.subscribe(&self.options.filter).await {
            Ok(()) => self.feed = Some(feed),
            Err(e) => {
                feed.unsubscribe().await;
                self.fail(&e.to_string()).await;
            }
        }
    }

    async fn disconnect(&mut self) {
        self.retry_at = None;
        self.teardown().await;
        self.set_state(ConnectionState::Disconnected);
    }

    async fn manual_reconnect(&mut self) {
        info!("Manual reconnect requested");
        self.backoff.reset();
        self.retry_at = None;
        self.status.send_modify(|status| {
            status.reconnect_attempts = 0;
            status.retries_exhausted = false;
        });
        self.connect().await;
    }

    fn on_subscribed(&mut self) {
        let now = Instant::now();
        self.last_activity = now;
        if self.state() == ConnectionState::Connected {
            debug!("Duplicate subscription confirmation");
            return;
        }

        self.backoff.reset();
        self.status.send_modify(|status| {
            status.state = ConnectionState::Connected;
            status.reconnect_attempts = 0;
            status.retries_exhausted = false;
            status.last_heartbeat = Some(Utc::now());
        });

        let period = self.options.heartbeat_interval;
        let mut heartbeat = interval_at(now + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.heartbeat = Some(heartbeat);

        info!(table = %self.options.filter.table, "Change feed connected");
    }

    /// Record activity. Any signal counts as a heartbeat.
    fn touch(&mut self, is_change: bool) {
        self.last_activity = Instant::now();
        let now = Utc::now();
        self.status.send_modify(|status| {
            status.last_heartbeat = Some(now);
            if is_change {
                status.last_change = Some(now);
            }
        });
    }

    async fn check_heartbeat(&mut self) {
        let silent = self.last_activity.elapsed();
        if silent > self.options.heartbeat_interval * 2 {
            warn!(silent_secs = silent.as_secs(), "No activity, connection appears dead");
            self.fail("heartbeat timeout").await;
        } else {
            debug!(silent_secs = silent.as_secs(), "Heartbeat check passed");
        }
    }

    async fn fail(&mut self, reason: &str) {
        warn!(reason, "Change feed connection failed");
        self.teardown().await;
        self.set_state(ConnectionState::Error);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        if !self.online {
            info!("Offline, waiting for network before reconnecting");
            return;
        }

        match self.backoff.next_delay() {
            Some(delay) => {
                let attempt = self.backoff.attempts();
                self.retry_at = Some(Instant::now() + delay);
                self.status
                    .send_modify(|status| status.reconnect_attempts = attempt);
                info!(
                    attempt,
                    max_attempts = self.backoff.max_attempts(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Reconnect scheduled"
                );
            }
            None => {
                if self.status.borrow().retries_exhausted {
                    return;
                }
                let attempts = self.backoff.attempts();
                self.status
                    .send_modify(|status| status.retries_exhausted = true);
                error!(attempts, "Reconnect attempts exhausted, waiting for manual reconnect");
                self.notifier.connection_exhausted(attempts);
            }
        }
    }

    /// Drop the current subscription and stop the heartbeat monitor.
    async fn teardown(&mut self) {
        self.heartbeat = None;
        if let Some(mut feed) = self.feed.take() {
            debug!(feed = feed.name(), "Tearing down subscription");
            feed.unsubscribe().await;
        }
    }

    fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    fn set_state(&self, state: ConnectionState) {
        let changed = self.status.send_if_modified(|status| {
            if status.state == state {
                return false;
            }
            status.state = state;
            true
        });
        if changed {
            debug!(%state, "Connection state changed");
        }
    }
}

async fn next_signal(feed: &mut Option<Box<dyn ChangeFeed>>) -> Option<FeedSignal> {
    match feed {
        Some(feed) => feed.next_signal().await,
        None => pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

async fn tick_opt(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(heartbeat) => {
            heartbeat.tick().await;
        }
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::domain::OrderStatus;
    use crate::testkit::domain::order_json;
    use crate::testkit::feed::{
        channel_factory, delete, insert, scripted_factory, subscribed, update, ScriptedFeed,
    };
    use crate::testkit::notifier::RecordingNotifier;

    struct Harness {
        handle: ChangeStreamHandle,
        events: mpsc::Receiver<ChangeEvent>,
        notifier: RecordingNotifier,
        task: JoinHandle<()>,
    }

    fn spawn_with(factory: FeedFactory, options: ClientOptions) -> Harness {
        let (tx, rx) = mpsc::channel(16);
        let notifier = RecordingNotifier::new();
        let (handle, task) =
            ChangeStreamClient::spawn(factory, options, Arc::new(notifier.clone()), tx);
        Harness {
            handle,
            events: rx,
            notifier,
            task,
        }
    }

    fn spawn(factory: FeedFactory) -> Harness {
        spawn_with(factory, ClientOptions::default())
    }

    async fn wait_for(
        handle: &ChangeStreamHandle,
        predicate: impl FnMut(&ConnectionStatus) -> bool,
    ) -> ConnectionStatus {
        let mut rx = handle.watch();
        let status = timeout(Duration::from_secs(3600), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for status")
            .expect("client stopped")
            .clone();
        status
    }

    async fn wait_for_state(handle: &ChangeStreamHandle, state: ConnectionState) -> ConnectionStatus {
        wait_for(handle, |status| status.state == state).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_forwards_events_in_arrival_order() {
        let (factory, _) = scripted_factory(|_| {
            ScriptedFeed::new().with_signals(vec![
                subscribed(),
                insert(order_json("a1", "pending")),
                update(order_json("a1", "completed"), serde_json::json!({ "id": "a1" })),
                delete("a1"),
            ])
        });
        let mut h = spawn(factory);
        h.handle.connect();

        assert!(matches!(h.events.recv().await, Some(ChangeEvent::Insert(_))));
        match h.events.recv().await {
            Some(ChangeEvent::Update { new, .. }) => assert_eq!(new.status, OrderStatus::Completed),
            other => panic!("expected update, got {other:?}"),
        }
        assert!(matches!(h.events.recv().await, Some(ChangeEvent::Delete { .. })));

        let status = h.handle.status();
        assert_eq!(status.state, ConnectionState::Connected);
        assert_eq!(status.reconnect_attempts, 0);
        assert!(status.last_change.is_some());
        assert!(status.last_heartbeat.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_change_is_skipped() {
        let (factory, _) = scripted_factory(|_| {
            ScriptedFeed::new().with_signals(vec![
                subscribed(),
                insert(serde_json::json!({ "id": "bad" })),
                insert(order_json("a2", "pending")),
            ])
        });
        let mut h = spawn(factory);
        h.handle.connect();

        let event = h.events.recv().await.unwrap();
        assert_eq!(event.order_id().as_str(), "a2");
        assert_eq!(h.handle.status().state, ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_is_idempotent() {
        let (factory, control) = channel_factory(true);
        let h = spawn(factory);

        h.handle.connect();
        h.handle.connect();
        wait_for_state(&h.handle, ConnectionState::Connected).await;
        h.handle.connect();
        sleep(Duration::from_secs(1)).await;

        assert_eq!(control.counters().connects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_is_safe_to_repeat() {
        let (factory, control) = channel_factory(true);
        let h = spawn(factory);

        h.handle.disconnect();
        h.handle.connect();
        wait_for_state(&h.handle, ConnectionState::Connected).await;

        h.handle.disconnect();
        h.handle.disconnect();
        wait_for_state(&h.handle, ConnectionState::Disconnected).await;
        sleep(Duration::from_secs(300)).await;

        assert_eq!(control.counters().connects(), 1);
        assert_eq!(control.counters().unsubscribes(), 1);
        assert_eq!(h.handle.status().state, ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ten_channel_errors_exhaust_automatic_retries() {
        let attempts_at = Arc::new(Mutex::new(Vec::new()));
        let recorded = attempts_at.clone();
        let (factory, counters) = scripted_factory(move |_| {
            recorded.lock().push(Instant::now());
            ScriptedFeed::failing()
        });
        let h = spawn(factory);
        h.handle.connect();

        let status = wait_for(&h.handle, |status| status.retries_exhausted).await;
        assert_eq!(status.state, ConnectionState::Error);
        assert_eq!(status.reconnect_attempts, 10);
        // One initial attempt plus ten automatic retries.
        assert_eq!(counters.connects(), 11);

        let delays: Vec<u64> = attempts_at
            .lock()
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_secs())
            .collect();
        assert_eq!(delays, vec![3, 6, 12, 24, 30, 30, 30, 30, 30, 30]);

        sleep(Duration::from_secs(3600)).await;
        assert_eq!(counters.connects(), 11);
        assert_eq!(h.handle.status().state, ConnectionState::Error);
        assert_eq!(h.notifier.exhausted_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_reconnect_from_exhaustion_connects_immediately() {
        let (factory, counters) = scripted_factory(|attempt| {
            if attempt < 11 {
                ScriptedFeed::failing()
            } else {
                ScriptedFeed::subscribed()
            }
        });
        let h = spawn(factory);
        h.handle.connect();
        wait_for(&h.handle, |status| status.retries_exhausted).await;

        let requested_at = Instant::now();
        h.handle.manual_reconnect();
        let status = wait_for_state(&h.handle, ConnectionState::Connected).await;

        assert_eq!(Instant::now(), requested_at);
        assert_eq!(status.reconnect_attempts, 0);
        assert!(!status.retries_exhausted);
        assert_eq!(counters.connects(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_error_schedules_retry() {
        let (factory, counters) = scripted_factory(|attempt| {
            if attempt == 0 {
                ScriptedFeed::unreachable()
            } else {
                ScriptedFeed::subscribed()
            }
        });
        let h = spawn(factory);
        h.handle.connect();

        let failed = wait_for(&h.handle, |status| {
            status.state == ConnectionState::Error && status.reconnect_attempts == 1
        })
        .await;
        assert!(!failed.retries_exhausted);

        let started = Instant::now();
        let status = wait_for_state(&h.handle, ConnectionState::Connected).await;
        assert_eq!(Instant::now() - started, Duration::from_secs(3));
        assert_eq!(status.reconnect_attempts, 0);
        assert_eq!(counters.connects(), 2);
        assert_eq!(counters.unsubscribes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_close_triggers_reconnect() {
        let (factory, control) = channel_factory(true);
        let h = spawn(factory);
        h.handle.connect();
        wait_for_state(&h.handle, ConnectionState::Connected).await;

        assert!(control.close());
        wait_for_state(&h.handle, ConnectionState::Error).await;
        wait_for_state(&h.handle, ConnectionState::Connected).await;

        assert_eq!(control.counters().connects(), 2);
        assert_eq!(h.handle.status().reconnect_attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_connection_reconnects_exactly_once() {
        let (factory, counters) = scripted_factory(|_| ScriptedFeed::subscribed());
        let h = spawn(factory);
        h.handle.connect();
        wait_for_state(&h.handle, ConnectionState::Connected).await;

        // Checks at 30 s and 60 s pass; the 90 s check finds 90 s of silence.
        sleep(Duration::from_secs(89)).await;
        assert_eq!(counters.connects(), 1);

        sleep(Duration::from_secs(61)).await;
        assert_eq!(counters.connects(), 2);
        assert_eq!(counters.unsubscribes(), 1);
        assert_eq!(h.handle.status().state, ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeats_keep_connection_alive() {
        let (factory, control) = channel_factory(true);
        let h = spawn(factory);
        h.handle.connect();
        wait_for_state(&h.handle, ConnectionState::Connected).await;

        for _ in 0..10 {
            sleep(Duration::from_secs(20)).await;
            assert!(control.send(FeedSignal::Heartbeat));
        }

        assert_eq!(control.counters().connects(), 1);
        assert_eq!(h.handle.status().state, ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_suppresses_retries_until_online() {
        let (factory, control) = channel_factory(true);
        let h = spawn(factory);
        h.handle.connect();
        wait_for_state(&h.handle, ConnectionState::Connected).await;

        h.handle.network_offline();
        wait_for_state(&h.handle, ConnectionState::Disconnected).await;
        h.handle.visibility_regained();
        sleep(Duration::from_secs(600)).await;
        assert_eq!(control.counters().connects(), 1);

        h.handle.network_online();
        wait_for_state(&h.handle, ConnectionState::Connected).await;
        assert_eq!(control.counters().connects(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_regained_reconnects_without_waiting() {
        let (factory, counters) = scripted_factory(|attempt| {
            if attempt == 0 {
                ScriptedFeed::failing()
            } else {
                ScriptedFeed::subscribed()
            }
        });
        let h = spawn(factory);
        h.handle.connect();
        wait_for_state(&h.handle, ConnectionState::Error).await;

        let requested_at = Instant::now();
        h.handle.visibility_regained();
        wait_for_state(&h.handle, ConnectionState::Connected).await;
        assert_eq!(Instant::now(), requested_at);

        h.handle.visibility_regained();
        sleep(Duration::from_secs(10)).await;
        assert_eq!(counters.connects(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_connect_delay() {
        let (factory, counters) = scripted_factory(|_| ScriptedFeed::subscribed());
        let options = ClientOptions {
            initial_connect_delay: Some(Duration::from_millis(100)),
            ..ClientOptions::default()
        };
        let h = spawn_with(factory, options);

        let started = Instant::now();
        wait_for_state(&h.handle, ConnectionState::Connected).await;
        assert_eq!(Instant::now() - started, Duration::from_millis(100));
        assert_eq!(counters.connects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task_and_ignores_later_commands() {
        let (factory, control) = channel_factory(true);
        let h = spawn(factory);
        h.handle.connect();
        wait_for_state(&h.handle, ConnectionState::Connected).await;

        h.handle.shutdown();
        h.task.await.unwrap();

        assert!(h.handle.is_closed());
        assert_eq!(h.handle.status().state, ConnectionState::Disconnected);
        assert_eq!(control.counters().unsubscribes(), 1);

        h.handle.connect();
        h.handle.manual_reconnect();
        assert_eq!(control.counters().connects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_consumer_stops_client() {
        let (factory, control) = channel_factory(true);
        let h = spawn(factory);
        h.handle.connect();
        wait_for_state(&h.handle, ConnectionState::Connected).await;

        drop(h.events);
        h.task.await.unwrap();

        assert_eq!(control.counters().unsubscribes(), 1);
        assert!(h.handle.is_closed());
        assert!(!control.send(FeedSignal::Heartbeat));
    }

    #[test]
    fn test_options_follow_config() {
        let mut config = crate::testkit::config::config();
        config.backend.table = "shop_orders".into();
        config.realtime.heartbeat_interval_ms = 10_000;

        let options = ClientOptions::from_config(&config);

        assert_eq!(options.filter.table, "shop_orders");
        assert_eq!(options.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(options.initial_connect_delay, Some(Duration::from_millis(100)));
        assert_eq!(options.reconnection.max_attempts, 10);
    }
}
