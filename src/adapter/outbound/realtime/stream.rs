//! Realtime change feed over a Phoenix channel websocket.
//!
//! # Connection Lifecycle
//!
//! 1. **Connect**: open the websocket in [`ChangeFeed::subscribe`]
//! 2. **Join**: send `phx_join` with the `postgres_changes` binding
//! 3. **Confirm**: the matching `phx_reply` yields `Subscribed`, or a
//!    `ChannelError` with the server's reason
//! 4. **Stream**: row changes, channel errors and keepalive replies are
//!    turned into [`FeedSignal`]s by [`ChangeFeed::next_signal`]
//! 5. **Leave**: `phx_leave` and a close frame on unsubscribe
//!
//! Keepalives are sent from inside `next_signal`; a keepalive still
//! unanswered at the next tick ends the subscription with `TimedOut`.
//! The feed never reconnects by itself.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{interval_at, sleep_until, timeout, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use super::message::{Inbound, PhoenixMessage};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{ChangeFeed, ChangeFilter, FeedFactory, FeedSignal, SubscriptionStatus};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long the server has to answer `phx_join`.
const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the close handshake during unsubscribe.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// One subscription to the realtime endpoint.
pub struct RealtimeFeed {
    url: Url,
    access_token: Option<String>,
    topic: String,
    heartbeat_period: Duration,
    join_timeout: Duration,
    ws: Option<WsStream>,
    next_ref: u64,
    join_ref: Option<String>,
    joined: bool,
    join_deadline: Option<Instant>,
    heartbeat: Option<Interval>,
    pending_heartbeat: Option<String>,
}

impl RealtimeFeed {
    /// Feed for `channel` on the websocket at `url`.
    #[must_use]
    pub fn new(url: Url, channel: &str, heartbeat_period: Duration) -> Self {
        Self {
            url,
            access_token: None,
            topic: PhoenixMessage::channel_topic(channel),
            heartbeat_period,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            ws: None,
            next_ref: 0,
            join_ref: None,
            joined: false,
            join_deadline: None,
            heartbeat: None,
            pending_heartbeat: None,
        }
    }

    /// Build from the backend and realtime sections of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL cannot be turned into a
    /// websocket URL.
    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config.backend.realtime_url()?;
        let feed = Self::new(url, &config.realtime.channel, config.realtime.heartbeat_interval());
        Ok(match &config.backend.api_key {
            Some(key) => feed.with_access_token(key.clone()),
            None => feed,
        })
    }

    /// Factory producing a fresh feed per connection attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not yield a valid URL.
    pub fn factory(config: &Config) -> Result<FeedFactory> {
        let template = Self::from_config(config)?;
        Ok(Arc::new(move || Box::new(template.fresh()) as Box<dyn ChangeFeed>))
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub const fn with_join_timeout(mut self, join_timeout: Duration) -> Self {
        self.join_timeout = join_timeout;
        self
    }

    /// Channel topic this feed joins.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Unconnected copy with the same settings.
    fn fresh(&self) -> Self {
        let feed = Self::new(self.url.clone(), "", self.heartbeat_period).with_join_timeout(self.join_timeout);
        Self {
            topic: self.topic.clone(),
            access_token: self.access_token.clone(),
            ..feed
        }
    }

    fn make_ref(&mut self) -> String {
        self.next_ref += 1;
        self.next_ref.to_string()
    }

    async fn send(ws: &mut WsStream, message: &PhoenixMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;
        ws.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Drop the transport and report `status` as the final signal.
    fn fail(&mut self, status: SubscriptionStatus) -> Option<FeedSignal> {
        self.ws = None;
        self.heartbeat = None;
        self.join_deadline = None;
        self.pending_heartbeat = None;
        self.joined = false;
        Some(FeedSignal::Status(status))
    }

    /// Turn one text frame into a signal, or `None` to keep reading.
    fn handle_text(&mut self, text: &str) -> Option<FeedSignal> {
        let message: PhoenixMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, bytes = text.len(), "Failed to parse realtime frame");
                return None;
            }
        };

        match message.classify(&self.topic) {
            Inbound::Reply { reference, outcome }
                if !self.joined && reference.is_some() && reference == self.join_ref =>
            {
                self.join_deadline = None;
                match outcome {
                    Ok(()) => {
                        self.joined = true;
                        info!(topic = %self.topic, "Realtime channel joined");
                        Some(FeedSignal::Status(SubscriptionStatus::Subscribed))
                    }
                    Err(reason) => {
                        warn!(topic = %self.topic, %reason, "Realtime join rejected");
                        self.fail(SubscriptionStatus::ChannelError(reason))
                    }
                }
            }
            Inbound::Reply { .. } | Inbound::Ignored => None,
            Inbound::Heartbeat { reference } => {
                if reference.is_some() && reference == self.pending_heartbeat {
                    self.pending_heartbeat = None;
                    Some(FeedSignal::Heartbeat)
                } else {
                    None
                }
            }
            Inbound::Change(change) => Some(FeedSignal::Change(change)),
            Inbound::ChannelError(reason) => self.fail(SubscriptionStatus::ChannelError(reason)),
            Inbound::Closed => self.fail(SubscriptionStatus::Closed),
            Inbound::Malformed(error) => {
                warn!(%error, "Malformed realtime payload");
                None
            }
        }
    }
}

#[async_trait]
impl ChangeFeed for RealtimeFeed {
    async fn subscribe(&mut self, filter: &ChangeFilter) -> Result<()> {
        info!(
            host = self.url.host_str().unwrap_or_default(),
            topic = %self.topic,
            table = %filter.table,
            "Connecting to realtime endpoint"
        );
        let (mut ws, response) = connect_async(self.url.as_str()).await?;
        debug!(status = %response.status(), "WebSocket connected");

        let reference = self.make_ref();
        let join = PhoenixMessage::join(&self.topic, filter, self.access_token.as_deref(), &reference);
        Self::send(&mut ws, &join).await?;

        let now = Instant::now();
        let mut heartbeat = interval_at(now + self.heartbeat_period, self.heartbeat_period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.ws = Some(ws);
        self.join_ref = Some(reference);
        self.joined = false;
        self.join_deadline = Some(now + self.join_timeout);
        self.heartbeat = Some(heartbeat);
        self.pending_heartbeat = None;
        Ok(())
    }

    async fn next_signal(&mut self) -> Option<FeedSignal> {
        loop {
            let ws = self.ws.as_mut()?;
            let join_deadline = self.join_deadline;

            tokio::select! {
                frame = ws.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        trace!(bytes = text.len(), "Received realtime frame");
                        if let Some(signal) = self.handle_text(&text) {
                            return Some(signal);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(frame = ?frame, "Realtime socket closed by server");
                        return self.fail(SubscriptionStatus::Closed);
                    }
                    // tungstenite answers pings on the next write.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Realtime socket error");
                        return self.fail(SubscriptionStatus::Closed);
                    }
                    None => return self.fail(SubscriptionStatus::Closed),
                },
                () = sleep_until_opt(join_deadline) => {
                    warn!(topic = %self.topic, "Realtime join timed out");
                    return self.fail(SubscriptionStatus::TimedOut);
                }
                () = tick_opt(&mut self.heartbeat) => {
                    if self.pending_heartbeat.is_some() {
                        warn!("Realtime heartbeat not acknowledged");
                        return self.fail(SubscriptionStatus::TimedOut);
                    }
                    let reference = self.make_ref();
                    let sent = match self.ws.as_mut() {
                        Some(ws) => Self::send(ws, &PhoenixMessage::heartbeat(&reference)).await,
                        None => return None,
                    };
                    if let Err(e) = sent {
                        warn!(error = %e, "Failed to send realtime heartbeat");
                        return self.fail(SubscriptionStatus::Closed);
                    }
                    trace!(reference = %reference, "Realtime heartbeat sent");
                    self.pending_heartbeat = Some(reference);
                }
            }
        }
    }

    async fn unsubscribe(&mut self) {
        if let Some(mut ws) = self.ws.take() {
            if self.joined {
                let reference = self.make_ref();
                let leave = PhoenixMessage::leave(&self.topic, &reference, self.join_ref.as_deref());
                if let Err(e) = Self::send(&mut ws, &leave).await {
                    debug!(error = %e, "Failed to send phx_leave");
                }
            }
            match timeout(CLOSE_TIMEOUT, ws.close(None)).await {
                Ok(Err(e)) => debug!(error = %e, "Realtime close handshake failed"),
                Err(_) => debug!("Realtime close handshake timed out"),
                Ok(Ok(())) => {}
            }
        }
        self.heartbeat = None;
        self.join_deadline = None;
        self.pending_heartbeat = None;
        self.joined = false;
    }

    fn name(&self) -> &'static str {
        "realtime"
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

async fn tick_opt(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}
